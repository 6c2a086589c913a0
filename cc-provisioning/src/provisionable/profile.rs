//! Member profiles.

use super::{person_for_user, project_all, to_date, Provisionable, SearchIdSlot};
use crate::errors::ProvisionError;
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{EntityRef, User};
use cc_search_shared::{ContentType, SearchDocument};

pub struct ProvisionableProfile {
    user: User,
    runtime: NativeRuntime,
    slot: SearchIdSlot,
}

impl ProvisionableProfile {
    pub fn new(user: User, runtime: NativeRuntime) -> Self {
        let slot = SearchIdSlot::new(user.handle(), runtime.store.clone());
        Self {
            user,
            runtime,
            slot,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Every user not flagged as spam.
    pub fn get_all(runtime: &NativeRuntime, reset: bool) -> Result<Vec<Self>, ProvisionError> {
        let mut provisionables = Vec::new();
        for user in runtime.source.users()? {
            let mut provisionable = ProvisionableProfile::new(user, runtime.clone());
            if reset {
                provisionable.set_search_id("")?;
            } else {
                provisionable.search_id()?;
            }
            if provisionable.is_eligible()? {
                provisionables.push(provisionable);
            }
        }
        Ok(provisionables)
    }

    pub fn get_all_as_documents(
        runtime: &NativeRuntime,
        reset: bool,
    ) -> Result<Vec<SearchDocument>, ProvisionError> {
        project_all(&Self::get_all(runtime, reset)?)
    }
}

impl Provisionable for ProvisionableProfile {
    fn entity(&self) -> EntityRef {
        self.user.handle()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Profile
    }

    fn search_id(&mut self) -> Result<String, ProvisionError> {
        self.slot.get()
    }

    fn set_search_id(&mut self, search_id: &str) -> Result<(), ProvisionError> {
        self.slot.set(search_id)
    }

    fn to_document(&self) -> Result<SearchDocument, ProvisionError> {
        let network_node = self.runtime.network_node();
        let person = person_for_user(&self.user, "member", &network_node);

        let mut document =
            SearchDocument::new(self.user.id.to_string(), ContentType::Profile, person.name.as_str());
        document.description = self.user.bio.clone();
        document.primary_url = self.user.profile_url.clone();
        document.publication_date = to_date(self.user.registered_at);
        document.owner = Some(person);
        document.network_node = network_node;
        self.slot.stamp(&mut document);
        Ok(document)
    }

    fn is_eligible(&self) -> Result<bool, ProvisionError> {
        Ok(!self.user.spam)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_spam_users_are_excluded() {
        let network = fixtures::network();
        let mut spammer = fixtures::user(2);
        spammer.spam = true;
        network.upsert_user(fixtures::user(1)).unwrap();
        network.upsert_user(spammer).unwrap();

        let documents =
            ProvisionableProfile::get_all_as_documents(&fixtures::runtime(&network), true).unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].internal_id, "1");
        assert_eq!(documents[0].title, "User 1");
        assert_eq!(documents[0].content_type, "profile");
    }

    #[test]
    fn test_title_falls_back_to_login() {
        let network = fixtures::network();
        let mut user = fixtures::user(3);
        user.display_name.clear();

        let document = ProvisionableProfile::new(user, fixtures::runtime(&network))
            .to_document()
            .unwrap();
        assert_eq!(document.title, "user3");
    }
}
