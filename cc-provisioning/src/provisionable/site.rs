//! Sites of the network.

use super::{person_for_user, project_all, to_date, Provisionable, SearchIdSlot};
use crate::errors::ProvisionError;
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{EntityRef, Site};
use cc_search_shared::{ContentType, SearchDocument};

pub struct ProvisionableSite {
    site: Site,
    runtime: NativeRuntime,
    slot: SearchIdSlot,
}

impl ProvisionableSite {
    pub fn new(site: Site, runtime: NativeRuntime) -> Self {
        let slot = SearchIdSlot::new(site.handle(), runtime.store.clone());
        Self {
            site,
            runtime,
            slot,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Positive visibility codes are publicly visible.
    pub fn is_visible(visibility: i32) -> bool {
        visibility > 0
    }

    pub fn get_all(runtime: &NativeRuntime, reset: bool) -> Result<Vec<Self>, ProvisionError> {
        let mut provisionables = Vec::new();
        for site in runtime.source.sites()? {
            let mut provisionable = ProvisionableSite::new(site, runtime.clone());
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

impl Provisionable for ProvisionableSite {
    fn entity(&self) -> EntityRef {
        self.site.handle()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Site
    }

    fn search_id(&mut self) -> Result<String, ProvisionError> {
        self.slot.get()
    }

    fn set_search_id(&mut self, search_id: &str) -> Result<(), ProvisionError> {
        self.slot.set(search_id)
    }

    fn to_document(&self) -> Result<SearchDocument, ProvisionError> {
        let network_node = self.runtime.network_node();
        let owner = match self.site.admin_id {
            Some(admin_id) => self
                .runtime
                .source
                .user(admin_id)?
                .map(|user| person_for_user(&user, "admin", &network_node)),
            None => None,
        };

        let mut document =
            SearchDocument::new(self.site.id.to_string(), ContentType::Site, self.site.name.as_str());
        document.description = self.site.description.clone();
        document.owner = owner;
        document.primary_url = self.site.home_url();
        document.publication_date = to_date(self.site.registered_at);
        document.modified_date = to_date(self.site.updated_at);
        document.network_node = network_node;
        self.slot.stamp(&mut document);
        Ok(document)
    }

    /// Visible and not spammed, deleted or archived.
    fn is_eligible(&self) -> Result<bool, ProvisionError> {
        let site = &self.site;
        Ok(Self::is_visible(site.visibility) && !site.spam && !site.deleted && !site.archived)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_eligibility() {
        let network = fixtures::network();
        let runtime = fixtures::runtime(&network);
        let eligible = |site: Site| ProvisionableSite::new(site, runtime.clone()).is_eligible().unwrap();

        assert!(eligible(fixtures::site(3)));
        assert!(!eligible(Site { visibility: 0, ..fixtures::site(3) }));
        assert!(!eligible(Site { visibility: -2, ..fixtures::site(3) }));
        assert!(!eligible(Site { spam: true, ..fixtures::site(3) }));
        assert!(!eligible(Site { archived: true, ..fixtures::site(3) }));
    }

    #[test]
    fn test_document_uses_home_url_and_admin() {
        let network = fixtures::network();
        network.upsert_user(fixtures::user(8)).unwrap();
        let site = Site {
            admin_id: Some(8),
            ..fixtures::site(2)
        };

        let document = ProvisionableSite::new(site, fixtures::runtime(&network))
            .to_document()
            .unwrap();

        assert_eq!(document.primary_url, "https://site2.example.org/");
        assert_eq!(document.title, "Site 2");
        assert_eq!(document.owner.unwrap().username, "user8");
        assert_eq!(document.publication_date.unwrap().to_string(), "2023-05-01");
    }

    #[test]
    fn test_get_all_skips_hidden_sites() {
        let network = fixtures::network();
        network
            .upsert_site(Site {
                visibility: -1,
                ..fixtures::site(3)
            })
            .unwrap();

        let all = ProvisionableSite::get_all(&fixtures::runtime(&network), true).unwrap();
        let ids: Vec<u64> = all.iter().map(|s| s.site().id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
