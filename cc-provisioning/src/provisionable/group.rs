//! BuddyPress groups.

use tracing::debug;

use super::{person_for_user, project_all, Provisionable, SearchIdSlot};
use crate::errors::ProvisionError;
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{EntityRef, Group, GroupRole, GroupStatus};
use cc_search_repository::GroupSource;
use cc_search_shared::{ContentType, SearchDocument};

pub struct ProvisionableGroup {
    group: Group,
    runtime: NativeRuntime,
    slot: SearchIdSlot,
}

impl ProvisionableGroup {
    pub fn new(group: Group, runtime: NativeRuntime) -> Self {
        let slot = SearchIdSlot::new(group.handle(), runtime.store.clone());
        Self {
            group,
            runtime,
            slot,
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    fn groups(&self) -> Result<&dyn GroupSource, ProvisionError> {
        self.runtime
            .source
            .groups()
            .ok_or_else(ProvisionError::groups_inactive)
    }

    /// Network node of the group: its group type when group types are
    /// registered, the installation's node otherwise.
    fn network_node(&self, groups: &dyn GroupSource) -> Result<String, ProvisionError> {
        if groups.group_types_enabled() {
            if let Some(group_type) = groups.group_type(self.group.id)? {
                return Ok(group_type);
            }
        }
        Ok(self.runtime.network_node())
    }

    /// Public groups of the installation.
    pub fn get_all(runtime: &NativeRuntime, reset: bool) -> Result<Vec<Self>, ProvisionError> {
        let groups = runtime
            .source
            .groups()
            .ok_or_else(ProvisionError::groups_inactive)?
            .all_groups()?;

        let mut provisionables = Vec::with_capacity(groups.len());
        for group in groups {
            let mut provisionable = ProvisionableGroup::new(group, runtime.clone());
            if reset {
                provisionable.set_search_id("")?;
            } else {
                provisionable.search_id()?;
            }
            if provisionable.is_eligible()? {
                provisionables.push(provisionable);
            }
        }

        debug!(count = provisionables.len(), "Enumerated groups");
        Ok(provisionables)
    }

    pub fn get_all_as_documents(
        runtime: &NativeRuntime,
        reset: bool,
    ) -> Result<Vec<SearchDocument>, ProvisionError> {
        project_all(&Self::get_all(runtime, reset)?)
    }
}

impl Provisionable for ProvisionableGroup {
    fn entity(&self) -> EntityRef {
        self.group.handle()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Group
    }

    fn search_id(&mut self) -> Result<String, ProvisionError> {
        self.slot.get()
    }

    fn set_search_id(&mut self, search_id: &str) -> Result<(), ProvisionError> {
        self.slot.set(search_id)
    }

    fn to_document(&self) -> Result<SearchDocument, ProvisionError> {
        let groups = self.groups()?;
        let network_node = self.network_node(groups)?;

        // First admin returned wins.
        let admin_id = groups
            .members_with_role(self.group.id, GroupRole::Admin)?
            .into_iter()
            .next();
        let owner = match admin_id {
            Some(user_id) => self
                .runtime
                .source
                .user(user_id)?
                .map(|user| person_for_user(&user, "admin", &network_node)),
            None => None,
        };

        let mut document = SearchDocument::new(
            self.group.id.to_string(),
            ContentType::Group,
            self.group.name.as_str(),
        );
        document.description = self.group.description.clone();
        document.owner = owner;
        document.primary_url = self.group.permalink.clone();
        document.network_node = network_node;
        self.slot.stamp(&mut document);
        Ok(document)
    }

    fn is_eligible(&self) -> Result<bool, ProvisionError> {
        Ok(self.group.status == GroupStatus::Public)
    }
}
