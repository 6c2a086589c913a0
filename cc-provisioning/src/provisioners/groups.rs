//! BuddyPress groups.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{reconcile, remove, EnabledFlag, IncrementalProvisioner, IndexMode, ProvisionOutcome};
use crate::errors::ProvisionError;
use crate::events::{EventKind, LifecycleEvent, LifecycleSubscriber};
use crate::provisionable::{Provisionable, ProvisionableGroup};
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{Group, GroupId};
use cc_search_repository::SearchIndexClient;

const SUBSCRIPTIONS: &[EventKind] = &[EventKind::GroupSaved, EventKind::GroupDeleting];

pub struct GroupsProvisioner {
    client: Arc<SearchIndexClient>,
    runtime: NativeRuntime,
    enabled: EnabledFlag,
}

impl GroupsProvisioner {
    pub fn new(client: Arc<SearchIndexClient>, runtime: NativeRuntime) -> Self {
        Self {
            client,
            runtime,
            enabled: EnabledFlag::new(true),
        }
    }

    #[instrument(skip(self, group), fields(group_id = group.id, status = ?group.status))]
    pub async fn provision_new_or_updated_group(
        &self,
        group: &Group,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        info!(name = %group.name, "Group provisioning");

        let mut provisionable = ProvisionableGroup::new(group.clone(), self.runtime.clone());
        let eligible = provisionable.is_eligible()?;
        reconcile(&self.client, &mut provisionable, eligible, IndexMode::IndexOrUpdate).await
    }

    /// Handle a group about to be deleted. The group is looked up first; an
    /// unknown group is skipped.
    #[instrument(skip(self))]
    pub async fn provision_deleted_group(
        &self,
        group_id: GroupId,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let groups = self
            .runtime
            .source
            .groups()
            .ok_or_else(ProvisionError::groups_inactive)?;
        let Some(group) = groups.group(group_id)? else {
            warn!("Deleted group not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };

        let mut provisionable = ProvisionableGroup::new(group, self.runtime.clone());
        remove(&self.client, &mut provisionable).await
    }
}

impl IncrementalProvisioner for GroupsProvisioner {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn enable(&self) {
        self.enabled.set(true);
    }

    fn disable(&self) {
        self.enabled.set(false);
    }
}

#[async_trait]
impl LifecycleSubscriber for GroupsProvisioner {
    fn name(&self) -> &str {
        "groups"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<(), ProvisionError> {
        match event {
            LifecycleEvent::GroupSaved { group } => {
                self.provision_new_or_updated_group(group).await?;
            }
            LifecycleEvent::GroupDeleting { group_id } => {
                self.provision_deleted_group(*group_id).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
