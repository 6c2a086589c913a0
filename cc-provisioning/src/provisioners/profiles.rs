//! Member profiles.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{reconcile, remove, EnabledFlag, IncrementalProvisioner, IndexMode, ProvisionOutcome};
use crate::errors::ProvisionError;
use crate::events::{EventKind, LifecycleEvent, LifecycleSubscriber, UserEventOrigin};
use crate::provisionable::{Provisionable, ProvisionableProfile};
use crate::runtime::NativeRuntime;
use cc_search_repository::types::UserId;
use cc_search_repository::SearchIndexClient;

const SUBSCRIPTIONS: &[EventKind] = &[EventKind::UserSaved, EventKind::UserDeleting];

pub struct ProfilesProvisioner {
    client: Arc<SearchIndexClient>,
    runtime: NativeRuntime,
    enabled: EnabledFlag,
}

impl ProfilesProvisioner {
    pub fn new(client: Arc<SearchIndexClient>, runtime: NativeRuntime) -> Self {
        Self {
            client,
            runtime,
            enabled: EnabledFlag::new(true),
        }
    }

    #[instrument(skip(self))]
    pub async fn provision_new_or_updated_user(
        &self,
        user_id: UserId,
        origin: UserEventOrigin,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let Some(user) = self.runtime.source.user(user_id)? else {
            warn!("User not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };
        info!(login = %user.login, spam = user.spam, "Profile provisioning");

        let mut provisionable = ProvisionableProfile::new(user, self.runtime.clone());
        let eligible = provisionable.is_eligible()?;
        reconcile(&self.client, &mut provisionable, eligible, IndexMode::IndexOrUpdate).await
    }

    #[instrument(skip(self))]
    pub async fn provision_deleted_user(
        &self,
        user_id: UserId,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let Some(user) = self.runtime.source.user(user_id)? else {
            warn!("Deleted user not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };

        let mut provisionable = ProvisionableProfile::new(user, self.runtime.clone());
        remove(&self.client, &mut provisionable).await
    }
}

impl IncrementalProvisioner for ProfilesProvisioner {
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
impl LifecycleSubscriber for ProfilesProvisioner {
    fn name(&self) -> &str {
        "profiles"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<(), ProvisionError> {
        match event {
            LifecycleEvent::UserSaved { user_id, origin } => {
                self.provision_new_or_updated_user(*user_id, *origin).await?;
            }
            LifecycleEvent::UserDeleting { user_id } => {
                self.provision_deleted_user(*user_id).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
