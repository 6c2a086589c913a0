//! Incremental provisioners.
//!
//! One provisioner per entity family. Each reacts to lifecycle events by
//! adding, updating or removing the entity's document and persisting the
//! resulting search ID:
//!
//! | Event         | Eligible | Has search ID | Action                          |
//! |---------------|----------|---------------|---------------------------------|
//! | create/update | yes      | any           | index or update, store the ID   |
//! | create/update | no       | yes           | delete, clear the stored ID     |
//! | create/update | no       | no            | nothing                         |
//! | delete        | any      | yes           | delete, clear the stored ID     |
//! | delete        | any      | no            | nothing                         |
//!
//! A remote failure never changes the stored ID.

mod discussions;
mod groups;
mod posts;
mod profiles;
mod sites;

pub use discussions::DiscussionsProvisioner;
pub use groups::GroupsProvisioner;
pub use posts::PostsProvisioner;
pub use profiles::ProfilesProvisioner;
pub use sites::SitesProvisioner;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::errors::ProvisionError;
use crate::provisionable::Provisionable;
use cc_search_repository::SearchIndexClient;

/// Result of one provisioning decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The provisioner is disabled.
    Disabled,
    /// Nothing to do for this entity.
    Skipped,
    Indexed { search_id: String },
    Deleted { search_id: String },
    /// Index or update failed. The stored ID is unchanged.
    IndexFailed,
    /// Delete failed. The stored ID is unchanged.
    DeleteFailed { search_id: String },
}

impl ProvisionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProvisionOutcome::IndexFailed | ProvisionOutcome::DeleteFailed { .. }
        )
    }
}

/// Enable switch shared by every provisioner.
pub trait IncrementalProvisioner {
    fn is_enabled(&self) -> bool;

    fn enable(&self);

    fn disable(&self);
}

/// Process-lifetime enabled flag.
#[derive(Debug)]
pub(crate) struct EnabledFlag(AtomicBool);

impl EnabledFlag {
    pub(crate) fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    pub(crate) fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

/// Which index call creates a missing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexMode {
    /// Update when a search ID is stored, index otherwise.
    IndexOrUpdate,
    /// Always index a new document.
    Index,
}

/// Apply the create/update row of the decision table.
pub(crate) async fn reconcile(
    client: &SearchIndexClient,
    provisionable: &mut dyn Provisionable,
    eligible: bool,
    mode: IndexMode,
) -> Result<ProvisionOutcome, ProvisionError> {
    if eligible {
        return push(client, provisionable, mode).await;
    }
    if provisionable.search_id()?.is_empty() {
        debug!(
            entity = %provisionable.entity(),
            "Not eligible and not indexed, skipping"
        );
        return Ok(ProvisionOutcome::Skipped);
    }
    remove(client, provisionable).await
}

/// Index or update the entity's document and store the returned ID.
pub(crate) async fn push(
    client: &SearchIndexClient,
    provisionable: &mut dyn Provisionable,
    mode: IndexMode,
) -> Result<ProvisionOutcome, ProvisionError> {
    let entity = provisionable.entity();
    let previous = provisionable.search_id()?;
    let document = provisionable.to_document()?;

    let (action, result) = match mode {
        IndexMode::IndexOrUpdate if !previous.is_empty() => {
            ("update", client.index_or_update(&document).await)
        }
        IndexMode::IndexOrUpdate => ("add", client.index_or_update(&document).await),
        IndexMode::Index => {
            let mut document = document;
            document.id = None;
            ("add", client.index(&document).await)
        }
    };

    match result {
        Ok(indexed) => {
            let search_id = indexed.remote_id().unwrap_or_default().to_string();
            provisionable.set_search_id(&search_id)?;
            info!(
                entity = %entity,
                content_type = %provisionable.content_type(),
                action,
                search_id = %search_id,
                "Provisioned document"
            );
            Ok(ProvisionOutcome::Indexed { search_id })
        }
        Err(e) => {
            warn!(
                entity = %entity,
                content_type = %provisionable.content_type(),
                action,
                search_id = %previous,
                error = %e,
                "Provisioning failed"
            );
            Ok(ProvisionOutcome::IndexFailed)
        }
    }
}

/// Delete the entity's document if it has one, clearing the stored ID on
/// success.
pub(crate) async fn remove(
    client: &SearchIndexClient,
    provisionable: &mut dyn Provisionable,
) -> Result<ProvisionOutcome, ProvisionError> {
    let entity = provisionable.entity();
    let search_id = provisionable.search_id()?;
    if search_id.is_empty() {
        debug!(entity = %entity, "No search ID, nothing to delete");
        return Ok(ProvisionOutcome::Skipped);
    }

    match client.delete(&search_id).await {
        Ok(()) => {
            provisionable.set_search_id("")?;
            info!(
                entity = %entity,
                content_type = %provisionable.content_type(),
                action = "delete",
                search_id = %search_id,
                "Removed document"
            );
            Ok(ProvisionOutcome::Deleted { search_id })
        }
        Err(e) => {
            warn!(
                entity = %entity,
                content_type = %provisionable.content_type(),
                action = "delete",
                search_id = %search_id,
                error = %e,
                "Delete failed"
            );
            Ok(ProvisionOutcome::DeleteFailed { search_id })
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Index client and runtime wiring shared by the provisioner tests.

    use std::sync::{Arc, Mutex};

    use crate::provisionable::fixtures;
    use crate::runtime::NativeRuntime;
    use cc_search_repository::types::{EntityRef, SiteId};
    use cc_search_repository::{
        InMemoryIndex, InMemoryNetwork, MetadataStore, SearchIndexClient, SiteContext, StoreError,
    };

    pub struct Harness {
        pub network: Arc<InMemoryNetwork>,
        pub runtime: NativeRuntime,
        pub index: InMemoryIndex,
        pub client: Arc<SearchIndexClient>,
    }

    impl Harness {
        pub fn new() -> Self {
            let network = fixtures::network();
            let runtime = fixtures::runtime(&network);
            let index = InMemoryIndex::sequential();
            let client = Arc::new(SearchIndexClient::new(Box::new(index.clone())));
            Self {
                network,
                runtime,
                index,
                client,
            }
        }

        /// Runtime over the same network whose metadata accesses are tracked.
        pub fn site_tracking_runtime(&self) -> (NativeRuntime, Arc<SiteTrackingStore>) {
            let store = Arc::new(SiteTrackingStore {
                network: self.network.clone(),
                accesses: Mutex::new(Vec::new()),
            });
            let runtime =
                NativeRuntime::new(self.network.clone(), store.clone(), self.network.clone());
            (runtime, store)
        }
    }

    /// Metadata store that notes the current site on every access.
    pub struct SiteTrackingStore {
        network: Arc<InMemoryNetwork>,
        accesses: Mutex<Vec<(&'static str, EntityRef, SiteId)>>,
    }

    impl SiteTrackingStore {
        pub fn accesses(&self) -> Vec<(&'static str, EntityRef, SiteId)> {
            self.accesses.lock().unwrap().clone()
        }

        fn note(&self, op: &'static str, entity: EntityRef) {
            let site = self.network.current_site();
            self.accesses.lock().unwrap().push((op, entity, site));
        }
    }

    impl MetadataStore for SiteTrackingStore {
        fn get(&self, entity: EntityRef, key: &str) -> Result<Option<String>, StoreError> {
            self.note("get", entity);
            self.network.get(entity, key)
        }

        fn set(&self, entity: EntityRef, key: &str, value: &str) -> Result<(), StoreError> {
            self.note("set", entity);
            self.network.set(entity, key, value)
        }
    }
}
