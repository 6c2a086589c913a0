//! Handles on the native content runtime shared by adapters and provisioners.

use std::sync::Arc;

use cc_search_repository::{EntitySource, MetadataStore, SiteContext, SiteScope, StoreError};
use cc_search_repository::types::SiteId;

/// Entity lookup, metadata storage and site context of one installation.
///
/// Cloning is cheap; every clone points at the same runtime.
#[derive(Clone)]
pub struct NativeRuntime {
    pub source: Arc<dyn EntitySource>,
    pub store: Arc<dyn MetadataStore>,
    pub sites: Arc<dyn SiteContext>,
}

impl NativeRuntime {
    pub fn new(
        source: Arc<dyn EntitySource>,
        store: Arc<dyn MetadataStore>,
        sites: Arc<dyn SiteContext>,
    ) -> Self {
        Self {
            source,
            store,
            sites,
        }
    }

    /// Runtime backed by a single object implementing every interface.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: EntitySource + MetadataStore + SiteContext + 'static,
    {
        Self {
            source: backend.clone(),
            store: backend.clone(),
            sites: backend,
        }
    }

    /// Enter `site_id` until the returned scope is dropped.
    pub fn enter_site(&self, site_id: SiteId) -> Result<SiteScope<'_>, StoreError> {
        SiteScope::enter(self.sites.as_ref(), site_id)
    }

    /// Network node label of this installation.
    pub fn network_node(&self) -> String {
        self.source.network_node()
    }
}
