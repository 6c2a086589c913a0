//! Per-entity metadata storage.

use crate::errors::StoreError;
use crate::types::EntityRef;

/// Metadata key under which an entity's search ID is stored.
pub const SEARCH_ID_META_KEY: &str = "cc_search_id";

/// Key-value metadata attached to native entities.
///
/// One store covers every entity kind; the [`EntityRef`] selects the
/// partition (post, group, user or site metadata).
pub trait MetadataStore: Send + Sync {
    /// Read a metadata value. `Ok(None)` when it was never set.
    fn get(&self, entity: EntityRef, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a metadata value immediately.
    fn set(&self, entity: EntityRef, key: &str, value: &str) -> Result<(), StoreError>;
}
