//! Interface definitions for the provisioning core's collaborators.
//!
//! `SearchIndexProvider` abstracts the remote search service. The remaining
//! traits abstract the native content runtime so the core can be driven by a
//! live installation, a snapshot, or a test stub.

mod entity_source;
mod metadata_store;
mod search_index_provider;
mod site_context;

pub use entity_source::{EntitySource, GroupSource};
pub use metadata_store::{MetadataStore, SEARCH_ID_META_KEY};
pub use search_index_provider::SearchIndexProvider;
pub use site_context::{SiteContext, SiteScope};
