//! # cc-search Repository
//!
//! This crate provides the collaborators the provisioning core depends on:
//! the search index client (with an HTTP implementation for cc-search and an
//! in-memory one), and interfaces over the native content runtime (entity
//! lookup, per-entity metadata, site context switching).

pub mod cc_search;
pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod types;

pub use cc_search::{CcSearchConfig, CcSearchProvider};
pub use client::SearchIndexClient;
pub use config::SearchIndexConfig;
pub use errors::{SearchIndexError, StoreError};
pub use interfaces::{
    EntitySource, GroupSource, MetadataStore, SearchIndexProvider, SiteContext, SiteScope,
    SEARCH_ID_META_KEY,
};
pub use memory::{
    GroupsSnapshot, IndexCall, InMemoryIndex, InMemoryNetwork, MetadataEntry, NetworkSnapshot,
};
