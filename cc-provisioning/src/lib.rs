//! # cc-search Provisioning
//!
//! This crate keeps a cc-search index in sync with the content of a
//! multisite network: posts, forum discussions, groups, member profiles
//! and sites.
//!
//! ## Architecture
//!
//! 1. **Provisionables**: Adapters that project a native entity into a
//!    search document and decide whether it belongs in the index
//! 2. **Provisioners**: One per entity family. React to lifecycle events by
//!    indexing, updating or removing documents
//! 3. **Events**: Typed lifecycle events and the bus that routes them to
//!    provisioners in priority order
//! 4. **Bulk**: Rebuilds the index for whole content types in one batch
//!
//! The search ID returned by the index is stored on each entity under
//! `cc_search_id`; an empty value means "not indexed".

pub mod bulk;
pub mod errors;
pub mod events;
pub mod provisionable;
pub mod provisioners;
pub mod runtime;

#[cfg(test)]
mod scenarios;

pub use bulk::{BulkProvisioner, BulkSummary, NullReporter, ProgressReporter, TracingReporter};
pub use errors::ProvisionError;
pub use events::{EventBus, EventKind, LifecycleEvent, LifecycleSubscriber, UserEventOrigin};
pub use provisionable::{resolve_provisionable, Provisionable};
pub use provisioners::{
    DiscussionsProvisioner, GroupsProvisioner, IncrementalProvisioner, PostsProvisioner,
    ProfilesProvisioner, ProvisionOutcome, SitesProvisioner,
};
pub use runtime::NativeRuntime;
