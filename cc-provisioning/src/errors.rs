//! Error types for provisioning.

use thiserror::Error;

use cc_search_repository::{SearchIndexError, StoreError};
use cc_search_shared::UnknownContentType;

/// Failures that stop a provisioning operation.
///
/// Remote index failures are not represented here: handlers recover from
/// them locally by leaving the stored search ID untouched.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A runtime component the operation cannot do without is not active.
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    UnknownContentType(#[from] UnknownContentType),

    #[error("Invalid internal ID: {0}")]
    InvalidInternalId(String),

    #[error("{kind} {id} not found")]
    EntityNotFound { kind: &'static str, id: String },

    /// The index client failed in a way that aborts a whole run.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),
}

impl ProvisionError {
    pub fn missing_dependency(msg: impl Into<String>) -> Self {
        Self::MissingDependency(msg.into())
    }

    pub fn invalid_internal_id(id: impl Into<String>) -> Self {
        Self::InvalidInternalId(id.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::EntityNotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Groups component required but inactive.
    pub fn groups_inactive() -> Self {
        Self::missing_dependency("groups component is not active")
    }
}
