//! Errors raised by the native content runtime (entity lookup, metadata,
//! site context).

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Reading or writing entity metadata failed.
    #[error("Metadata error: {0}")]
    MetadataError(String),

    /// Switching into a site context failed.
    #[error("Site context error: {0}")]
    SiteContextError(String),

    /// A snapshot could not be loaded or saved.
    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    /// The backing storage is unavailable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::MetadataError(msg.into())
    }

    pub fn site_context(msg: impl Into<String>) -> Self {
        Self::SiteContextError(msg.into())
    }

    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::SnapshotError(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::SnapshotError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SnapshotError(err.to_string())
    }
}
