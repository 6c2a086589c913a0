//! # cc-provisioner
//!
//! Runner for cc-search provisioning against a JSON snapshot of a network.
//!
//! This crate provides configuration, dependency wiring and the commands
//! behind the `cc-provisioner` binary: bulk provisioning, replay of a
//! lifecycle event log, and a health check.

pub mod commands;
pub mod config;

pub use config::{Dependencies, ProvisionerConfig};

use thiserror::Error;

/// Errors that can occur while setting up or running the provisioner.
#[derive(Error, Debug)]
pub enum ProvisionerAppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provisioning error.
    #[error("Provisioning error: {0}")]
    ProvisionError(#[from] cc_provisioning::ProvisionError),

    /// Search index error.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] cc_search_repository::SearchIndexError),

    /// Snapshot or metadata store error.
    #[error("Store error: {0}")]
    StoreError(#[from] cc_search_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProvisionerAppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
