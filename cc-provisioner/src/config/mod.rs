//! Configuration and dependency wiring.

mod dependencies;
mod settings;

pub use dependencies::{build_search_client, Dependencies};
pub use settings::{
    ProvisionerConfig, DEFAULT_MAX_BATCH_SIZE, DEFAULT_POST_TYPES, DEFAULT_TIMEOUT_SECS,
};
