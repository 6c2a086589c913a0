//! Progress reporting for bulk runs.

use tracing::{info, warn};

/// Receives human-readable progress of a bulk run. Purely observational.
pub trait ProgressReporter: Send + Sync {
    fn line(&self, message: &str);

    fn warning(&self, message: &str);

    fn success(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn line(&self, _message: &str) {}

    fn warning(&self, _message: &str) {}

    fn success(&self, _message: &str) {}
}

/// Forwards progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn line(&self, message: &str) {
        info!(target: "cc_provisioning::progress", "{}", message);
    }

    fn warning(&self, message: &str) {
        warn!(target: "cc_provisioning::progress", "{}", message);
    }

    fn success(&self, message: &str) {
        info!(target: "cc_provisioning::progress", success = true, "{}", message);
    }
}
