//! Connection settings for the cc-search service.

use std::time::Duration;

/// Default cc-search base URL.
pub const DEFAULT_CC_SEARCH_URL: &str = "http://localhost:81";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CcSearchConfig {
    /// Base URL of the service, e.g. `https://search.example.org`.
    pub base_url: String,
    /// Bearer token sent with mutating requests.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for CcSearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CC_SEARCH_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CcSearchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.is_empty() { None } else { Some(api_key) };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
