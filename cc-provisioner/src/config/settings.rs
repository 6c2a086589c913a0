//! Settings read from the environment.

use std::env;
use std::time::Duration;

use crate::ProvisionerAppError;
use cc_search_repository::cc_search::DEFAULT_CC_SEARCH_URL;
use cc_search_repository::{CcSearchConfig, SearchIndexConfig};

/// Default number of documents per bulk request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Native types provisioned as `post` documents by default.
pub const DEFAULT_POST_TYPES: &str = "post,page";

/// Provisioner settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionerConfig {
    pub cc_search_url: String,
    pub cc_search_api_key: Option<String>,
    pub max_batch_size: usize,
    pub timeout: Duration,
    pub post_types: Vec<String>,
    pub provision_posts: bool,
    pub provision_discussions: bool,
    pub provision_groups: bool,
    pub provision_profiles: bool,
    pub provision_sites: bool,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            cc_search_url: DEFAULT_CC_SEARCH_URL.to_string(),
            cc_search_api_key: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            post_types: split_list(DEFAULT_POST_TYPES),
            provision_posts: true,
            provision_discussions: true,
            provision_groups: true,
            provision_profiles: true,
            provision_sites: true,
        }
    }
}

impl ProvisionerConfig {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CC_SEARCH_URL`: cc-search base URL (default: http://localhost:81)
    /// - `CC_SEARCH_API_KEY`: Bearer token for cc-search (default: none)
    /// - `CC_SEARCH_MAX_BATCH_SIZE`: Documents per bulk request (default: 1000)
    /// - `CC_SEARCH_TIMEOUT_SECS`: Request timeout (default: 30)
    /// - `CC_POST_TYPES`: Comma-separated native types for `post` documents (default: post,page)
    /// - `CC_PROVISION_POSTS`, `CC_PROVISION_DISCUSSIONS`, `CC_PROVISION_GROUPS`,
    ///   `CC_PROVISION_PROFILES`, `CC_PROVISION_SITES`: Enable flags (default: true)
    ///
    /// # Returns
    ///
    /// * `Ok(ProvisionerConfig)` - Parsed settings
    /// * `Err(ProvisionerAppError)` - If a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ProvisionerAppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`. Unset and blank variables take their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProvisionerAppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let max_batch_size = match get("CC_SEARCH_MAX_BATCH_SIZE") {
            Some(value) => parse_number::<usize>("CC_SEARCH_MAX_BATCH_SIZE", &value)?,
            None => defaults.max_batch_size,
        };
        if max_batch_size == 0 {
            return Err(ProvisionerAppError::config(
                "CC_SEARCH_MAX_BATCH_SIZE must be at least 1",
            ));
        }

        let timeout = match get("CC_SEARCH_TIMEOUT_SECS") {
            Some(value) => {
                Duration::from_secs(parse_number::<u64>("CC_SEARCH_TIMEOUT_SECS", &value)?)
            }
            None => defaults.timeout,
        };

        let post_types = get("CC_POST_TYPES")
            .map(|value| split_list(&value))
            .filter(|types| !types.is_empty())
            .unwrap_or(defaults.post_types);

        let flag = |key: &str| -> Result<bool, ProvisionerAppError> {
            match get(key) {
                Some(value) => parse_flag(key, &value),
                None => Ok(true),
            }
        };

        Ok(Self {
            cc_search_url: get("CC_SEARCH_URL").unwrap_or(defaults.cc_search_url),
            cc_search_api_key: get("CC_SEARCH_API_KEY"),
            max_batch_size,
            timeout,
            post_types,
            provision_posts: flag("CC_PROVISION_POSTS")?,
            provision_discussions: flag("CC_PROVISION_DISCUSSIONS")?,
            provision_groups: flag("CC_PROVISION_GROUPS")?,
            provision_profiles: flag("CC_PROVISION_PROFILES")?,
            provision_sites: flag("CC_PROVISION_SITES")?,
        })
    }

    /// Connection settings for the HTTP provider.
    pub fn cc_search(&self) -> CcSearchConfig {
        let config = CcSearchConfig::new(self.cc_search_url.clone()).with_timeout(self.timeout);
        match &self.cc_search_api_key {
            Some(api_key) => config.with_api_key(api_key.clone()),
            None => config,
        }
    }

    /// Index client settings.
    pub fn search_index(&self) -> SearchIndexConfig {
        SearchIndexConfig::with_max_batch_size(self.max_batch_size)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ProvisionerAppError> {
    value
        .trim()
        .parse()
        .map_err(|_| ProvisionerAppError::config(format!("{} is not a number: {}", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ProvisionerAppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ProvisionerAppError::config(format!(
            "{} is not a boolean: {}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ProvisionerConfig, ProvisionerAppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProvisionerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config, ProvisionerConfig::default());
        assert_eq!(config.post_types, vec!["post", "page"]);
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CC_SEARCH_URL", "https://search.example.org"),
            ("CC_SEARCH_API_KEY", "secret"),
            ("CC_SEARCH_MAX_BATCH_SIZE", "250"),
            ("CC_SEARCH_TIMEOUT_SECS", "5"),
            ("CC_POST_TYPES", "post, page ,event,"),
            ("CC_PROVISION_GROUPS", "off"),
            ("CC_PROVISION_SITES", "FALSE"),
        ])
        .unwrap();

        assert_eq!(config.cc_search_url, "https://search.example.org");
        assert_eq!(config.cc_search_api_key.as_deref(), Some("secret"));
        assert_eq!(config.search_index().max_batch_size, Some(250));
        assert_eq!(config.cc_search().timeout, Duration::from_secs(5));
        assert_eq!(config.post_types, vec!["post", "page", "event"]);
        assert!(config.provision_posts);
        assert!(!config.provision_groups);
        assert!(!config.provision_sites);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("CC_SEARCH_API_KEY", " "), ("CC_POST_TYPES", ",")]).unwrap();

        assert_eq!(config.cc_search_api_key, None);
        assert_eq!(config.post_types, vec!["post", "page"]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("CC_SEARCH_MAX_BATCH_SIZE", "many")]),
            Err(ProvisionerAppError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("CC_SEARCH_MAX_BATCH_SIZE", "0")]),
            Err(ProvisionerAppError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("CC_PROVISION_POSTS", "maybe")]),
            Err(ProvisionerAppError::ConfigError(_))
        ));
    }
}
