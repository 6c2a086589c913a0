//! cc-search implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! speaking the cc-search v1 HTTP API.

mod client;
mod config;

pub use client::CcSearchProvider;
pub use config::{CcSearchConfig, DEFAULT_CC_SEARCH_URL, DEFAULT_TIMEOUT};
