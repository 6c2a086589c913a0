//! Search index client implementation.
//!
//! This module provides the main client for interacting with the search index.
//! Provisioning code uses it to index, update, delete and bulk index documents.

use tracing::{debug, warn};

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use cc_search_shared::SearchDocument;

/// The main client for interacting with the search index.
///
/// Every call either yields a document carrying a non-empty remote ID or an
/// error. An empty ID coming back from the provider is reported as an error
/// so callers only have one failure shape to handle.
pub struct SearchIndexClient {
    provider: Box<dyn SearchIndexProvider>,
    config: SearchIndexConfig,
}

impl SearchIndexClient {
    /// Create a new SearchIndexClient with default configuration.
    pub fn new(provider: Box<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexConfig::default(),
        }
    }

    /// Create a new SearchIndexClient with custom configuration.
    pub fn with_config(provider: Box<dyn SearchIndexProvider>, config: SearchIndexConfig) -> Self {
        Self { provider, config }
    }

    /// Index a new document.
    /// Input: SearchDocument without a remote ID
    /// Output: Result<SearchDocument, SearchIndexError> (document with its assigned ID)
    pub async fn index(&self, document: &SearchDocument) -> Result<SearchDocument, SearchIndexError> {
        if document.remote_id().is_some() {
            return Err(SearchIndexError::validation(
                "ID should not be provided for new documents",
            ));
        }

        let indexed = self.provider.index_document(document).await?;
        Self::require_remote_id(indexed, "index")
    }

    /// Update the document if it already has a remote ID, index it otherwise.
    /// Input: SearchDocument (remote ID optional)
    /// Output: Result<SearchDocument, SearchIndexError> (document with its ID)
    pub async fn index_or_update(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError> {
        match document.remote_id() {
            Some(search_id) => {
                debug!(search_id = %search_id, "Updating existing document");
                let updated = self.provider.update_document(document).await?;
                Self::require_remote_id(updated, "update")
            }
            None => {
                let mut document = document.clone();
                document.id = None;
                let indexed = self.provider.index_document(&document).await?;
                Self::require_remote_id(indexed, "index")
            }
        }
    }

    /// Delete a document by remote ID.
    /// Input: search ID (required)
    /// Output: Result<(), SearchIndexError>
    pub async fn delete(&self, search_id: &str) -> Result<(), SearchIndexError> {
        if search_id.trim().is_empty() {
            return Err(SearchIndexError::validation("search ID is required"));
        }

        self.provider.delete_document(search_id).await
    }

    /// Index many new documents.
    /// Input: Vec<SearchDocument> (batch of documents)
    /// Output: Result<Vec<SearchDocument>, SearchIndexError>
    ///
    /// Submissions larger than `max_batch_size` are split into several
    /// requests. A request that fails does not fail the call: its documents
    /// are returned without a remote ID so the caller can report them
    /// individually.
    pub async fn bulk_index(
        &self,
        documents: Vec<SearchDocument>,
    ) -> Result<Vec<SearchDocument>, SearchIndexError> {
        if documents.is_empty() {
            return Ok(vec![]);
        }

        let chunk_size = self.config.chunk_size(documents.len());
        let mut results = Vec::with_capacity(documents.len());

        for (chunk_index, chunk) in documents.chunks(chunk_size).enumerate() {
            match self.provider.bulk_index_documents(chunk).await {
                Ok(indexed) => {
                    debug!(
                        chunk = chunk_index,
                        submitted = chunk.len(),
                        returned = indexed.len(),
                        "Bulk chunk indexed"
                    );
                    results.extend(indexed);
                }
                Err(e) => {
                    warn!(
                        chunk = chunk_index,
                        submitted = chunk.len(),
                        error = %e,
                        "Bulk chunk failed"
                    );
                    results.extend(chunk.iter().cloned().map(|mut doc| {
                        doc.id = None;
                        doc
                    }));
                }
            }
        }

        Ok(results)
    }

    /// Check if the search service is healthy.
    pub async fn health_check(&self) -> Result<bool, SearchIndexError> {
        self.provider.health_check().await
    }

    fn require_remote_id(
        document: SearchDocument,
        operation: &str,
    ) -> Result<SearchDocument, SearchIndexError> {
        if document.remote_id().is_none() {
            return Err(SearchIndexError::unknown(format!(
                "{} returned no document ID",
                operation
            )));
        }
        Ok(document)
    }
}
