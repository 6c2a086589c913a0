//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (cc-search over HTTP, the
//! in-memory index, test mocks).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use cc_search_shared::SearchDocument;

/// Abstracts the underlying search index implementation.
///
/// Implementations are injected into `SearchIndexClient`, which adds the
/// validation and batching rules shared by every backend.
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling across
/// different backend implementations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Index a new document.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchDocument)` - The document as stored, carrying its assigned `_id`
    /// * `Err(SearchIndexError)` - If indexing fails
    async fn index_document(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError>;

    /// Replace the fields of an existing document identified by its `_id`.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchDocument)` - The updated document, carrying the same `_id`
    /// * `Err(SearchIndexError::DocumentNotFound)` - If no document has that ID
    /// * `Err(SearchIndexError)` - If the update fails
    async fn update_document(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError>;

    /// Delete a document by its remote ID.
    async fn delete_document(&self, search_id: &str) -> Result<(), SearchIndexError>;

    /// Index multiple new documents in one request.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SearchDocument>)` - One entry per indexed document with its `_id`
    /// * `Err(SearchIndexError)` - If the bulk request fails entirely
    async fn bulk_index_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<Vec<SearchDocument>, SearchIndexError>;

    /// Check if the search service is reachable.
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
