//! cc-search HTTP client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using reqwest against the cc-search v1 API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::cc_search::config::CcSearchConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use cc_search_shared::SearchDocument;

/// Minimal body returned by `POST /v1/documents`.
#[derive(Debug, Deserialize)]
struct IndexedDocumentResponse {
    #[serde(rename = "_id", default)]
    id: String,
}

/// cc-search client implementation.
///
/// # Example
///
/// ```ignore
/// let config = CcSearchConfig::new("https://search.example.org").with_api_key("token");
/// let provider = CcSearchProvider::new(&config)?;
/// let client = SearchIndexClient::new(Box::new(provider));
/// ```
pub struct CcSearchProvider {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl CcSearchProvider {
    /// Create a new client for the service described by `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(CcSearchProvider)` - A new client instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the HTTP client cannot be built
    pub fn new(config: &CcSearchConfig) -> Result<Self, SearchIndexError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| SearchIndexError::connection(format!("Invalid cc-search URL: {}", e)))?;

        // Url::join replaces the last path segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(
            url = %base_url,
            authenticated = config.api_key.is_some(),
            "Created cc-search client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchIndexError> {
        self.base_url
            .join(path)
            .map_err(|e| SearchIndexError::connection(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn document_endpoint(&self, search_id: &str) -> Result<Url, SearchIndexError> {
        let mut url = self.endpoint("v1/documents")?;
        url.path_segments_mut()
            .map_err(|_| SearchIndexError::connection("cc-search URL cannot be a base"))?
            .push(search_id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turn a non-success response into an error carrying its body.
    async fn check_status(
        response: Response,
        to_error: fn(String) -> SearchIndexError,
    ) -> Result<Response, SearchIndexError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "cc-search request failed");
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SearchIndexError::unauthorized(format!("status {}", status)));
        }
        Err(to_error(format!("status {}: {}", status, body)))
    }
}

#[async_trait]
impl SearchIndexProvider for CcSearchProvider {
    #[instrument(skip(self, document), fields(internal_id = %document.internal_id))]
    async fn index_document(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError> {
        let request = self
            .client
            .post(self.endpoint("v1/documents")?)
            .json(document);
        let response = self.authorize(request).send().await?;
        let response = Self::check_status(response, SearchIndexError::IndexError).await?;

        let body: IndexedDocumentResponse = response.json().await?;
        debug!(search_id = %body.id, "Indexed document");

        let mut indexed = document.clone();
        indexed.set_remote_id(body.id);
        Ok(indexed)
    }

    #[instrument(skip(self, document), fields(internal_id = %document.internal_id))]
    async fn update_document(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError> {
        let search_id = document
            .remote_id()
            .ok_or_else(|| SearchIndexError::validation("update requires a document ID"))?;

        let mut body = document.clone();
        body.id = None;

        let request = self
            .client
            .put(self.document_endpoint(search_id)?)
            .json(&body);
        let response = self.authorize(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SearchIndexError::document_not_found(search_id));
        }
        Self::check_status(response, SearchIndexError::UpdateError).await?;

        debug!(search_id = %search_id, "Updated document");
        Ok(document.clone())
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, search_id: &str) -> Result<(), SearchIndexError> {
        let request = self.client.delete(self.document_endpoint(search_id)?);
        let response = self.authorize(request).send().await?;
        Self::check_status(response, SearchIndexError::DeleteError).await?;

        debug!(search_id = %search_id, "Deleted document");
        Ok(())
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_index_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<Vec<SearchDocument>, SearchIndexError> {
        let request = self
            .client
            .post(self.endpoint("v1/documents/bulk")?)
            .json(documents);
        let response = self.authorize(request).send().await?;
        let response = Self::check_status(response, SearchIndexError::BulkOperationError).await?;

        let indexed: Vec<SearchDocument> = response.json().await?;
        info!(
            submitted = documents.len(),
            returned = indexed.len(),
            "Bulk indexed documents"
        );
        Ok(indexed)
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self.client.get(self.endpoint("v1/ping")?).send().await?;
        Ok(response.status().is_success())
    }
}
