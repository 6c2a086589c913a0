//! In-memory search index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use cc_search_shared::SearchDocument;

/// A call received by the in-memory index, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexCall {
    Index(SearchDocument),
    Update(SearchDocument),
    Delete(String),
    BulkIndex(Vec<SearchDocument>),
}

#[derive(Default)]
struct IndexState {
    documents: Mutex<HashMap<String, SearchDocument>>,
    calls: Mutex<Vec<IndexCall>>,
    sequence: AtomicU64,
    sequential_ids: bool,
    fail_index: AtomicBool,
    fail_update: AtomicBool,
    fail_delete: AtomicBool,
    fail_bulk: AtomicBool,
}

/// Search index kept in process memory.
///
/// Clones share state, so a test can keep one handle for inspection while
/// the `SearchIndexClient` owns another.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    state: Arc<IndexState>,
}

impl InMemoryIndex {
    /// Index assigning random IDs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index assigning `doc-1`, `doc-2`, ... in call order.
    pub fn sequential() -> Self {
        Self {
            state: Arc::new(IndexState {
                sequential_ids: true,
                ..Default::default()
            }),
        }
    }

    pub fn fail_index(&self, fail: bool) {
        self.state.fail_index.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.state.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.state.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bulk(&self, fail: bool) {
        self.state.fail_bulk.store(fail, Ordering::SeqCst);
    }

    /// Every call received so far.
    pub async fn calls(&self) -> Vec<IndexCall> {
        self.state.calls.lock().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.calls.lock().await.clear();
    }

    /// Document stored under `search_id`.
    pub async fn document(&self, search_id: &str) -> Option<SearchDocument> {
        self.state.documents.lock().await.get(search_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Store a document directly, bypassing call recording.
    pub async fn seed(&self, search_id: &str, mut document: SearchDocument) {
        document.set_remote_id(search_id);
        self.state
            .documents
            .lock()
            .await
            .insert(search_id.to_string(), document);
    }

    fn next_id(&self) -> String {
        if self.state.sequential_ids {
            let n = self.state.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            format!("doc-{}", n)
        } else {
            Uuid::new_v4().simple().to_string()
        }
    }

    async fn record(&self, call: IndexCall) {
        self.state.calls.lock().await.push(call);
    }

    async fn store_new(&self, document: &SearchDocument) -> SearchDocument {
        let mut stored = document.clone();
        stored.set_remote_id(self.next_id());
        if let Some(search_id) = stored.remote_id() {
            self.state
                .documents
                .lock()
                .await
                .insert(search_id.to_string(), stored.clone());
        }
        stored
    }
}

#[async_trait]
impl SearchIndexProvider for InMemoryIndex {
    async fn index_document(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError> {
        self.record(IndexCall::Index(document.clone())).await;
        if self.state.fail_index.load(Ordering::SeqCst) {
            return Err(SearchIndexError::index("injected index failure"));
        }
        let stored = self.store_new(document).await;
        debug!(search_id = ?stored.id, internal_id = %stored.internal_id, "Indexed in memory");
        Ok(stored)
    }

    async fn update_document(
        &self,
        document: &SearchDocument,
    ) -> Result<SearchDocument, SearchIndexError> {
        self.record(IndexCall::Update(document.clone())).await;
        if self.state.fail_update.load(Ordering::SeqCst) {
            return Err(SearchIndexError::update("injected update failure"));
        }
        let search_id = document
            .remote_id()
            .ok_or_else(|| SearchIndexError::validation("update requires a document ID"))?;

        let mut documents = self.state.documents.lock().await;
        match documents.get_mut(search_id) {
            Some(existing) => {
                *existing = document.clone();
                Ok(document.clone())
            }
            None => Err(SearchIndexError::document_not_found(search_id)),
        }
    }

    async fn delete_document(&self, search_id: &str) -> Result<(), SearchIndexError> {
        self.record(IndexCall::Delete(search_id.to_string())).await;
        if self.state.fail_delete.load(Ordering::SeqCst) {
            return Err(SearchIndexError::delete("injected delete failure"));
        }
        self.state.documents.lock().await.remove(search_id);
        Ok(())
    }

    async fn bulk_index_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<Vec<SearchDocument>, SearchIndexError> {
        self.record(IndexCall::BulkIndex(documents.to_vec())).await;
        if self.state.fail_bulk.load(Ordering::SeqCst) {
            return Err(SearchIndexError::bulk_operation("injected bulk failure"));
        }
        let mut indexed = Vec::with_capacity(documents.len());
        for document in documents {
            indexed.push(self.store_new(document).await);
        }
        Ok(indexed)
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
}
