//! Bulk provisioning.
//!
//! Rebuilds index entries for every eligible entity of the requested types:
//! enumerate with search IDs reset, submit all documents as one batch, then
//! write the returned IDs back onto the entities.

mod progress;

pub use progress::{NullReporter, ProgressReporter, TracingReporter};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::errors::ProvisionError;
use crate::provisionable::{
    resolve_provisionable, ProvisionableDiscussion, ProvisionableGroup, ProvisionablePost,
    ProvisionableProfile, ProvisionableSite, DEFAULT_POST_TYPES, DISCUSSION_POST_TYPES,
};
use crate::runtime::NativeRuntime;
use cc_search_repository::types::SiteId;
use cc_search_repository::SearchIndexClient;
use cc_search_shared::{ContentType, SearchDocument};

/// Counts from one bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Documents submitted to the index.
    pub submitted: usize,
    /// Search IDs written back onto entities.
    pub linked: usize,
    /// Documents the index returned without a remote ID.
    pub failed: usize,
    /// Documents returned without an internal ID.
    pub unmapped: usize,
    /// Documents whose entity could not be resolved.
    pub unresolved: usize,
}

/// Bulk provisioning job.
pub struct BulkProvisioner {
    client: Arc<SearchIndexClient>,
    runtime: NativeRuntime,
    post_types: Vec<String>,
    discussion_types: Vec<String>,
}

impl BulkProvisioner {
    pub fn new(client: Arc<SearchIndexClient>, runtime: NativeRuntime) -> Self {
        Self {
            client,
            runtime,
            post_types: DEFAULT_POST_TYPES.iter().map(|t| t.to_string()).collect(),
            discussion_types: DISCUSSION_POST_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Native types enumerated for `post` documents.
    pub fn with_post_types(mut self, post_types: Vec<String>) -> Self {
        self.post_types = post_types;
        self
    }

    /// Collect documents for one content type.
    fn documents_for(
        &self,
        content_type: ContentType,
        site_id: SiteId,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<SearchDocument>, ProvisionError> {
        let runtime = &self.runtime;
        let (documents, label) = match content_type {
            ContentType::Post => (
                ProvisionablePost::get_all_as_documents(runtime, site_id, &self.post_types, true)?,
                "posts",
            ),
            ContentType::Profile => (
                ProvisionableProfile::get_all_as_documents(runtime, true)?,
                "users",
            ),
            ContentType::Group => (
                ProvisionableGroup::get_all_as_documents(runtime, true)?,
                "groups",
            ),
            ContentType::Site => (ProvisionableSite::get_all_as_documents(runtime, true)?, "sites"),
            ContentType::Discussion => (
                ProvisionableDiscussion::get_all_as_documents(
                    runtime,
                    site_id,
                    &self.discussion_types,
                    true,
                )?,
                "discussion posts",
            ),
        };
        reporter.line(&format!("Provisioning {} {}...", documents.len(), label));
        Ok(documents)
    }

    /// Provision every eligible entity of `content_types`.
    ///
    /// # Arguments
    ///
    /// * `content_types` - Types to provision. Order and duplicates do not matter
    /// * `site_id` - Site whose posts and discussions are enumerated
    /// * `reporter` - Receives progress lines and per-document warnings
    ///
    /// # Returns
    ///
    /// * `Ok(BulkSummary)` - Counts for the run. Per-document failures are counted, not raised
    /// * `Err(ProvisionError)` - Enumeration failed or a required component is missing
    #[instrument(skip(self, content_types, reporter), fields(types = ?content_types))]
    pub async fn provision(
        &self,
        content_types: &[ContentType],
        site_id: SiteId,
        reporter: &dyn ProgressReporter,
    ) -> Result<BulkSummary, ProvisionError> {
        let mut documents = Vec::new();
        for content_type in ContentType::ALL {
            if content_types.contains(&content_type) {
                documents.extend(self.documents_for(content_type, site_id, reporter)?);
            }
        }

        let mut summary = BulkSummary {
            submitted: documents.len(),
            ..Default::default()
        };
        info!(submitted = summary.submitted, "Submitting bulk documents");

        let indexed = self.client.bulk_index(documents).await?;
        reporter.line("Updating metadata...");

        for document in indexed {
            let Some(search_id) = document.remote_id().map(str::to_string) else {
                warn!(
                    internal_id = %document.internal_id,
                    content_type = %document.content_type,
                    "Document was not indexed"
                );
                reporter.warning(&format!("Failed to index document: {}", document.title));
                summary.failed += 1;
                continue;
            };
            if document.internal_id.is_empty() {
                warn!(search_id = %search_id, "Indexed document has no internal ID");
                reporter.warning(&format!(
                    "Failed to update internal ID for document: {} id: {}",
                    document.title, search_id
                ));
                summary.unmapped += 1;
                continue;
            }

            match self.link(&document, &search_id, site_id) {
                Ok(()) => summary.linked += 1,
                Err(e) => {
                    warn!(
                        internal_id = %document.internal_id,
                        content_type = %document.content_type,
                        search_id = %search_id,
                        error = %e,
                        "Could not store search ID"
                    );
                    reporter.warning(&format!(
                        "Failed to update internal ID for document: {} id: {}",
                        document.title, search_id
                    ));
                    summary.unresolved += 1;
                }
            }
        }

        info!(
            linked = summary.linked,
            failed = summary.failed,
            unmapped = summary.unmapped,
            unresolved = summary.unresolved,
            "Bulk provisioning finished"
        );
        reporter.success("Provisioning complete");
        Ok(summary)
    }

    /// Store `search_id` on the entity `document` was built from.
    fn link(
        &self,
        document: &SearchDocument,
        search_id: &str,
        site_id: SiteId,
    ) -> Result<(), ProvisionError> {
        let content_type = document.content_type()?;
        let mut provisionable =
            resolve_provisionable(&self.runtime, content_type, &document.internal_id, site_id)?;
        provisionable.set_search_id(search_id)?;
        debug!(entity = %provisionable.entity(), search_id, "Linked document");
        Ok(())
    }
}
