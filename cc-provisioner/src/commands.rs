//! Commands run by the binary.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, instrument, warn};

use crate::ProvisionerAppError;
use cc_provisioning::{BulkProvisioner, BulkSummary, EventBus, LifecycleEvent, ProgressReporter};
use cc_search_repository::types::SiteId;
use cc_search_repository::SearchIndexClient;
use cc_search_shared::ContentType;

/// Counts from one replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Events handled by every interested subscriber.
    pub dispatched: usize,
    /// Events a subscriber failed on.
    pub failed: usize,
    /// Lines that are not a valid event.
    pub malformed: usize,
}

/// Run bulk provisioning for `content_types` (every type when empty).
pub async fn run_bulk(
    bulk: &BulkProvisioner,
    content_types: &[ContentType],
    site_id: SiteId,
    reporter: &dyn ProgressReporter,
) -> Result<BulkSummary, ProvisionerAppError> {
    let content_types: Vec<ContentType> = if content_types.is_empty() {
        ContentType::ALL.to_vec()
    } else {
        content_types.to_vec()
    };
    Ok(bulk.provision(&content_types, site_id, reporter).await?)
}

/// Replay a JSON-lines event log from `path` through `bus`.
pub async fn replay_file(
    bus: &EventBus,
    path: &Path,
) -> Result<ReplaySummary, ProvisionerAppError> {
    let file = tokio::fs::File::open(path).await?;
    replay_events(bus, BufReader::new(file)).await
}

/// Replay one event per line from `reader`.
///
/// Blank lines are ignored. A malformed line or a failed event is logged and
/// counted; the replay continues with the next line.
#[instrument(skip(bus, reader))]
pub async fn replay_events<R>(
    bus: &EventBus,
    reader: R,
) -> Result<ReplaySummary, ProvisionerAppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: LifecycleEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping malformed event");
                summary.malformed += 1;
                continue;
            }
        };

        match bus.dispatch(&event).await {
            Ok(_) => summary.dispatched += 1,
            Err(e) => {
                error!(
                    line = line_number,
                    event = event.event_type(),
                    error = %e,
                    "Event failed"
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        dispatched = summary.dispatched,
        failed = summary.failed,
        malformed = summary.malformed,
        "Replay finished"
    );
    Ok(summary)
}

/// Check that the search service answers.
pub async fn ping(client: &SearchIndexClient) -> Result<bool, ProvisionerAppError> {
    let healthy = client.health_check().await?;
    if healthy {
        info!("cc-search is reachable");
    } else {
        warn!("cc-search answered but reports unhealthy");
    }
    Ok(healthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dependencies, ProvisionerConfig};
    use cc_provisioning::NullReporter;
    use cc_search_repository::types::{EntityRef, Site};
    use cc_search_repository::{
        IndexCall, InMemoryIndex, InMemoryNetwork, MetadataStore, SEARCH_ID_META_KEY,
    };
    use std::sync::Arc;

    fn site(id: u64) -> Site {
        Site {
            id,
            domain: format!("site{}.example.org", id),
            path: "/".to_string(),
            name: format!("Site {}", id),
            description: String::new(),
            url: String::new(),
            visibility: 1,
            spam: false,
            deleted: false,
            archived: false,
            admin_id: None,
            registered_at: None,
            updated_at: None,
        }
    }

    fn wired() -> (Dependencies, InMemoryIndex) {
        let network = Arc::new(InMemoryNetwork::new());
        network.upsert_site(site(1)).unwrap();
        network.upsert_site(site(7)).unwrap();
        let index = InMemoryIndex::sequential();
        let client = Arc::new(SearchIndexClient::new(Box::new(index.clone())));
        (
            Dependencies::from_parts(&ProvisionerConfig::default(), network, client),
            index,
        )
    }

    #[tokio::test]
    async fn test_replay_counts_each_line() {
        let (deps, index) = wired();
        let log = concat!(
            r#"{"type":"site_initialized","site":{"id":7,"domain":"site7.example.org","path":"/","name":"Site 7","visibility":1}}"#,
            "\n",
            "\n",
            "not json\n",
            r#"{"type":"group_saved","group":{"id":1,"name":"G","status":"public"}}"#,
            "\n",
            r#"{"type":"site_option_updated","site_id":7,"option":"blog_public","old_value":"1","new_value":"0"}"#,
            "\n",
        );

        let summary = replay_events(&deps.bus, log.as_bytes()).await.unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                dispatched: 2,
                failed: 1,
                malformed: 1,
            }
        );
        assert_eq!(
            index.calls().await[1..],
            [IndexCall::Delete("doc-1".to_string())]
        );
        assert_eq!(
            deps.network
                .get(EntityRef::Site { site_id: 7 }, SEARCH_ID_META_KEY)
                .unwrap()
                .as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn test_bulk_defaults_to_every_type() {
        let (deps, index) = wired();

        let result = run_bulk(&deps.bulk, &[], 1, &NullReporter).await;

        // No groups component in this network.
        assert!(result.is_err());
        assert!(index.calls().await.is_empty());

        let summary = run_bulk(&deps.bulk, &[ContentType::Site], 1, &NullReporter)
            .await
            .unwrap();
        assert_eq!(summary.linked, 2);
    }

    #[tokio::test]
    async fn test_ping_in_memory() {
        let (deps, _) = wired();

        assert!(ping(&deps.client).await.unwrap());
    }
}
