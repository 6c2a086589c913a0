//! Posts and pages, including the cascade on site deletion and spam.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{reconcile, remove, EnabledFlag, IncrementalProvisioner, IndexMode, ProvisionOutcome};
use crate::errors::ProvisionError;
use crate::events::{EventKind, LifecycleEvent, LifecycleSubscriber};
use crate::provisionable::{Provisionable, ProvisionablePost, DEFAULT_POST_TYPES};
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{Post, PostQuery, Site, SiteId};
use cc_search_repository::{SearchIndexClient, SiteScope};
use cc_search_shared::ContentType;

const SUBSCRIPTIONS: &[EventKind] = &[
    EventKind::PostSaved,
    EventKind::PostDeleting,
    EventKind::SiteDeletionValidating,
    EventKind::SiteSpammed,
    EventKind::SiteUnspammed,
];

pub struct PostsProvisioner {
    client: Arc<SearchIndexClient>,
    runtime: NativeRuntime,
    enabled: EnabledFlag,
    post_types: Vec<String>,
    content_type: ContentType,
}

impl PostsProvisioner {
    /// Provisioner for `post` and `page`.
    pub fn new(client: Arc<SearchIndexClient>, runtime: NativeRuntime) -> Self {
        Self {
            client,
            runtime,
            enabled: EnabledFlag::new(true),
            post_types: DEFAULT_POST_TYPES.iter().map(|t| t.to_string()).collect(),
            content_type: ContentType::Post,
        }
    }

    /// Govern `post_types` instead of the defaults.
    pub fn with_post_types(mut self, post_types: Vec<String>) -> Self {
        self.post_types = post_types;
        self
    }

    /// Tag produced documents with `content_type`.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn post_types(&self) -> &[String] {
        &self.post_types
    }

    pub fn governs(&self, post: &Post) -> bool {
        self.post_types.iter().any(|t| t == &post.post_type)
    }

    fn provisionable(&self, post: Post) -> ProvisionablePost {
        ProvisionablePost::new(post, self.runtime.clone())
            .with_post_types(&self.post_types)
            .with_content_type(self.content_type)
    }

    /// Posts of the governed types on the site `scope` holds, in any status.
    pub(crate) fn posts_of_site(
        &self,
        scope: &SiteScope<'_>,
    ) -> Result<Vec<Post>, ProvisionError> {
        let posts = self
            .runtime
            .source
            .posts(scope.site_id(), &PostQuery::any_status(&self.post_types))?;
        Ok(posts)
    }

    /// Handle a created (`update == false`) or updated post.
    #[instrument(skip(self, post), fields(post_id = post.id, site_id = post.site_id, post_type = %post.post_type))]
    pub async fn provision_new_or_updated_post(
        &self,
        post: &Post,
        update: bool,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        if !self.governs(post) {
            return Ok(ProvisionOutcome::Skipped);
        }

        info!(
            action = if update { "update" } else { "add" },
            title = %post.title,
            "Post provisioning"
        );
        let mut provisionable = self.provisionable(post.clone());
        let eligible = provisionable.is_eligible()?;
        reconcile(&self.client, &mut provisionable, eligible, IndexMode::IndexOrUpdate).await
    }

    /// Handle a post about to be deleted.
    #[instrument(skip(self, post), fields(post_id = post.id, site_id = post.site_id))]
    pub async fn provision_deleted_post(
        &self,
        post: &Post,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        if !self.governs(post) {
            return Ok(ProvisionOutcome::Skipped);
        }
        let mut provisionable = self.provisionable(post.clone());
        remove(&self.client, &mut provisionable).await
    }

    /// Remove every governed post of a site that is about to be deleted.
    ///
    /// Runs before the site's content is destroyed, so its posts can still be
    /// enumerated. The site stays current until every post is handled.
    #[instrument(skip(self, site), fields(site_id = site.id, domain = %site.domain))]
    pub async fn provision_posts_from_deleted_site(
        &self,
        site: &Site,
    ) -> Result<Vec<ProvisionOutcome>, ProvisionError> {
        if !self.is_enabled() {
            return Ok(vec![ProvisionOutcome::Disabled]);
        }

        let scope = self.runtime.enter_site(site.id)?;
        let posts = self.posts_of_site(&scope)?;
        info!(count = posts.len(), "Removing posts of site");

        let mut outcomes = Vec::with_capacity(posts.len());
        for post in &posts {
            outcomes.push(self.provision_deleted_post(post).await?);
        }
        drop(scope);
        Ok(outcomes)
    }

    #[instrument(skip(self))]
    pub async fn provision_posts_from_spammed_site(
        &self,
        site_id: SiteId,
    ) -> Result<Vec<ProvisionOutcome>, ProvisionError> {
        if !self.is_enabled() {
            return Ok(vec![ProvisionOutcome::Disabled]);
        }
        let Some(site) = self.runtime.source.site(site_id)? else {
            warn!("Spammed site not found, skipping");
            return Ok(vec![ProvisionOutcome::Skipped]);
        };
        self.provision_posts_from_deleted_site(&site).await
    }

    /// Re-provision every governed post of an unspammed site through the
    /// create/update path.
    #[instrument(skip(self))]
    pub async fn provision_posts_from_unspammed_site(
        &self,
        site_id: SiteId,
    ) -> Result<Vec<ProvisionOutcome>, ProvisionError> {
        if !self.is_enabled() {
            return Ok(vec![ProvisionOutcome::Disabled]);
        }
        let Some(site) = self.runtime.source.site(site_id)? else {
            warn!("Unspammed site not found, skipping");
            return Ok(vec![ProvisionOutcome::Skipped]);
        };

        let scope = self.runtime.enter_site(site.id)?;
        let posts = self.posts_of_site(&scope)?;
        info!(count = posts.len(), domain = %site.domain, "Re-adding posts of site");

        let mut outcomes = Vec::with_capacity(posts.len());
        for post in &posts {
            outcomes.push(self.provision_new_or_updated_post(post, true).await?);
        }
        drop(scope);
        Ok(outcomes)
    }
}

impl IncrementalProvisioner for PostsProvisioner {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn enable(&self) {
        self.enabled.set(true);
    }

    fn disable(&self) {
        self.enabled.set(false);
    }
}

#[async_trait]
impl LifecycleSubscriber for PostsProvisioner {
    fn name(&self) -> &str {
        "posts"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<(), ProvisionError> {
        match event {
            LifecycleEvent::PostSaved { post, update } => {
                self.provision_new_or_updated_post(post, *update).await?;
            }
            LifecycleEvent::PostDeleting { post } => {
                self.provision_deleted_post(post).await?;
            }
            LifecycleEvent::SiteDeletionValidating { site } => {
                self.provision_posts_from_deleted_site(site).await?;
            }
            LifecycleEvent::SiteSpammed { site_id } => {
                self.provision_posts_from_spammed_site(*site_id).await?;
            }
            LifecycleEvent::SiteUnspammed { site_id } => {
                self.provision_posts_from_unspammed_site(*site_id).await?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, SiteTrackingStore};
    use super::*;
    use crate::provisionable::fixtures;
    use cc_search_repository::types::PostStatus;
    use cc_search_repository::{IndexCall, MetadataStore, SiteContext, SEARCH_ID_META_KEY};

    fn tracked(harness: &Harness) -> (PostsProvisioner, Arc<SiteTrackingStore>) {
        let (runtime, store) = harness.site_tracking_runtime();
        (PostsProvisioner::new(harness.client.clone(), runtime), store)
    }

    fn stored_id(harness: &Harness, post: &Post) -> Option<String> {
        harness.network.get(post.handle(), SEARCH_ID_META_KEY).unwrap()
    }

    fn provisioner(harness: &Harness) -> PostsProvisioner {
        PostsProvisioner::new(harness.client.clone(), harness.runtime.clone())
    }

    #[tokio::test]
    async fn test_new_published_post_is_indexed() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let post = fixtures::post(1, 42, "post", PostStatus::Publish);

        let outcome = provisioner.provision_new_or_updated_post(&post, false).await.unwrap();

        assert_eq!(
            outcome,
            ProvisionOutcome::Indexed {
                search_id: "doc-1".to_string()
            }
        );
        let calls = harness.index.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            IndexCall::Index(doc) if doc.internal_id == "42" && doc.remote_id().is_none()
        ));
        assert_eq!(stored_id(&harness, &post).as_deref(), Some("doc-1"));
    }

    #[tokio::test]
    async fn test_second_save_updates_same_document() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let post = fixtures::post(1, 42, "post", PostStatus::Publish);

        provisioner.provision_new_or_updated_post(&post, false).await.unwrap();
        provisioner.provision_new_or_updated_post(&post, true).await.unwrap();

        let calls = harness.index.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], IndexCall::Index(_)));
        assert!(matches!(&calls[1], IndexCall::Update(doc) if doc.remote_id() == Some("doc-1")));
        assert_eq!(stored_id(&harness, &post).as_deref(), Some("doc-1"));
        assert_eq!(harness.index.len().await, 1);
    }

    #[tokio::test]
    async fn test_unpublishing_deletes_once_and_clears() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let mut post = fixtures::post(1, 42, "post", PostStatus::Publish);
        provisioner.provision_new_or_updated_post(&post, false).await.unwrap();
        harness.index.clear_calls().await;

        post.status = PostStatus::Private;
        let outcome = provisioner.provision_new_or_updated_post(&post, true).await.unwrap();

        assert_eq!(
            outcome,
            ProvisionOutcome::Deleted {
                search_id: "doc-1".to_string()
            }
        );
        assert_eq!(
            harness.index.calls().await,
            vec![IndexCall::Delete("doc-1".to_string())]
        );
        assert_eq!(stored_id(&harness, &post).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_draft_without_id_makes_no_calls() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let post = fixtures::post(1, 42, "post", PostStatus::Draft);

        let outcome = provisioner.provision_new_or_updated_post(&post, false).await.unwrap();

        assert_eq!(outcome, ProvisionOutcome::Skipped);
        assert!(harness.index.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_stored_id() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let post = fixtures::post(1, 42, "post", PostStatus::Publish);
        harness
            .network
            .set(post.handle(), SEARCH_ID_META_KEY, "abc")
            .unwrap();
        harness.index.fail_delete(true);

        let outcome = provisioner.provision_deleted_post(&post).await.unwrap();

        assert!(outcome.is_failure());
        assert_eq!(stored_id(&harness, &post).as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_failed_index_keeps_stored_id() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let post = fixtures::post(1, 42, "post", PostStatus::Publish);
        harness.index.fail_index(true);

        let outcome = provisioner.provision_new_or_updated_post(&post, false).await.unwrap();

        assert_eq!(outcome, ProvisionOutcome::IndexFailed);
        assert_eq!(stored_id(&harness, &post), None);
    }

    #[tokio::test]
    async fn test_disabled_provisioner_does_nothing() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        provisioner.disable();
        let post = fixtures::post(1, 42, "post", PostStatus::Publish);

        let outcome = provisioner.provision_new_or_updated_post(&post, false).await.unwrap();

        assert_eq!(outcome, ProvisionOutcome::Disabled);
        assert!(harness.index.calls().await.is_empty());

        provisioner.enable();
        assert!(provisioner.is_enabled());
    }

    #[tokio::test]
    async fn test_ungoverned_types_are_ignored() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let topic = fixtures::post(1, 5, "topic", PostStatus::Publish);

        let outcome = provisioner.provision_new_or_updated_post(&topic, false).await.unwrap();

        assert_eq!(outcome, ProvisionOutcome::Skipped);
        assert!(harness.index.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_site_cascade_removes_all_statuses_and_restores_context() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        let published = fixtures::post(2, 1, "post", PostStatus::Publish);
        let draft = fixtures::post(2, 2, "page", PostStatus::Draft);
        for post in [&published, &draft] {
            harness.network.upsert_post(post.clone()).unwrap();
            harness
                .network
                .set(post.handle(), SEARCH_ID_META_KEY, &format!("id-{}", post.id))
                .unwrap();
        }

        let outcomes = provisioner
            .provision_posts_from_deleted_site(&fixtures::site(2))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            harness.index.calls().await,
            vec![
                IndexCall::Delete("id-1".to_string()),
                IndexCall::Delete("id-2".to_string())
            ]
        );
        assert_eq!(harness.network.current_site(), 1);
    }

    #[tokio::test]
    async fn test_unspammed_site_reprovisions_posts() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);
        harness
            .network
            .upsert_post(fixtures::post(2, 1, "post", PostStatus::Publish))
            .unwrap();
        harness
            .network
            .upsert_post(fixtures::post(2, 2, "post", PostStatus::Draft))
            .unwrap();

        let outcomes = provisioner.provision_posts_from_unspammed_site(2).await.unwrap();

        assert_eq!(
            outcomes,
            vec![
                ProvisionOutcome::Indexed {
                    search_id: "doc-1".to_string()
                },
                ProvisionOutcome::Skipped
            ]
        );
        assert_eq!(harness.network.current_site(), 1);
    }

    #[tokio::test]
    async fn test_spam_of_unknown_site_is_skipped() {
        let harness = Harness::new();
        let provisioner = provisioner(&harness);

        let outcomes = provisioner.provision_posts_from_spammed_site(99).await.unwrap();

        assert_eq!(outcomes, vec![ProvisionOutcome::Skipped]);
        assert!(harness.index.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_site_cascade_keeps_site_current_for_metadata() {
        let harness = Harness::new();
        let (provisioner, store) = tracked(&harness);
        let post = fixtures::post(2, 1, "post", PostStatus::Publish);
        harness.network.upsert_post(post.clone()).unwrap();
        harness
            .network
            .set(post.handle(), SEARCH_ID_META_KEY, "id-1")
            .unwrap();

        provisioner
            .provision_posts_from_deleted_site(&fixtures::site(2))
            .await
            .unwrap();

        assert_eq!(
            store.accesses(),
            vec![("get", post.handle(), 2), ("set", post.handle(), 2)]
        );
        assert_eq!(harness.network.current_site(), 1);
        assert_eq!(stored_id(&harness, &post).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_unspammed_site_cascade_keeps_site_current_for_metadata() {
        let harness = Harness::new();
        let (provisioner, store) = tracked(&harness);
        let post = fixtures::post(2, 1, "post", PostStatus::Publish);
        harness.network.upsert_post(post.clone()).unwrap();

        provisioner.provision_posts_from_unspammed_site(2).await.unwrap();

        let accesses = store.accesses();
        assert!(!accesses.is_empty());
        assert!(accesses.iter().all(|(_, _, site)| *site == 2));
        assert_eq!(harness.network.current_site(), 1);
    }
}
