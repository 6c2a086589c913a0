//! bbPress topics and replies.
//!
//! Wraps a [`PostsProvisioner`] governing `topic` and `reply`. Public-ness of
//! a discussion depends on its forum, so saves are screened here before the
//! wrapped provisioner applies its status-based decision.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{remove, IncrementalProvisioner, PostsProvisioner, ProvisionOutcome};
use crate::errors::ProvisionError;
use crate::events::{EventKind, LifecycleEvent, LifecycleSubscriber};
use crate::provisionable::{Provisionable, ProvisionableDiscussion, DISCUSSION_POST_TYPES};
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{Post, Site, SiteId};
use cc_search_repository::SearchIndexClient;
use cc_search_shared::ContentType;

const SUBSCRIPTIONS: &[EventKind] = &[
    EventKind::PostSaved,
    EventKind::PostDeleting,
    EventKind::SiteDeletionValidating,
    EventKind::SiteSpammed,
    EventKind::SiteUnspammed,
];

pub struct DiscussionsProvisioner {
    client: Arc<SearchIndexClient>,
    runtime: NativeRuntime,
    posts: PostsProvisioner,
}

impl DiscussionsProvisioner {
    pub fn new(client: Arc<SearchIndexClient>, runtime: NativeRuntime) -> Self {
        let posts = PostsProvisioner::new(client.clone(), runtime.clone())
            .with_post_types(DISCUSSION_POST_TYPES.iter().map(|t| t.to_string()).collect())
            .with_content_type(ContentType::Discussion);
        Self {
            client,
            runtime,
            posts,
        }
    }

    pub fn post_types(&self) -> &[String] {
        self.posts.post_types()
    }

    /// Handle a created or updated topic or reply.
    ///
    /// A non-public discussion with a stored ID is removed whatever its
    /// status. A public one goes through the posts decision. A non-public
    /// one without an ID is left alone.
    #[instrument(skip(self, post), fields(post_id = post.id, site_id = post.site_id, post_type = %post.post_type))]
    pub async fn provision_new_or_updated_post(
        &self,
        post: &Post,
        update: bool,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        if !self.posts.governs(post) {
            return Ok(ProvisionOutcome::Skipped);
        }

        let mut discussion = ProvisionableDiscussion::new(post.clone(), self.runtime.clone());
        if discussion.is_public()? {
            debug!("Public discussion, delegating to posts");
            return self.posts.provision_new_or_updated_post(post, update).await;
        }

        if discussion.search_id()?.is_empty() {
            debug!("Non-public discussion without search ID, skipping");
            return Ok(ProvisionOutcome::Skipped);
        }
        info!("Discussion no longer public");
        remove(&self.client, &mut discussion).await
    }

    pub async fn provision_deleted_post(
        &self,
        post: &Post,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        self.posts.provision_deleted_post(post).await
    }

    pub async fn provision_posts_from_deleted_site(
        &self,
        site: &Site,
    ) -> Result<Vec<ProvisionOutcome>, ProvisionError> {
        self.posts.provision_posts_from_deleted_site(site).await
    }

    pub async fn provision_posts_from_spammed_site(
        &self,
        site_id: SiteId,
    ) -> Result<Vec<ProvisionOutcome>, ProvisionError> {
        self.posts.provision_posts_from_spammed_site(site_id).await
    }

    /// Re-provision the discussions of an unspammed site, screening each one
    /// for public-ness like a save does.
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
        let posts = self.posts.posts_of_site(&scope)?;

        let mut outcomes = Vec::with_capacity(posts.len());
        for post in &posts {
            outcomes.push(self.provision_new_or_updated_post(post, true).await?);
        }
        drop(scope);
        Ok(outcomes)
    }
}

impl IncrementalProvisioner for DiscussionsProvisioner {
    fn is_enabled(&self) -> bool {
        self.posts.is_enabled()
    }

    fn enable(&self) {
        self.posts.enable();
    }

    fn disable(&self) {
        self.posts.disable();
    }
}

#[async_trait]
impl LifecycleSubscriber for DiscussionsProvisioner {
    fn name(&self) -> &str {
        "discussions"
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
