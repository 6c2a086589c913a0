//! bbPress topics and replies.

use tracing::debug;

use super::{project_all, Provisionable, ProvisionablePost};
use crate::errors::ProvisionError;
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{EntityRef, Post, PostQuery, PostStatus, SiteId};
use cc_search_shared::{ContentType, SearchDocument};

/// Native types that make up discussions.
pub const DISCUSSION_POST_TYPES: [&str; 2] = ["topic", "reply"];

const TOPIC: &str = "topic";
const REPLY: &str = "reply";

/// A topic or reply. Projects like a post, tagged `discussion`.
pub struct ProvisionableDiscussion {
    inner: ProvisionablePost,
}

impl ProvisionableDiscussion {
    pub fn new(post: Post, runtime: NativeRuntime) -> Self {
        let post_types: Vec<String> = DISCUSSION_POST_TYPES.iter().map(|t| t.to_string()).collect();
        Self {
            inner: ProvisionablePost::new(post, runtime)
                .with_post_types(&post_types)
                .with_content_type(ContentType::Discussion),
        }
    }

    pub fn post(&self) -> &Post {
        self.inner.post()
    }

    /// Whether the discussion's forum is published.
    ///
    /// A topic's forum is its parent. A reply reaches its forum through its
    /// topic. A missing topic or forum makes the discussion non-public. The
    /// discussion's own status plays no part.
    pub fn is_public(&self) -> Result<bool, ProvisionError> {
        let post = self.inner.post();
        let source = &self.inner.runtime().source;

        let topic = match post.post_type.as_str() {
            TOPIC => Some(post.clone()),
            REPLY => match post.parent_id {
                Some(topic_id) => source.post(post.site_id, topic_id)?,
                None => None,
            },
            _ => return Ok(false),
        };
        let Some(topic) = topic else {
            debug!(post_id = post.id, "Discussion has no topic");
            return Ok(false);
        };

        let forum = match topic.parent_id {
            Some(forum_id) => source.post(topic.site_id, forum_id)?,
            None => None,
        };
        Ok(forum.is_some_and(|forum| forum.status == PostStatus::Publish))
    }

    /// Published topics and replies of `site_id` whose forum is public.
    pub fn get_all(
        runtime: &NativeRuntime,
        site_id: SiteId,
        post_types: &[String],
        reset: bool,
    ) -> Result<Vec<Self>, ProvisionError> {
        let posts = {
            let scope = runtime.enter_site(site_id)?;
            runtime
                .source
                .posts(scope.site_id(), &PostQuery::published(post_types))?
        };

        let mut provisionables = Vec::with_capacity(posts.len());
        for post in posts {
            let mut discussion = ProvisionableDiscussion::new(post, runtime.clone());
            if reset {
                discussion.set_search_id("")?;
            } else {
                discussion.search_id()?;
            }
            if discussion.is_public()? {
                provisionables.push(discussion);
            }
        }

        debug!(site_id, count = provisionables.len(), "Enumerated discussions");
        Ok(provisionables)
    }

    pub fn get_all_as_documents(
        runtime: &NativeRuntime,
        site_id: SiteId,
        post_types: &[String],
        reset: bool,
    ) -> Result<Vec<SearchDocument>, ProvisionError> {
        project_all(&Self::get_all(runtime, site_id, post_types, reset)?)
    }
}

impl Provisionable for ProvisionableDiscussion {
    fn entity(&self) -> EntityRef {
        self.inner.entity()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Discussion
    }

    fn search_id(&mut self) -> Result<String, ProvisionError> {
        self.inner.search_id()
    }

    fn set_search_id(&mut self, search_id: &str) -> Result<(), ProvisionError> {
        self.inner.set_search_id(search_id)
    }

    fn to_document(&self) -> Result<SearchDocument, ProvisionError> {
        self.inner.to_document()
    }

    fn is_eligible(&self) -> Result<bool, ProvisionError> {
        self.is_public()
    }
}
