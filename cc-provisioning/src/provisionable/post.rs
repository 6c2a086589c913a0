//! Posts and pages.

use tracing::{debug, instrument};

use super::{person_for_user, project_all, to_date, Provisionable, SearchIdSlot};
use crate::errors::ProvisionError;
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{EntityRef, Post, PostQuery, SiteId};
use cc_search_shared::{ContentType, SearchDocument};

/// Native types governed by the posts provisioner unless configured otherwise.
pub const DEFAULT_POST_TYPES: [&str; 2] = ["post", "page"];

pub struct ProvisionablePost {
    post: Post,
    post_types: Vec<String>,
    content_type: ContentType,
    runtime: NativeRuntime,
    slot: SearchIdSlot,
}

impl ProvisionablePost {
    pub fn new(post: Post, runtime: NativeRuntime) -> Self {
        let slot = SearchIdSlot::new(post.handle(), runtime.store.clone());
        Self {
            post,
            post_types: DEFAULT_POST_TYPES.iter().map(|t| t.to_string()).collect(),
            content_type: ContentType::Post,
            runtime,
            slot,
        }
    }

    /// Govern `post_types` instead of the defaults.
    pub fn with_post_types(mut self, post_types: &[String]) -> Self {
        self.post_types = post_types.to_vec();
        self
    }

    /// Emit documents tagged as `content_type`.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub(crate) fn runtime(&self) -> &NativeRuntime {
        &self.runtime
    }

    /// Whether the native type is one of the governed types.
    pub fn is_governed(&self) -> bool {
        self.post_types.iter().any(|t| t == &self.post.post_type)
    }

    /// Published posts of the governed types on `site_id`.
    ///
    /// With `reset`, each post's search ID is cleared before it is
    /// considered, so the returned adapters carry no ID.
    #[instrument(skip(runtime, post_types))]
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
            let mut provisionable =
                ProvisionablePost::new(post, runtime.clone()).with_post_types(post_types);
            if reset {
                provisionable.set_search_id("")?;
            } else {
                provisionable.search_id()?;
            }
            if provisionable.is_eligible()? {
                provisionables.push(provisionable);
            }
        }

        debug!(count = provisionables.len(), "Enumerated posts");
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

impl Provisionable for ProvisionablePost {
    fn entity(&self) -> EntityRef {
        self.post.handle()
    }

    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn search_id(&mut self) -> Result<String, ProvisionError> {
        self.slot.get()
    }

    fn set_search_id(&mut self, search_id: &str) -> Result<(), ProvisionError> {
        self.slot.set(search_id)
    }

    fn to_document(&self) -> Result<SearchDocument, ProvisionError> {
        let network_node = self.runtime.network_node();
        let post = &self.post;

        let owner = match post.author_id {
            Some(author_id) => self
                .runtime
                .source
                .user(author_id)?
                .map(|user| person_for_user(&user, "author", &network_node)),
            None => None,
        };

        let mut document =
            SearchDocument::new(post.id.to_string(), self.content_type, post.title.as_str());
        document.description = post.excerpt.clone();
        document.owner = owner;
        document.primary_url = post.permalink.clone();
        document.thumbnail_url = post.thumbnail_url.clone();
        document.content = post.content.clone();
        document.publication_date = to_date(post.published_at);
        document.modified_date = to_date(post.modified_at);
        document.network_node = network_node;
        self.slot.stamp(&mut document);
        Ok(document)
    }

    fn is_eligible(&self) -> Result<bool, ProvisionError> {
        Ok(self.post.is_published() && self.is_governed())
    }
}
