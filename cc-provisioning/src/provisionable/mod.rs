//! Provisionable entity adapters.
//!
//! Each adapter owns a snapshot of one native entity together with its
//! [`EntityRef`] handle. Adapters read and write the entity's search ID in
//! the metadata store, decide whether the entity belongs in the index and
//! project it to a [`SearchDocument`].

mod discussion;
mod group;
mod post;
mod profile;
mod site;

pub use discussion::{ProvisionableDiscussion, DISCUSSION_POST_TYPES};
pub use group::ProvisionableGroup;
pub use post::{ProvisionablePost, DEFAULT_POST_TYPES};
pub use profile::ProvisionableProfile;
pub use site::ProvisionableSite;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::errors::ProvisionError;
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{EntityRef, SiteId, User};
use cc_search_repository::{MetadataStore, SEARCH_ID_META_KEY};
use cc_search_shared::{ContentType, SearchDocument, SearchPerson};

/// Common capability of every adapter.
pub trait Provisionable: Send {
    /// Handle of the wrapped native entity.
    fn entity(&self) -> EntityRef;

    fn content_type(&self) -> ContentType;

    /// Stored search ID, `""` when the entity is not indexed.
    ///
    /// Read through from the metadata store on first use, then cached.
    fn search_id(&mut self) -> Result<String, ProvisionError>;

    /// Persist `search_id` immediately. An empty value un-indexes.
    fn set_search_id(&mut self, search_id: &str) -> Result<(), ProvisionError>;

    /// Project the entity to a document.
    ///
    /// Carries the cached search ID as `_id` when one is known. Never changes
    /// the stored search ID.
    fn to_document(&self) -> Result<SearchDocument, ProvisionError>;

    /// Whether the entity belongs in the index.
    fn is_eligible(&self) -> Result<bool, ProvisionError>;
}

/// Cached search ID of one entity, backed by the metadata store.
pub(crate) struct SearchIdSlot {
    entity: EntityRef,
    store: Arc<dyn MetadataStore>,
    cached: Option<String>,
}

impl SearchIdSlot {
    pub(crate) fn new(entity: EntityRef, store: Arc<dyn MetadataStore>) -> Self {
        Self {
            entity,
            store,
            cached: None,
        }
    }

    pub(crate) fn get(&mut self) -> Result<String, ProvisionError> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }
        let search_id = self
            .store
            .get(self.entity, SEARCH_ID_META_KEY)?
            .unwrap_or_default();
        self.cached = Some(search_id.clone());
        Ok(search_id)
    }

    pub(crate) fn set(&mut self, search_id: &str) -> Result<(), ProvisionError> {
        self.store.set(self.entity, SEARCH_ID_META_KEY, search_id)?;
        debug!(entity = %self.entity, search_id, "Stored search ID");
        self.cached = Some(search_id.to_string());
        Ok(())
    }

    /// Cached value without touching the store.
    pub(crate) fn peek(&self) -> &str {
        self.cached.as_deref().unwrap_or("")
    }

    /// Copy the cached search ID onto `document`.
    pub(crate) fn stamp(&self, document: &mut SearchDocument) {
        document.set_remote_id(self.peek());
    }
}

/// Resolve the adapter for a document coming back from the index.
///
/// Post and discussion IDs are looked up on `site_id`.
pub fn resolve_provisionable(
    runtime: &NativeRuntime,
    content_type: ContentType,
    internal_id: &str,
    site_id: SiteId,
) -> Result<Box<dyn Provisionable>, ProvisionError> {
    let id: u64 = internal_id
        .trim()
        .parse()
        .map_err(|_| ProvisionError::invalid_internal_id(internal_id))?;

    let provisionable: Box<dyn Provisionable> = match content_type {
        ContentType::Post => {
            let post = runtime
                .source
                .post(site_id, id)?
                .ok_or_else(|| ProvisionError::not_found("post", id))?;
            Box::new(ProvisionablePost::new(post, runtime.clone()))
        }
        ContentType::Discussion => {
            let post = runtime
                .source
                .post(site_id, id)?
                .ok_or_else(|| ProvisionError::not_found("discussion", id))?;
            Box::new(ProvisionableDiscussion::new(post, runtime.clone()))
        }
        ContentType::Group => {
            let groups = runtime
                .source
                .groups()
                .ok_or_else(ProvisionError::groups_inactive)?;
            let group = groups
                .group(id)?
                .ok_or_else(|| ProvisionError::not_found("group", id))?;
            Box::new(ProvisionableGroup::new(group, runtime.clone()))
        }
        ContentType::Profile => {
            let user = runtime
                .source
                .user(id)?
                .ok_or_else(|| ProvisionError::not_found("user", id))?;
            Box::new(ProvisionableProfile::new(user, runtime.clone()))
        }
        ContentType::Site => {
            let site = runtime
                .source
                .site(id)?
                .ok_or_else(|| ProvisionError::not_found("site", id))?;
            Box::new(ProvisionableSite::new(site, runtime.clone()))
        }
    };
    Ok(provisionable)
}

pub(crate) fn to_date(timestamp: Option<DateTime<Utc>>) -> Option<NaiveDate> {
    timestamp.map(|t| t.date_naive())
}

/// Person entry for a user acting in `role`.
pub(crate) fn person_for_user(user: &User, role: &str, network_node: &str) -> SearchPerson {
    let name = if user.display_name.is_empty() {
        &user.login
    } else {
        &user.display_name
    };
    SearchPerson::new(
        name.as_str(),
        user.login.as_str(),
        user.profile_url.as_str(),
        role,
        network_node,
    )
}

/// Project every adapter, stopping at the first failure.
pub(crate) fn project_all<P: Provisionable>(
    provisionables: &[P],
) -> Result<Vec<SearchDocument>, ProvisionError> {
    provisionables.iter().map(Provisionable::to_document).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for native entities used across the crate's tests.

    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use crate::runtime::NativeRuntime;
    use cc_search_repository::types::{
        Group, GroupId, GroupStatus, Post, PostId, PostStatus, Site, SiteId, User, UserId,
    };
    use cc_search_repository::InMemoryNetwork;

    pub fn runtime(network: &Arc<InMemoryNetwork>) -> NativeRuntime {
        NativeRuntime::from_backend(network.clone())
    }

    pub fn site(id: SiteId) -> Site {
        Site {
            id,
            domain: format!("site{}.example.org", id),
            path: "/".to_string(),
            name: format!("Site {}", id),
            description: format!("Tagline {}", id),
            url: String::new(),
            visibility: 1,
            spam: false,
            deleted: false,
            archived: false,
            admin_id: None,
            registered_at: Some(Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap()),
            updated_at: None,
        }
    }

    pub fn post(site_id: SiteId, id: PostId, post_type: &str, status: PostStatus) -> Post {
        Post {
            id,
            site_id,
            post_type: post_type.to_string(),
            status,
            title: format!("Post {}", id),
            content: format!("Body of post {}", id),
            excerpt: String::new(),
            author_id: None,
            parent_id: None,
            permalink: format!("https://site{}.example.org/?p={}", site_id, id),
            thumbnail_url: String::new(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 2, 3, 12, 0, 0).unwrap()),
            modified_at: None,
        }
    }

    pub fn child(
        site_id: SiteId,
        id: PostId,
        post_type: &str,
        status: PostStatus,
        parent_id: PostId,
    ) -> Post {
        Post {
            parent_id: Some(parent_id),
            ..post(site_id, id, post_type, status)
        }
    }

    pub fn user(id: UserId) -> User {
        User {
            id,
            login: format!("user{}", id),
            display_name: format!("User {}", id),
            email: format!("user{}@example.org", id),
            bio: String::new(),
            profile_url: format!("https://example.org/members/user{}/", id),
            spam: false,
            registered_at: None,
        }
    }

    pub fn group(id: GroupId, status: GroupStatus) -> Group {
        Group {
            id,
            name: format!("Group {}", id),
            description: String::new(),
            status,
            permalink: format!("https://example.org/groups/group-{}/", id),
        }
    }

    /// Network with the main site and site 2.
    pub fn network() -> Arc<InMemoryNetwork> {
        let network = InMemoryNetwork::new();
        network.upsert_site(site(1)).unwrap();
        network.upsert_site(site(2)).unwrap();
        Arc::new(network)
    }
}
