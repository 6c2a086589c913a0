//! Native lifecycle events and their dispatch.

mod bus;

pub use bus::{EventBus, LifecycleSubscriber, DEFAULT_PRIORITY, SITE_INIT_PRIORITY};

use serde::{Deserialize, Serialize};

use cc_search_repository::types::{Group, GroupId, Post, Site, SiteId, UserId};

/// Site option holding the site title.
pub const BLOG_NAME_OPTION: &str = "blogname";
/// Site option holding the visibility code.
pub const VISIBILITY_OPTION: &str = "blog_public";

/// Which native user hook produced a [`LifecycleEvent::UserSaved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEventOrigin {
    #[default]
    ProfileUpdated,
    ExtendedProfileUpdated,
    NetworkUserCreated,
    Registered,
    UserUpdated,
}

/// A lifecycle event of the native runtime.
///
/// Entity payloads are snapshots taken when the event fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A post of any type was created (`update == false`) or updated.
    PostSaved {
        post: Post,
        #[serde(default)]
        update: bool,
    },

    /// A post is about to be deleted.
    PostDeleting { post: Post },

    /// Site deletion was requested. The site's content is still readable.
    SiteDeletionValidating { site: Site },

    /// A site was deleted.
    SiteDeleted { site: Site },

    SiteSpammed { site_id: SiteId },

    SiteUnspammed { site_id: SiteId },

    /// A new site finished initializing.
    SiteInitialized { site: Site },

    SiteUpdated { site: Site },

    /// A site option changed value.
    SiteOptionUpdated {
        site_id: SiteId,
        option: String,
        #[serde(default)]
        old_value: String,
        #[serde(default)]
        new_value: String,
    },

    GroupSaved { group: Group },

    /// A group is about to be deleted.
    GroupDeleting { group_id: GroupId },

    UserSaved {
        user_id: UserId,
        #[serde(default)]
        origin: UserEventOrigin,
    },

    UserDeleting { user_id: UserId },
}

/// Discriminant of a [`LifecycleEvent`], used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PostSaved,
    PostDeleting,
    SiteDeletionValidating,
    SiteDeleted,
    SiteSpammed,
    SiteUnspammed,
    SiteInitialized,
    SiteUpdated,
    SiteOptionUpdated,
    GroupSaved,
    GroupDeleting,
    UserSaved,
    UserDeleting,
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::PostSaved { .. } => EventKind::PostSaved,
            LifecycleEvent::PostDeleting { .. } => EventKind::PostDeleting,
            LifecycleEvent::SiteDeletionValidating { .. } => EventKind::SiteDeletionValidating,
            LifecycleEvent::SiteDeleted { .. } => EventKind::SiteDeleted,
            LifecycleEvent::SiteSpammed { .. } => EventKind::SiteSpammed,
            LifecycleEvent::SiteUnspammed { .. } => EventKind::SiteUnspammed,
            LifecycleEvent::SiteInitialized { .. } => EventKind::SiteInitialized,
            LifecycleEvent::SiteUpdated { .. } => EventKind::SiteUpdated,
            LifecycleEvent::SiteOptionUpdated { .. } => EventKind::SiteOptionUpdated,
            LifecycleEvent::GroupSaved { .. } => EventKind::GroupSaved,
            LifecycleEvent::GroupDeleting { .. } => EventKind::GroupDeleting,
            LifecycleEvent::UserSaved { .. } => EventKind::UserSaved,
            LifecycleEvent::UserDeleting { .. } => EventKind::UserDeleting,
        }
    }

    /// Event name as it appears in logs and event files.
    pub fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::PostSaved { .. } => "post_saved",
            LifecycleEvent::PostDeleting { .. } => "post_deleting",
            LifecycleEvent::SiteDeletionValidating { .. } => "site_deletion_validating",
            LifecycleEvent::SiteDeleted { .. } => "site_deleted",
            LifecycleEvent::SiteSpammed { .. } => "site_spammed",
            LifecycleEvent::SiteUnspammed { .. } => "site_unspammed",
            LifecycleEvent::SiteInitialized { .. } => "site_initialized",
            LifecycleEvent::SiteUpdated { .. } => "site_updated",
            LifecycleEvent::SiteOptionUpdated { .. } => "site_option_updated",
            LifecycleEvent::GroupSaved { .. } => "group_saved",
            LifecycleEvent::GroupDeleting { .. } => "group_deleting",
            LifecycleEvent::UserSaved { .. } => "user_saved",
            LifecycleEvent::UserDeleting { .. } => "user_deleting",
        }
    }
}
