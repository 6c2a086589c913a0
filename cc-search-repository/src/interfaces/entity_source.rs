//! Read access to native entities.

use crate::errors::StoreError;
use crate::types::{Group, GroupId, GroupRole, Post, PostId, PostQuery, Site, SiteId, User, UserId};

/// Lookup and enumeration of native entities.
///
/// Post lookups are qualified by site. Implementations backed by a runtime
/// with a global "current site" expect the caller to hold a [`SiteScope`]
/// for that site while enumerating.
///
/// [`SiteScope`]: crate::interfaces::SiteScope
pub trait EntitySource: Send + Sync {
    fn post(&self, site_id: SiteId, post_id: PostId) -> Result<Option<Post>, StoreError>;

    fn posts(&self, site_id: SiteId, query: &PostQuery) -> Result<Vec<Post>, StoreError>;

    fn user(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    fn users(&self) -> Result<Vec<User>, StoreError>;

    fn site(&self, site_id: SiteId) -> Result<Option<Site>, StoreError>;

    fn sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Network node label of the current network, used when nothing more
    /// specific is known.
    fn network_node(&self) -> String;

    /// Group component, or `None` when groups are not active.
    fn groups(&self) -> Option<&dyn GroupSource>;
}

/// Access to groups. Only available when the groups component is active.
pub trait GroupSource: Send + Sync {
    fn group(&self, group_id: GroupId) -> Result<Option<Group>, StoreError>;

    fn all_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// Members of a group holding `role`, in the order the runtime returns them.
    fn members_with_role(&self, group_id: GroupId, role: GroupRole)
        -> Result<Vec<UserId>, StoreError>;

    /// Whether group types are registered on this installation.
    fn group_types_enabled(&self) -> bool;

    fn group_type(&self, group_id: GroupId) -> Result<Option<String>, StoreError>;
}
