//! In-memory multisite network.
//!
//! Implements [`EntitySource`], [`GroupSource`], [`MetadataStore`] and
//! [`SiteContext`] over plain collections. The whole state round-trips
//! through [`NetworkSnapshot`] so it can be persisted as JSON.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::interfaces::{EntitySource, GroupSource, MetadataStore, SiteContext};
use crate::types::{
    EntityRef, Group, GroupId, GroupMembership, GroupRole, Post, PostId, PostQuery, Site, SiteId,
    User, UserId, MAIN_SITE_ID,
};

fn default_network_node() -> String {
    "hc".to_string()
}

/// Group component state. Absent when groups are not active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupsSnapshot {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub memberships: Vec<GroupMembership>,
    /// Group type per group. `None` when group types are not registered.
    #[serde(default)]
    pub group_types: Option<HashMap<GroupId, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub entity: EntityRef,
    pub key: String,
    pub value: String,
}

/// Serializable state of an [`InMemoryNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(default = "default_network_node")]
    pub network_node: String,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Option<GroupsSnapshot>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl Default for NetworkSnapshot {
    fn default() -> Self {
        Self {
            network_node: default_network_node(),
            sites: Vec::new(),
            posts: Vec::new(),
            users: Vec::new(),
            groups: None,
            metadata: Vec::new(),
        }
    }
}

impl NetworkSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Entities {
    sites: HashMap<SiteId, Site>,
    posts: HashMap<(SiteId, PostId), Post>,
    users: HashMap<UserId, User>,
    groups: Option<GroupsSnapshot>,
}

/// Multisite network held in memory.
///
/// Post enumeration requires the queried site to be the current site, the
/// same constraint a live multisite runtime places on its callers.
pub struct InMemoryNetwork {
    network_node: String,
    entities: RwLock<Entities>,
    metadata: RwLock<HashMap<(EntityRef, String), String>>,
    site_stack: Mutex<Vec<SiteId>>,
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::from_snapshot(NetworkSnapshot::default())
    }
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: NetworkSnapshot) -> Self {
        let entities = Entities {
            sites: snapshot.sites.into_iter().map(|s| (s.id, s)).collect(),
            posts: snapshot
                .posts
                .into_iter()
                .map(|p| ((p.site_id, p.id), p))
                .collect(),
            users: snapshot.users.into_iter().map(|u| (u.id, u)).collect(),
            groups: snapshot.groups,
        };
        let metadata = snapshot
            .metadata
            .into_iter()
            .map(|entry| ((entry.entity, entry.key), entry.value))
            .collect();

        Self {
            network_node: snapshot.network_node,
            entities: RwLock::new(entities),
            metadata: RwLock::new(metadata),
            site_stack: Mutex::new(vec![MAIN_SITE_ID]),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let snapshot = NetworkSnapshot::load(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            sites = snapshot.sites.len(),
            posts = snapshot.posts.len(),
            users = snapshot.users.len(),
            "Loaded network snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Current state, sorted by ID for stable output.
    pub fn snapshot(&self) -> Result<NetworkSnapshot, StoreError> {
        let entities = self.read_entities()?;
        let metadata = self.read_metadata()?;

        let mut sites: Vec<Site> = entities.sites.values().cloned().collect();
        sites.sort_by_key(|s| s.id);
        let mut posts: Vec<Post> = entities.posts.values().cloned().collect();
        posts.sort_by_key(|p| (p.site_id, p.id));
        let mut users: Vec<User> = entities.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        let mut entries: Vec<MetadataEntry> = metadata
            .iter()
            .map(|((entity, key), value)| MetadataEntry {
                entity: *entity,
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.entity.to_string(), &a.key).cmp(&(b.entity.to_string(), &b.key))
        });

        Ok(NetworkSnapshot {
            network_node: self.network_node.clone(),
            sites,
            posts,
            users,
            groups: entities.groups.clone(),
            metadata: entries,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        self.snapshot()?.save(path)
    }

    pub fn upsert_site(&self, site: Site) -> Result<(), StoreError> {
        self.write_entities()?.sites.insert(site.id, site);
        Ok(())
    }

    pub fn upsert_post(&self, post: Post) -> Result<(), StoreError> {
        self.write_entities()?
            .posts
            .insert((post.site_id, post.id), post);
        Ok(())
    }

    pub fn upsert_user(&self, user: User) -> Result<(), StoreError> {
        self.write_entities()?.users.insert(user.id, user);
        Ok(())
    }

    /// Insert or replace a group, activating the group component if needed.
    pub fn upsert_group(&self, group: Group) -> Result<(), StoreError> {
        let mut entities = self.write_entities()?;
        let groups = entities.groups.get_or_insert_with(GroupsSnapshot::default);
        groups.groups.retain(|g| g.id != group.id);
        groups.groups.push(group);
        Ok(())
    }

    pub fn add_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: GroupRole,
    ) -> Result<(), StoreError> {
        let mut entities = self.write_entities()?;
        let groups = entities.groups.get_or_insert_with(GroupsSnapshot::default);
        groups.memberships.push(GroupMembership {
            group_id,
            user_id,
            role,
        });
        Ok(())
    }

    pub fn set_group_type(&self, group_id: GroupId, group_type: &str) -> Result<(), StoreError> {
        let mut entities = self.write_entities()?;
        let groups = entities.groups.get_or_insert_with(GroupsSnapshot::default);
        groups
            .group_types
            .get_or_insert_with(HashMap::new)
            .insert(group_id, group_type.to_string());
        Ok(())
    }

    pub fn remove_post(&self, site_id: SiteId, post_id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self.write_entities()?.posts.remove(&(site_id, post_id)))
    }

    pub fn remove_site(&self, site_id: SiteId) -> Result<Option<Site>, StoreError> {
        let mut entities = self.write_entities()?;
        entities.posts.retain(|(post_site, _), _| *post_site != site_id);
        Ok(entities.sites.remove(&site_id))
    }

    pub fn remove_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.write_entities()?.users.remove(&user_id))
    }

    pub fn remove_group(&self, group_id: GroupId) -> Result<Option<Group>, StoreError> {
        let mut entities = self.write_entities()?;
        let Some(groups) = entities.groups.as_mut() else {
            return Ok(None);
        };
        let position = groups.groups.iter().position(|g| g.id == group_id);
        groups.memberships.retain(|m| m.group_id != group_id);
        Ok(position.map(|i| groups.groups.remove(i)))
    }

    /// Depth of the site switch stack. `1` means no switch is active.
    pub fn site_stack_depth(&self) -> usize {
        self.lock_stack().len()
    }

    fn read_entities(&self) -> Result<RwLockReadGuard<'_, Entities>, StoreError> {
        self.entities
            .read()
            .map_err(|_| StoreError::unavailable("entity lock poisoned"))
    }

    fn write_entities(&self) -> Result<RwLockWriteGuard<'_, Entities>, StoreError> {
        self.entities
            .write()
            .map_err(|_| StoreError::unavailable("entity lock poisoned"))
    }

    fn read_metadata(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<(EntityRef, String), String>>, StoreError> {
        self.metadata
            .read()
            .map_err(|_| StoreError::metadata("metadata lock poisoned"))
    }

    fn lock_stack(&self) -> std::sync::MutexGuard<'_, Vec<SiteId>> {
        self.site_stack.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EntitySource for InMemoryNetwork {
    fn post(&self, site_id: SiteId, post_id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self.read_entities()?.posts.get(&(site_id, post_id)).cloned())
    }

    fn posts(&self, site_id: SiteId, query: &PostQuery) -> Result<Vec<Post>, StoreError> {
        let current = self.current_site();
        if current != site_id {
            return Err(StoreError::site_context(format!(
                "posts of site {} queried while site {} is current",
                site_id, current
            )));
        }
        let entities = self.read_entities()?;
        let mut posts: Vec<Post> = entities
            .posts
            .values()
            .filter(|p| p.site_id == site_id && query.matches(p))
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.id);
        Ok(posts)
    }

    fn user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read_entities()?.users.get(&user_id).cloned())
    }

    fn users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.read_entities()?.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    fn site(&self, site_id: SiteId) -> Result<Option<Site>, StoreError> {
        Ok(self.read_entities()?.sites.get(&site_id).cloned())
    }

    fn sites(&self) -> Result<Vec<Site>, StoreError> {
        let mut sites: Vec<Site> = self.read_entities()?.sites.values().cloned().collect();
        sites.sort_by_key(|s| s.id);
        Ok(sites)
    }

    fn network_node(&self) -> String {
        self.network_node.clone()
    }

    fn groups(&self) -> Option<&dyn GroupSource> {
        let active = self
            .entities
            .read()
            .map(|entities| entities.groups.is_some())
            .unwrap_or(false);
        if active {
            Some(self)
        } else {
            None
        }
    }
}

impl GroupSource for InMemoryNetwork {
    fn group(&self, group_id: GroupId) -> Result<Option<Group>, StoreError> {
        let entities = self.read_entities()?;
        Ok(entities
            .groups
            .as_ref()
            .and_then(|g| g.groups.iter().find(|group| group.id == group_id))
            .cloned())
    }

    fn all_groups(&self) -> Result<Vec<Group>, StoreError> {
        let entities = self.read_entities()?;
        let mut groups = entities
            .groups
            .as_ref()
            .map(|g| g.groups.clone())
            .unwrap_or_default();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    fn members_with_role(
        &self,
        group_id: GroupId,
        role: GroupRole,
    ) -> Result<Vec<UserId>, StoreError> {
        let entities = self.read_entities()?;
        Ok(entities
            .groups
            .as_ref()
            .map(|g| {
                g.memberships
                    .iter()
                    .filter(|m| m.group_id == group_id && m.role == role)
                    .map(|m| m.user_id)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn group_types_enabled(&self) -> bool {
        self.entities
            .read()
            .map(|entities| {
                entities
                    .groups
                    .as_ref()
                    .is_some_and(|g| g.group_types.is_some())
            })
            .unwrap_or(false)
    }

    fn group_type(&self, group_id: GroupId) -> Result<Option<String>, StoreError> {
        let entities = self.read_entities()?;
        Ok(entities
            .groups
            .as_ref()
            .and_then(|g| g.group_types.as_ref())
            .and_then(|types| types.get(&group_id))
            .cloned())
    }
}

impl MetadataStore for InMemoryNetwork {
    fn get(&self, entity: EntityRef, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read_metadata()?
            .get(&(entity, key.to_string()))
            .cloned())
    }

    fn set(&self, entity: EntityRef, key: &str, value: &str) -> Result<(), StoreError> {
        let mut metadata = self
            .metadata
            .write()
            .map_err(|_| StoreError::metadata("metadata lock poisoned"))?;
        debug!(entity = %entity, key, value, "Set metadata");
        metadata.insert((entity, key.to_string()), value.to_string());
        Ok(())
    }
}

impl SiteContext for InMemoryNetwork {
    fn current_site(&self) -> SiteId {
        self.lock_stack().last().copied().unwrap_or(MAIN_SITE_ID)
    }

    fn switch_to(&self, site_id: SiteId) -> Result<(), StoreError> {
        if self.read_entities()?.sites.get(&site_id).is_none() {
            return Err(StoreError::site_context(format!(
                "site {} does not exist",
                site_id
            )));
        }
        self.lock_stack().push(site_id);
        Ok(())
    }

    fn restore(&self) {
        let mut stack = self.lock_stack();
        if stack.len() > 1 {
            stack.pop();
        }
    }
}
