//! Native entity snapshots and handles.
//!
//! These types mirror the parts of the content runtime's entities that
//! provisioning reads. They are owned snapshots: adapters hold a copy plus an
//! [`EntityRef`] handle and go back to the runtime for anything else.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SiteId = u64;
pub type PostId = u64;
pub type GroupId = u64;
pub type UserId = u64;

/// The main site of a network.
pub const MAIN_SITE_ID: SiteId = 1;

/// Kind of native entity, used to partition the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Post,
    Group,
    User,
    Site,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Group => "group",
            EntityKind::User => "user",
            EntityKind::Site => "site",
        }
    }
}

/// Handle to a native entity.
///
/// Post IDs are only unique within a site, so post handles carry the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityRef {
    Post { site_id: SiteId, post_id: PostId },
    Group { group_id: GroupId },
    User { user_id: UserId },
    Site { site_id: SiteId },
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Post { .. } => EntityKind::Post,
            EntityRef::Group { .. } => EntityKind::Group,
            EntityRef::User { .. } => EntityKind::User,
            EntityRef::Site { .. } => EntityKind::Site,
        }
    }

    /// The native ID, without the site qualifier for posts.
    pub fn id(&self) -> u64 {
        match *self {
            EntityRef::Post { post_id, .. } => post_id,
            EntityRef::Group { group_id } => group_id,
            EntityRef::User { user_id } => user_id,
            EntityRef::Site { site_id } => site_id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Post { site_id, post_id } => write!(f, "post:{}/{}", site_id, post_id),
            other => write!(f, "{}:{}", other.kind().as_str(), other.id()),
        }
    }
}

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    AutoDraft,
    Inherit,
}

/// A post of any native type (post, page, topic, reply, forum, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub site_id: SiteId,
    pub post_type: String,
    pub status: PostStatus,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author_id: Option<UserId>,
    /// Parent post. For a topic this is its forum, for a reply its topic.
    #[serde(default)]
    pub parent_id: Option<PostId>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn handle(&self) -> EntityRef {
        EntityRef::Post {
            site_id: self.site_id,
            post_id: self.id,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Publish
    }
}

/// Filter for enumerating posts within a site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// Native post types to include.
    pub post_types: Vec<String>,
    /// Required status. `None` matches any status.
    pub status: Option<PostStatus>,
}

impl PostQuery {
    pub fn any_status(post_types: &[String]) -> Self {
        Self {
            post_types: post_types.to_vec(),
            status: None,
        }
    }

    pub fn published(post_types: &[String]) -> Self {
        Self {
            post_types: post_types.to_vec(),
            status: Some(PostStatus::Publish),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.post_types.iter().any(|t| t == &post.post_type)
            && self.status.map_or(true, |status| status == post.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Public,
    Private,
    Hidden,
}

/// A BuddyPress-style group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: GroupStatus,
    #[serde(default)]
    pub permalink: String,
}

impl Group {
    pub fn handle(&self) -> EntityRef {
        EntityRef::Group { group_id: self.id }
    }
}

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Mod,
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: GroupRole,
}

/// A network user with a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_url: String,
    #[serde(default)]
    pub spam: bool,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn handle(&self) -> EntityRef {
        EntityRef::User { user_id: self.id }
    }
}

/// A site in the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub domain: String,
    #[serde(default = "default_site_path")]
    pub path: String,
    /// Site title (the blog name option).
    #[serde(default)]
    pub name: String,
    /// Tagline (the blog description option).
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// The `blog_public` option. Positive values are publicly visible:
    /// `1` public, `0` hidden from search engines, `-1` network members only,
    /// `-2` site members only, `-3` site administrators only.
    #[serde(default = "default_visibility")]
    pub visibility: i32,
    #[serde(default)]
    pub spam: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub admin_id: Option<UserId>,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_site_path() -> String {
    "/".to_string()
}

fn default_visibility() -> i32 {
    1
}

impl Site {
    pub fn handle(&self) -> EntityRef {
        EntityRef::Site { site_id: self.id }
    }

    /// Parse a `blog_public` option value.
    ///
    /// Reads the leading integer after optional whitespace and sign, so
    /// `"1abc"` and `"1.5"` are `1`. No leading digits means `0`. Out of range
    /// values saturate.
    pub fn parse_visibility(value: &str) -> i32 {
        let value = value.trim_start();
        let (negative, digits) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        let magnitude = digits
            .bytes()
            .take_while(u8::is_ascii_digit)
            .fold(0i32, |acc, digit| {
                acc.saturating_mul(10).saturating_add(i32::from(digit - b'0'))
            });
        if negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Home URL, falling back to the domain and path.
    pub fn home_url(&self) -> String {
        if self.url.is_empty() {
            format!("https://{}{}", self.domain, self.path)
        } else {
            self.url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(post_type: &str, status: PostStatus) -> Post {
        Post {
            id: 1,
            site_id: MAIN_SITE_ID,
            post_type: post_type.to_string(),
            status,
            title: "t".to_string(),
            content: String::new(),
            excerpt: String::new(),
            author_id: None,
            parent_id: None,
            permalink: String::new(),
            thumbnail_url: String::new(),
            published_at: None,
            modified_at: None,
        }
    }

    #[test]
    fn test_post_query_matches() {
        let types = vec!["post".to_string(), "page".to_string()];

        let any = PostQuery::any_status(&types);
        assert!(any.matches(&post("page", PostStatus::Draft)));
        assert!(!any.matches(&post("topic", PostStatus::Publish)));

        let published = PostQuery::published(&types);
        assert!(published.matches(&post("post", PostStatus::Publish)));
        assert!(!published.matches(&post("post", PostStatus::Private)));
    }

    #[test]
    fn test_parse_visibility() {
        assert_eq!(Site::parse_visibility("1"), 1);
        assert_eq!(Site::parse_visibility("-3"), -3);
        assert_eq!(Site::parse_visibility(" 0 "), 0);
        assert_eq!(Site::parse_visibility("public"), 0);
        assert_eq!(Site::parse_visibility("1abc"), 1);
        assert_eq!(Site::parse_visibility("1.5"), 1);
        assert_eq!(Site::parse_visibility("+2"), 2);
        assert_eq!(Site::parse_visibility("-"), 0);
        assert_eq!(Site::parse_visibility(""), 0);
        assert_eq!(Site::parse_visibility("99999999999"), i32::MAX);
    }

    #[test]
    fn test_entity_ref_display() {
        let post_ref = EntityRef::Post {
            site_id: 2,
            post_id: 42,
        };
        assert_eq!(post_ref.to_string(), "post:2/42");
        assert_eq!(post_ref.id(), 42);
        assert_eq!(EntityRef::Group { group_id: 5 }.to_string(), "group:5");
    }

    #[test]
    fn test_post_status_wire_names() {
        let status: PostStatus = serde_json::from_str("\"auto-draft\"").unwrap();
        assert_eq!(status, PostStatus::AutoDraft);
        assert_eq!(serde_json::to_string(&PostStatus::Publish).unwrap(), "\"publish\"");
    }
}
