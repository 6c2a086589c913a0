//! End-to-end lifecycle runs through the event bus with every provisioner
//! subscribed.

use std::sync::Arc;

use crate::events::{
    EventBus, LifecycleEvent, DEFAULT_PRIORITY, SITE_INIT_PRIORITY, VISIBILITY_OPTION,
};
use crate::provisionable::fixtures;
use crate::provisioners::{
    DiscussionsProvisioner, GroupsProvisioner, IncrementalProvisioner, PostsProvisioner,
    ProfilesProvisioner, SitesProvisioner,
};
use crate::ProvisionError;
use cc_search_repository::types::{EntityRef, GroupStatus, Post, PostStatus, Site, SiteId};
use cc_search_repository::{
    EntitySource, IndexCall, InMemoryIndex, InMemoryNetwork, MetadataStore, SearchIndexClient,
    SiteContext, SEARCH_ID_META_KEY,
};

struct Installation {
    network: Arc<InMemoryNetwork>,
    index: InMemoryIndex,
    posts: Arc<PostsProvisioner>,
    bus: EventBus,
}

impl Installation {
    fn new() -> Self {
        let network = fixtures::network();
        let runtime = fixtures::runtime(&network);
        let index = InMemoryIndex::sequential();
        let client = Arc::new(SearchIndexClient::new(Box::new(index.clone())));

        let posts = Arc::new(PostsProvisioner::new(client.clone(), runtime.clone()));
        let mut bus = EventBus::new();
        bus.subscribe(posts.clone(), DEFAULT_PRIORITY);
        bus.subscribe(
            Arc::new(DiscussionsProvisioner::new(client.clone(), runtime.clone())),
            DEFAULT_PRIORITY,
        );
        bus.subscribe(
            Arc::new(GroupsProvisioner::new(client.clone(), runtime.clone())),
            DEFAULT_PRIORITY,
        );
        bus.subscribe(
            Arc::new(ProfilesProvisioner::new(client.clone(), runtime.clone())),
            DEFAULT_PRIORITY,
        );
        bus.subscribe(
            Arc::new(SitesProvisioner::new(client, runtime)),
            SITE_INIT_PRIORITY,
        );

        Self {
            network,
            index,
            posts,
            bus,
        }
    }

    async fn fire(&self, event: LifecycleEvent) {
        self.bus.dispatch(&event).await.unwrap();
    }

    async fn save_post(&self, post: &Post, update: bool) {
        self.network.upsert_post(post.clone()).unwrap();
        self.fire(LifecycleEvent::PostSaved {
            post: post.clone(),
            update,
        })
        .await;
    }

    fn search_id(&self, entity: EntityRef) -> Option<String> {
        self.network.get(entity, SEARCH_ID_META_KEY).unwrap()
    }

    fn set_site(&self, site_id: SiteId, change: impl FnOnce(&mut Site)) {
        let mut site = self.network.site(site_id).unwrap().unwrap();
        change(&mut site);
        self.network.upsert_site(site).unwrap();
    }
}

#[tokio::test]
async fn test_post_from_draft_to_trash() {
    let installation = Installation::new();
    let draft = fixtures::post(2, 42, "post", PostStatus::Draft);

    installation.save_post(&draft, false).await;
    assert!(installation.index.calls().await.is_empty());
    assert_eq!(installation.search_id(draft.handle()), None);

    let published = Post {
        status: PostStatus::Publish,
        ..draft.clone()
    };
    installation.save_post(&published, true).await;
    assert_eq!(
        installation.search_id(draft.handle()).as_deref(),
        Some("doc-1")
    );

    let retitled = Post {
        title: "Retitled".to_string(),
        ..published.clone()
    };
    installation.save_post(&retitled, true).await;
    assert_eq!(
        installation
            .index
            .document("doc-1")
            .await
            .map(|doc| doc.title),
        Some("Retitled".to_string())
    );
    assert_eq!(installation.index.len().await, 1);

    let trashed = Post {
        status: PostStatus::Trash,
        ..retitled
    };
    installation.save_post(&trashed, true).await;
    assert_eq!(installation.search_id(draft.handle()).as_deref(), Some(""));
    assert!(installation.index.is_empty().await);

    installation.index.clear_calls().await;
    installation
        .fire(LifecycleEvent::PostDeleting { post: trashed })
        .await;
    assert!(installation.index.calls().await.is_empty());
}

#[tokio::test]
async fn test_site_visibility_round_trip() {
    let installation = Installation::new();
    installation.network.upsert_site(fixtures::site(7)).unwrap();
    let handle = EntityRef::Site { site_id: 7 };

    installation
        .fire(LifecycleEvent::SiteInitialized {
            site: fixtures::site(7),
        })
        .await;
    assert_eq!(installation.search_id(handle).as_deref(), Some("doc-1"));

    for (old_value, new_value) in [("1", "-1"), ("-1", "abc")] {
        installation
            .fire(LifecycleEvent::SiteOptionUpdated {
                site_id: 7,
                option: VISIBILITY_OPTION.to_string(),
                old_value: old_value.to_string(),
                new_value: new_value.to_string(),
            })
            .await;
    }
    assert_eq!(
        installation.index.calls().await[1..],
        [IndexCall::Delete("doc-1".to_string())]
    );
    assert_eq!(installation.search_id(handle).as_deref(), Some(""));

    installation
        .fire(LifecycleEvent::SiteOptionUpdated {
            site_id: 7,
            option: VISIBILITY_OPTION.to_string(),
            old_value: "abc".to_string(),
            new_value: "1".to_string(),
        })
        .await;
    assert_eq!(installation.search_id(handle).as_deref(), Some("doc-2"));
    assert_eq!(installation.index.len().await, 1);
}

#[tokio::test]
async fn test_spam_cascade_removes_and_restores_site_content() {
    let installation = Installation::new();
    installation
        .save_post(&fixtures::post(2, 4, "forum", PostStatus::Publish), false)
        .await;
    installation
        .save_post(&fixtures::post(2, 5, "post", PostStatus::Publish), false)
        .await;
    installation
        .save_post(
            &fixtures::child(2, 6, "topic", PostStatus::Publish, 4),
            false,
        )
        .await;
    installation
        .fire(LifecycleEvent::SiteInitialized {
            site: fixtures::site(2),
        })
        .await;
    assert_eq!(installation.index.len().await, 3);

    installation.set_site(2, |site| site.spam = true);
    installation.index.clear_calls().await;
    installation
        .fire(LifecycleEvent::SiteSpammed { site_id: 2 })
        .await;

    let calls = installation.index.calls().await;
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], IndexCall::Delete("doc-3".to_string()));
    assert!(installation.index.is_empty().await);
    assert_eq!(installation.network.current_site(), 1);
    assert_eq!(installation.network.site_stack_depth(), 1);

    installation.set_site(2, |site| site.spam = false);
    installation
        .fire(LifecycleEvent::SiteUnspammed { site_id: 2 })
        .await;

    assert_eq!(installation.index.len().await, 3);
    assert_eq!(
        installation
            .search_id(EntityRef::Post {
                site_id: 2,
                post_id: 6
            })
            .as_deref(),
        Some("doc-5")
    );
}

#[tokio::test]
async fn test_deleting_site_removes_its_posts_before_the_site() {
    let installation = Installation::new();
    installation
        .save_post(&fixtures::post(2, 5, "page", PostStatus::Publish), false)
        .await;
    installation
        .fire(LifecycleEvent::SiteInitialized {
            site: fixtures::site(2),
        })
        .await;

    installation
        .fire(LifecycleEvent::SiteDeletionValidating {
            site: fixtures::site(2),
        })
        .await;
    installation
        .fire(LifecycleEvent::SiteDeleted {
            site: fixtures::site(2),
        })
        .await;

    assert!(installation.index.is_empty().await);
    assert_eq!(
        installation.index.calls().await[2..],
        [
            IndexCall::Delete("doc-1".to_string()),
            IndexCall::Delete("doc-2".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_disabled_posts_provisioner_ignores_saves() {
    let installation = Installation::new();
    let post = fixtures::post(1, 9, "post", PostStatus::Publish);

    installation.posts.disable();
    installation.save_post(&post, false).await;
    assert!(installation.index.calls().await.is_empty());

    installation.posts.enable();
    installation.save_post(&post, true).await;
    assert_eq!(
        installation.search_id(post.handle()).as_deref(),
        Some("doc-1")
    );
}

#[tokio::test]
async fn test_group_event_without_groups_component_stops_dispatch() {
    let installation = Installation::new();

    let result = installation
        .bus
        .dispatch(&LifecycleEvent::GroupSaved {
            group: fixtures::group(1, GroupStatus::Public),
        })
        .await;

    assert!(matches!(result, Err(ProvisionError::MissingDependency(_))));
}

#[tokio::test]
async fn test_replayed_json_events() {
    let installation = Installation::new();
    installation.network.upsert_user(fixtures::user(4)).unwrap();

    let lines = [
        r#"{"type":"user_saved","user_id":4,"origin":"registered"}"#,
        r#"{"type":"user_saved","user_id":4}"#,
        r#"{"type":"user_deleting","user_id":4}"#,
    ];
    for line in lines {
        let event: LifecycleEvent = serde_json::from_str(line).unwrap();
        installation.fire(event).await;
    }

    assert_eq!(
        installation.index.calls().await.len(),
        3,
        "index, update, delete"
    );
    assert_eq!(
        installation
            .search_id(EntityRef::User { user_id: 4 })
            .as_deref(),
        Some("")
    );
}
