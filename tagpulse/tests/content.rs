//! Write-path tests over the in-memory store: tagging on save, comment
//! events, ownership rules, engagements and the feed.

use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tagpulse::{
    Broadcaster, ChannelHub, ContentService, EngagementKind, EngagementOutcome, Error, FeedQuery, MemoryStore, Role,
    SentimentLabel, Store, TimeWindow, User, realtime::comment_channel,
};

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    store: MemoryStore,
    hub: ChannelHub,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            hub: ChannelHub::new(),
        }
    }

    fn content(&self) -> ContentService<'_, MemoryStore, ChannelHub> {
        ContentService::new(&self.store, &self.hub)
    }

    async fn user(&self, email: &str, role: Role) -> User {
        self.content().register_user(email, role).await.expect("register user")
    }
}

// ============================================================================
// Tagging on save
// ============================================================================

#[tokio::test]
async fn post_links_each_hashtag_once() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;

    let post = fx
        .content()
        .create_post(&alice, "Hello #world, writing some #ruby and more #Ruby")
        .await
        .unwrap();

    assert_eq!(post.hashtags, vec!["world".to_string(), "ruby".to_string()]);
    assert_eq!(fx.store.hashtag_count().await.unwrap(), 2);
    assert!(fx.store.post_ids_for_hashtag("world").await.unwrap().contains(&post.id));
    assert!(fx.store.post_ids_for_hashtag("ruby").await.unwrap().contains(&post.id));
}

#[tokio::test]
async fn resaving_same_content_creates_no_duplicates() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let content = "Hello #world from #ruby";

    let post = fx.content().create_post(&alice, content).await.unwrap();
    let updated = fx.content().update_post(&alice, &post.id, content).await.unwrap();
    fx.content().create_post(&alice, content).await.unwrap();

    assert_eq!(updated.hashtags, post.hashtags);
    assert_eq!(fx.store.hashtag_count().await.unwrap(), 2);
    assert_eq!(fx.store.post_ids_for_hashtag("world").await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_drops_stale_links_but_keeps_hashtag_rows() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;

    let post = fx.content().create_post(&alice, "#rails all day").await.unwrap();
    let updated = fx.content().update_post(&alice, &post.id, "#docker now").await.unwrap();

    assert_eq!(updated.hashtags, vec!["docker".to_string()]);
    assert!(fx.store.post_ids_for_hashtag("rails").await.unwrap().is_empty());
    assert_eq!(fx.store.hashtag_count().await.unwrap(), 2);
    assert_eq!(updated.created_at, post.created_at);
}

#[tokio::test]
async fn sentiment_is_persisted_with_the_post() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;

    let happy = fx
        .content()
        .create_post(&alice, "Rails is amazing and I love it")
        .await
        .unwrap();
    let grumpy = fx
        .content()
        .create_post(&alice, "This error is terrible and awful")
        .await
        .unwrap();
    let plain = fx.content().create_post(&alice, "This is a post").await.unwrap();

    assert_eq!(happy.sentiment_label, SentimentLabel::Positive);
    assert!(happy.sentiment_score > 0.0);
    assert_eq!(grumpy.sentiment_label, SentimentLabel::Negative);
    assert!(grumpy.sentiment_score < 0.0);
    assert_eq!(plain.sentiment_label, SentimentLabel::Neutral);
    assert_eq!(plain.sentiment_score, 0.0);

    let stored = fx.store.get_post(&happy.id).await.unwrap().unwrap();
    assert_eq!(stored.sentiment_score, happy.sentiment_score);
}

#[tokio::test]
async fn blank_post_is_rejected_before_any_write() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;

    let err = fx.content().create_post(&alice, "   ").await.unwrap_err();

    assert!(err.is_validation());
    assert!(fx.content().feed(None, &FeedQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_saves_share_one_hashtag_row() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;
    let content = fx.content();

    let (first, second, third) = tokio::join!(
        content.create_post(&alice, "first #fresh"),
        content.create_post(&bob, "second #Fresh"),
        fx.store.find_or_create_hashtag("fresh"),
    );
    first.unwrap();
    second.unwrap();
    third.unwrap();

    assert_eq!(fx.store.hashtag_count().await.unwrap(), 1);
    assert_eq!(fx.store.post_ids_for_hashtag("fresh").await.unwrap().len(), 2);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn emails_are_unique_ignoring_case() {
    let fx = Fixture::new();
    fx.user("Alice@Example.com", Role::User).await;

    let err = fx
        .content()
        .register_user("alice@example.com", Role::Admin)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let found = fx.content().find_user("ALICE@example.com").await.unwrap();
    assert_eq!(found.email, "alice@example.com");
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let fx = Fixture::new();
    let err = fx.content().register_user("not-an-email", Role::User).await.unwrap_err();
    assert!(err.is_validation());
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn only_author_may_edit() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let admin = fx.user("admin@example.com", Role::Admin).await;
    let post = fx.content().create_post(&alice, "mine #only").await.unwrap();

    let err = fx.content().update_post(&admin, &post.id, "hijacked").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn author_or_admin_may_delete() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;
    let admin = fx.user("admin@example.com", Role::Admin).await;

    let post = fx.content().create_post(&alice, "going away #soon").await.unwrap();
    fx.content().create_comment(&bob, &post.id, "bye").await.unwrap();
    fx.content().like(&bob, &post.id).await.unwrap();

    let err = fx.content().delete_post(&bob, &post.id).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));

    fx.content().delete_post(&admin, &post.id).await.unwrap();
    assert!(fx.content().get_post(&post.id).await.unwrap_err().is_not_found());
    assert!(fx.store.post_ids_for_hashtag("soon").await.unwrap().is_empty());
    assert!(fx.store.engaged_post_ids(EngagementKind::Like, &bob.id).await.unwrap().is_empty());
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn comment_publishes_exactly_one_event() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;
    let post = fx.content().create_post(&alice, "discuss #here").await.unwrap();

    let mut receiver = fx.hub.subscribe(&comment_channel(&post.id));
    let comment = fx.content().create_comment(&bob, &post.id, "This is great").await.unwrap();

    let event: Value = receiver.recv().await.unwrap();
    assert_eq!(event["id"], comment.id);
    assert_eq!(event["post_id"], post.id);
    assert_eq!(event["content"], "This is great");
    assert_eq!(event["user"]["email"], "bob@example.com");
    assert_eq!(event["sentiment_label"], "neutral");
    assert!(event.get("created_at").is_some());
    assert!(receiver.try_recv().is_err());
}

/// Transport that rejects every publish.
struct OfflineBroadcaster;

impl Broadcaster for OfflineBroadcaster {
    async fn publish(&self, _channel: &str, _payload: &Value) -> tagpulse::Result<()> {
        Err(Error::Other {
            message: "transport unavailable".into(),
        })
    }
}

#[tokio::test]
async fn comment_is_kept_when_delivery_fails() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let post = fx.content().create_post(&alice, "offline #here").await.unwrap();

    let offline = ContentService::new(&fx.store, &OfflineBroadcaster);
    let comment = offline.create_comment(&alice, &post.id, "still saved").await.unwrap();

    let stored = fx.store.comments_for_post(&post.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, comment.id);
}

#[tokio::test]
async fn comment_after_post_deletion_is_not_stored() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let post = fx.content().create_post(&alice, "short lived").await.unwrap();
    fx.content().delete_post(&alice, &post.id).await.unwrap();

    let err = fx.content().create_comment(&alice, &post.id, "too late").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(fx.store.comments_in_window(&TimeWindow::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;

    let err = fx.content().create_comment(&alice, "nope", "hello").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn comments_list_oldest_first_with_authors() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;
    let post = fx.content().create_post(&alice, "thread").await.unwrap();
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();

    fx.content()
        .create_comment_at(&bob, &post.id, "second", base + Duration::minutes(5))
        .await
        .unwrap();
    fx.content()
        .create_comment_at(&alice, &post.id, "first", base)
        .await
        .unwrap();

    let comments = fx.content().comments_for_post(&post.id).await.unwrap();
    let texts: Vec<&str> = comments.iter().map(|view| view.comment.content.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(comments[1].user.email, "bob@example.com");

    let detail = fx.content().get_post(&post.id).await.unwrap();
    assert_eq!(detail.user.email, "alice@example.com");
    assert_eq!(detail.comments.len(), 2);
}

// ============================================================================
// Engagements
// ============================================================================

#[tokio::test]
async fn duplicate_like_is_a_no_op() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;
    let post = fx.content().create_post(&alice, "like me").await.unwrap();

    assert_eq!(fx.content().like(&bob, &post.id).await.unwrap(), EngagementOutcome::Created);
    assert_eq!(
        fx.content().like(&bob, &post.id).await.unwrap(),
        EngagementOutcome::AlreadyPresent
    );
    assert_eq!(fx.store.get_post(&post.id).await.unwrap().unwrap().likes_count, 1);

    fx.content().unlike(&bob, &post.id).await.unwrap();
    assert_eq!(fx.store.get_post(&post.id).await.unwrap().unwrap().likes_count, 0);
    assert!(fx.content().unlike(&bob, &post.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn bookmark_requires_existing_post() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;

    assert!(fx.content().bookmark(&alice, "missing").await.unwrap_err().is_not_found());
    assert!(fx.content().unbookmark(&alice, "missing").await.unwrap_err().is_not_found());
}

// ============================================================================
// Feed
// ============================================================================

#[tokio::test]
async fn feed_is_newest_first_with_viewer_flags() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();

    let older = fx
        .content()
        .create_post_at(&alice, "older #rails", base)
        .await
        .unwrap();
    let newer = fx
        .content()
        .create_post_at(&alice, "newer #docker", base + Duration::hours(1))
        .await
        .unwrap();
    fx.content().like(&bob, &older.id).await.unwrap();
    fx.content().bookmark(&bob, &newer.id).await.unwrap();

    let feed = fx.content().feed(Some(&bob), &FeedQuery::default()).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].id, newer.id);
    assert!(feed[0].bookmarked_by_current_user);
    assert!(!feed[0].liked_by_current_user);
    assert!(feed[1].liked_by_current_user);
    assert_eq!(feed[1].likes_count, 1);

    let anonymous = fx.content().feed(None, &FeedQuery::default()).await.unwrap();
    assert!(anonymous.iter().all(|item| !item.liked_by_current_user));
}

#[tokio::test]
async fn feed_filters_by_hashtag_and_engagement() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    let bob = fx.user("bob@example.com", Role::User).await;

    let rails = fx.content().create_post(&alice, "about #Rails").await.unwrap();
    let docker = fx.content().create_post(&alice, "about #docker").await.unwrap();
    fx.content().like(&bob, &docker.id).await.unwrap();

    let tagged = fx
        .content()
        .feed(
            Some(&bob),
            &FeedQuery {
                hashtag: Some("rails".to_string()),
                ..FeedQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, rails.id);

    let liked_query = FeedQuery {
        filter: Some("liked".to_string()),
        ..FeedQuery::default()
    };
    let liked = fx.content().feed(Some(&bob), &liked_query).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, docker.id);

    let ignored = fx.content().feed(None, &liked_query).await.unwrap();
    assert_eq!(ignored.len(), 2);
}

#[tokio::test]
async fn feed_pages_hold_fifteen_posts() {
    let fx = Fixture::new();
    let alice = fx.user("alice@example.com", Role::User).await;
    for index in 0..20 {
        fx.content().create_post(&alice, &format!("post {index}")).await.unwrap();
    }

    let first = fx.content().feed(None, &FeedQuery::default()).await.unwrap();
    let second = fx
        .content()
        .feed(
            None,
            &FeedQuery {
                page: Some("2".to_string()),
                ..FeedQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first.len(), 15);
    assert_eq!(second.len(), 5);
}
