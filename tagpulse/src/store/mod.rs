//! Persistence boundary.
//!
//! The [`Store`] trait is everything the tagging pipeline and the analytics
//! engine need from storage. Each write method is atomic: a post, its
//! sentiment fields and its hashtag links land together or not at all, and
//! hashtag find-or-create never yields two rows with the same name.

mod memory;
mod redis_store;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use crate::{
    errors::Result,
    models::{Comment, EngagementKind, EngagementOutcome, Hashtag, Post, User},
    tagging::Sentiment,
};

/// Inclusive `created_at` window; `None` bounds are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }
}

/// Everything needed to persist a post in one atomic write.
#[derive(Debug, Clone)]
pub struct PostWrite {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub sentiment: Sentiment,
    /// Normalized, deduplicated names; the stored link set is made to match.
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostWrite {
    pub(crate) fn into_post(self, likes_count: u64) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            content: self.content,
            sentiment_score: self.sentiment.score,
            sentiment_label: self.sentiment.label,
            hashtags: self.hashtags,
            likes_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Result of a find-or-create; tells whether the record already existed.
#[derive(Debug, Clone, PartialEq)]
pub enum GetOrCreate<T> {
    Created(T),
    Found(T),
}

impl<T> GetOrCreate<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(record) => record,
            Self::Found(record) => record,
        }
    }

    pub fn as_inner(&self) -> &T {
        match self {
            Self::Created(record) => record,
            Self::Found(record) => record,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[allow(async_fn_in_trait)]
pub trait Store {
    /// Inserts a user; a taken email (case-insensitive) is a validation error.
    async fn insert_user(&self, user: User) -> Result<User>;

    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Missing ids are skipped.
    async fn users_by_ids(&self, ids: &[String]) -> Result<HashMap<String, User>>;

    /// Atomically returns the hashtag named `name`, creating it if absent.
    async fn find_or_create_hashtag(&self, name: &str) -> Result<GetOrCreate<Hashtag>>;

    async fn hashtag_count(&self) -> Result<u64>;

    /// Creates or replaces a post together with its hashtag links.
    ///
    /// Hashtags are resolved with find-or-create inside the same atomic write;
    /// links no longer present in `post.hashtags` are removed. The like count
    /// of an existing post is preserved.
    async fn save_post(&self, post: PostWrite) -> Result<Post>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>>;

    /// Deletes a post with its comments, hashtag links and engagements.
    /// Returns `false` when the post did not exist.
    async fn delete_post(&self, id: &str) -> Result<bool>;

    /// Posts whose `created_at` falls in `window`, oldest first.
    async fn posts_in_window(&self, window: &TimeWindow) -> Result<Vec<Post>>;

    /// Ids of every post linked to the hashtag `name` (already normalized).
    async fn post_ids_for_hashtag(&self, name: &str) -> Result<HashSet<String>>;

    /// Stores a comment in the same atomic step that checks its post still
    /// exists; a missing post is `NotFound`.
    async fn save_comment(&self, comment: Comment) -> Result<Comment>;

    /// Comments on a post, oldest first.
    async fn comments_for_post(&self, post_id: &str) -> Result<Vec<Comment>>;

    /// Comments whose `created_at` falls in `window`, oldest first.
    async fn comments_in_window(&self, window: &TimeWindow) -> Result<Vec<Comment>>;

    async fn add_engagement(&self, kind: EngagementKind, user_id: &str, post_id: &str) -> Result<EngagementOutcome>;

    /// Returns `false` when there was nothing to remove.
    async fn remove_engagement(&self, kind: EngagementKind, user_id: &str, post_id: &str) -> Result<bool>;

    async fn engaged_post_ids(&self, kind: EngagementKind, user_id: &str) -> Result<HashSet<String>>;

    /// Removes every record owned by this store.
    async fn purge(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);
        let window = TimeWindow::between(start, end);
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + Duration::milliseconds(1)));
        assert!(!window.contains(start - Duration::milliseconds(1)));
        assert!(TimeWindow::all().contains(start));
    }

    #[test]
    fn get_or_create_reports_branch() {
        let created = GetOrCreate::Created(1);
        assert!(created.was_created());
        assert_eq!(*created.as_inner(), 1);
        let found = GetOrCreate::Found(2);
        assert!(!found.was_created());
        assert_eq!(found.into_inner(), 2);
    }
}
