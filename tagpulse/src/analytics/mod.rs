//! Analytics aggregation engine.
//!
//! Everything is computed on demand from persisted posts and comments:
//! totals, a dense daily series, top hashtags and paginated listings over an
//! inclusive date range. What a viewer sees is decided once by [`Scope`].

mod overview;
mod paginate;
mod params;
mod scope;
mod snapshot;
mod summary;

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use overview::{DailyStat, HashtagCount, Overview, Totals};
pub use paginate::{ContentKind, PageResult, Paginated};
pub use params::{AnalyticsQuery, DEFAULT_PER_PAGE, DateRange, PageMeta, Pagination};
pub use scope::Scope;
pub use snapshot::{DailyPosts, Snapshot};
pub use summary::{CommentSummary, PostSummary, SUMMARY_LENGTH, truncate};

use crate::{
    errors::Result,
    models::{Comment, Post, User},
    store::{Store, TimeWindow},
};

/// Tunables for the engine; see `[analytics]` in `tagpulse.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Days before today covered when `start_date` is omitted.
    pub default_range_days: u64,
    /// Page size of the overview listings and of their meta.
    pub overview_page_size: u64,
    pub top_hashtags: usize,
    /// Days in the snapshot series, today included.
    pub snapshot_days: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_range_days: 30,
            overview_page_size: DEFAULT_PER_PAGE,
            top_hashtags: 5,
            snapshot_days: 7,
        }
    }
}

pub struct AnalyticsEngine<'a, S> {
    store: &'a S,
    config: AnalyticsConfig,
    today: NaiveDate,
}

impl<'a, S: Store> AnalyticsEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            config: AnalyticsConfig::default(),
            today: Utc::now().date_naive(),
        }
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Pins "today" (UTC) used for default ranges and the snapshot.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn resolve_range(&self, query: &AnalyticsQuery) -> Result<DateRange> {
        Ok(DateRange::resolve(
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            self.today,
            self.config.default_range_days,
        )?)
    }

    /// Ids of posts linked to `hashtag`, or `None` when unfiltered.
    async fn hashtag_post_ids(&self, hashtag: Option<&str>) -> Result<Option<HashSet<String>>> {
        match hashtag {
            Some(name) => Ok(Some(self.store.post_ids_for_hashtag(name).await?)),
            None => Ok(None),
        }
    }

    /// Scoped, filtered posts in `window`, newest first.
    async fn scoped_posts(
        &self,
        scope: &Scope,
        window: &TimeWindow,
        tagged: Option<&HashSet<String>>,
    ) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .store
            .posts_in_window(window)
            .await?
            .into_iter()
            .filter(|post| scope.includes_post(post))
            .filter(|post| tagged.is_none_or(|ids| ids.contains(&post.id)))
            .collect();
        posts.reverse();
        Ok(posts)
    }

    /// Scoped comments in `window`, newest first. With a hashtag filter only
    /// comments whose parent post carries the tag are kept.
    async fn scoped_comments(
        &self,
        scope: &Scope,
        window: &TimeWindow,
        tagged: Option<&HashSet<String>>,
    ) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .store
            .comments_in_window(window)
            .await?
            .into_iter()
            .filter(|comment| scope.includes_comment(comment))
            .filter(|comment| tagged.is_none_or(|ids| ids.contains(&comment.post_id)))
            .collect();
        comments.reverse();
        Ok(comments)
    }

    /// Hashtags ranked by the number of linked posts in `window`.
    async fn top_hashtags(&self, window: &TimeWindow) -> Result<Vec<HashtagCount>> {
        let posts = self.store.posts_in_window(window).await?;
        Ok(overview::rank_hashtags(&posts, self.config.top_hashtags))
    }

    async fn authors<'i>(&self, author_ids: impl Iterator<Item = &'i str>) -> Result<HashMap<String, User>> {
        let ids: Vec<String> = author_ids
            .collect::<HashSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.store.users_by_ids(&ids).await
    }

    async fn post_summaries(&self, posts: &[Post]) -> Result<Vec<PostSummary>> {
        let authors = self.authors(posts.iter().map(|post| post.author_id.as_str())).await?;
        Ok(posts.iter().map(|post| PostSummary::new(post, &authors)).collect())
    }

    async fn comment_summaries(&self, comments: &[Comment]) -> Result<Vec<CommentSummary>> {
        let authors = self.authors(comments.iter().map(|comment| comment.author_id.as_str())).await?;
        Ok(comments.iter().map(|comment| CommentSummary::new(comment, &authors)).collect())
    }
}
