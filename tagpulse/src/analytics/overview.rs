use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use super::{AnalyticsEngine, AnalyticsQuery, CommentSummary, DateRange, PageMeta, Pagination, PostSummary, Scope};
use crate::{
    errors::Result,
    models::{Comment, Post, User},
    store::Store,
};

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub posts: u64,
    pub comments: u64,
    /// Every hashtag ever created; neither scoped nor filtered.
    pub hashtags: u64,
}

/// Activity on one calendar day.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub posts: u64,
    pub comments: u64,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagCount {
    pub name: String,
    pub count: u64,
}

/// Dashboard payload for one viewer and date range.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub totals: Totals,
    pub daily_stats: Vec<DailyStat>,
    pub top_hashtags: Vec<HashtagCount>,
    pub posts: Vec<PostSummary>,
    pub comments: Vec<CommentSummary>,
    pub posts_meta: PageMeta,
    pub comments_meta: PageMeta,
}

impl<S: Store> AnalyticsEngine<'_, S> {
    /// Computes the dashboard for `viewer`.
    ///
    /// Dates are validated before the store is touched. The listings hold the
    /// first page (newest first) and their meta uses the same page size.
    pub async fn compute_overview(&self, viewer: &User, query: &AnalyticsQuery) -> Result<Overview> {
        let range = self.resolve_range(query)?;
        let scope = Scope::for_viewer(viewer);
        let hashtag = query.hashtag_filter();
        debug!(
            "overview for {} ({:?}) {}..={} hashtag={:?}",
            viewer.id,
            scope,
            range.start(),
            range.end(),
            hashtag
        );

        let window = range.window();
        let tagged = self.hashtag_post_ids(hashtag.as_deref()).await?;
        let posts = self.scoped_posts(&scope, &window, tagged.as_ref()).await?;
        let comments = self.scoped_comments(&scope, &window, tagged.as_ref()).await?;

        let page = Pagination::new(1, self.config.overview_page_size);
        let post_total = posts.len() as u64;
        let comment_total = comments.len() as u64;

        Ok(Overview {
            totals: Totals {
                posts: post_total,
                comments: comment_total,
                hashtags: self.store.hashtag_count().await?,
            },
            daily_stats: daily_series(&range, &posts, &comments),
            top_hashtags: self.top_hashtags(&window).await?,
            posts: self.post_summaries(&page.apply(posts)).await?,
            comments: self.comment_summaries(&page.apply(comments)).await?,
            posts_meta: page.meta(post_total),
            comments_meta: page.meta(comment_total),
        })
    }
}

/// One entry per day of `range`, ascending, zero-filled, bucketed by the UTC
/// date of `created_at`.
pub(crate) fn daily_series(range: &DateRange, posts: &[Post], comments: &[Comment]) -> Vec<DailyStat> {
    let mut buckets: BTreeMap<NaiveDate, (u64, u64)> = range.days().map(|day| (day, (0, 0))).collect();
    for post in posts {
        if let Some(bucket) = buckets.get_mut(&post.created_at.date_naive()) {
            bucket.0 += 1;
        }
    }
    for comment in comments {
        if let Some(bucket) = buckets.get_mut(&comment.created_at.date_naive()) {
            bucket.1 += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(date, (posts, comments))| DailyStat { date, posts, comments })
        .collect()
}

/// Counts linked posts per hashtag; count descending, then name ascending.
pub(crate) fn rank_hashtags(posts: &[Post], limit: usize) -> Vec<HashtagCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for post in posts {
        for name in &post.hashtags {
            *counts.entry(name.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<HashtagCount> = counts
        .into_iter()
        .map(|(name, count)| HashtagCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}
