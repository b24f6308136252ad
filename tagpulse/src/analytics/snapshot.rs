use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use super::{AnalyticsEngine, DateRange, HashtagCount, overview::daily_series};
use crate::{errors::Result, store::Store, store::TimeWindow};

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPosts {
    pub date: NaiveDate,
    pub count: u64,
}

/// Lightweight, unscoped dashboard widget.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub daily_posts: Vec<DailyPosts>,
    pub top_hashtags: Vec<HashtagCount>,
}

impl<S: Store> AnalyticsEngine<'_, S> {
    /// Posts per day over the trailing `snapshot_days` (today included) and
    /// the top hashtags across all time.
    pub async fn compute_global_snapshot(&self) -> Result<Snapshot> {
        let range = DateRange::trailing(self.today, self.config.snapshot_days);
        let posts = self.store.posts_in_window(&range.window()).await?;
        let daily_posts = daily_series(&range, &posts, &[])
            .into_iter()
            .map(|stat| DailyPosts {
                date: stat.date,
                count: stat.posts,
            })
            .collect();

        Ok(Snapshot {
            daily_posts,
            top_hashtags: self.top_hashtags(&TimeWindow::all()).await?,
        })
    }
}
