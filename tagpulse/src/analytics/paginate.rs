use log::debug;
use serde::{Deserialize, Serialize};

use super::{AnalyticsEngine, AnalyticsQuery, CommentSummary, PageMeta, PostSummary, Scope};
use crate::{errors::Result, models::User, store::Store};

/// Which population a paginated listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Posts,
    Comments,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// A page of either listing; serializes as `{data, meta}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Paginated {
    Posts(PageResult<PostSummary>),
    Comments(PageResult<CommentSummary>),
}

impl Paginated {
    pub fn meta(&self) -> &PageMeta {
        match self {
            Paginated::Posts(page) => &page.meta,
            Paginated::Comments(page) => &page.meta,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Paginated::Posts(page) => page.data.len(),
            Paginated::Comments(page) => page.data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Store> AnalyticsEngine<'_, S> {
    /// One page of the scoped, filtered `kind` listing, newest first.
    ///
    /// A page past the end yields empty `data` with accurate meta.
    pub async fn compute_paginated(&self, viewer: &User, kind: ContentKind, query: &AnalyticsQuery) -> Result<Paginated> {
        let range = self.resolve_range(query)?;
        let pagination = query.pagination();
        let scope = Scope::for_viewer(viewer);
        let hashtag = query.hashtag_filter();
        debug!(
            "{kind:?} page {} (per {}) for {} {}..={}",
            pagination.page,
            pagination.per_page,
            viewer.id,
            range.start(),
            range.end()
        );

        let window = range.window();
        let tagged = self.hashtag_post_ids(hashtag.as_deref()).await?;

        match kind {
            ContentKind::Posts => {
                let posts = self.scoped_posts(&scope, &window, tagged.as_ref()).await?;
                let meta = pagination.meta(posts.len() as u64);
                let data = self.post_summaries(&pagination.apply(posts)).await?;
                Ok(Paginated::Posts(PageResult { data, meta }))
            }
            ContentKind::Comments => {
                let comments = self.scoped_comments(&scope, &window, tagged.as_ref()).await?;
                let meta = pagination.meta(comments.len() as u64);
                let data = self.comment_summaries(&pagination.apply(comments)).await?;
                Ok(Paginated::Comments(PageResult { data, meta }))
            }
        }
    }
}
