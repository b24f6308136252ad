//! Write path for users, posts, comments and engagements, plus the feed.
//!
//! Posts and comments run through the tagging pipeline here, before the
//! store write; the store persists the result atomically.

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{
    analytics::Pagination,
    errors::{Error, Result, ValidationError},
    id::generate_id,
    models::{Comment, EngagementKind, EngagementOutcome, Post, Role, User, UserRef},
    realtime::{Broadcaster, CommentEvent},
    store::{PostWrite, Store, TimeWindow},
    tagging::{analyze, normalize_hashtag, score_sentiment},
};

pub const DEFAULT_FEED_PER_PAGE: u64 = 15;

/// A comment with its author.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: UserRef,
}

/// A post with its author and comments.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub user: UserRef,
    pub comments: Vec<CommentView>,
}

/// Restricts the feed to posts the viewer engaged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    Liked,
    Bookmarked,
}

impl FromStr for FeedFilter {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "liked" => Ok(FeedFilter::Liked),
            "bookmarked" => Ok(FeedFilter::Bookmarked),
            other => Err(ValidationError::single(
                "filter",
                "invalid_enum",
                format!("must be one of liked, bookmarked (got '{other}')"),
            )),
        }
    }
}

/// Feed parameters as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub per_page: Option<String>,
    #[serde(default)]
    pub hashtag: Option<String>,
    /// `liked` or `bookmarked`; anything else is ignored.
    #[serde(default)]
    pub filter: Option<String>,
}

impl FeedQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::parse(self.page.as_deref(), self.per_page.as_deref(), DEFAULT_FEED_PER_PAGE)
    }

    pub fn hashtag_filter(&self) -> Option<String> {
        self.hashtag.as_deref().and_then(normalize_hashtag)
    }

    pub fn engagement_filter(&self) -> Option<FeedFilter> {
        self.filter.as_deref().and_then(|raw| raw.parse().ok())
    }
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedComment {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
    pub likes_count: u64,
    pub liked_by_current_user: bool,
    pub bookmarked_by_current_user: bool,
    pub hashtags: Vec<String>,
    pub comments: Vec<FeedComment>,
}

pub struct ContentService<'a, S, B> {
    store: &'a S,
    broadcaster: &'a B,
}

impl<'a, S: Store, B: Broadcaster> ContentService<'a, S, B> {
    pub fn new(store: &'a S, broadcaster: &'a B) -> Self {
        Self { store, broadcaster }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Registers a user. Emails are validated and stored lowercase.
    pub async fn register_user(&self, email: &str, role: Role) -> Result<User> {
        let email = email.trim().to_lowercase();
        if !EmailAddress::is_valid(&email) {
            return Err(ValidationError::single("email", "invalid_email", "is invalid").into());
        }
        let user = self
            .store
            .insert_user(User {
                id: generate_id(),
                email,
                role,
                created_at: Utc::now(),
            })
            .await?;
        info!("registered {} user {}", user.role, user.email);
        Ok(user)
    }

    pub async fn find_user(&self, email: &str) -> Result<User> {
        self.store
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| Error::not_found("user", email.trim()))
    }

    pub async fn create_post(&self, author: &User, content: &str) -> Result<Post> {
        self.create_post_at(author, content, Utc::now()).await
    }

    /// Creates a post with an explicit creation time.
    pub async fn create_post_at(&self, author: &User, content: &str, created_at: DateTime<Utc>) -> Result<Post> {
        require_content(content)?;
        let tagged = analyze(content);
        debug!("tagged new post: {:?} {}", tagged.hashtags, tagged.sentiment.label);

        let post = self
            .store
            .save_post(PostWrite {
                id: generate_id(),
                author_id: author.id.clone(),
                content: content.to_string(),
                sentiment: tagged.sentiment,
                hashtags: tagged.hashtags,
                created_at,
                updated_at: created_at,
            })
            .await?;
        info!("created post {} by {}", post.id, author.email);
        Ok(post)
    }

    /// Replaces a post's content. Only the author may edit.
    ///
    /// Hashtags and sentiment are recomputed; links to tags no longer in the
    /// content are dropped.
    pub async fn update_post(&self, editor: &User, post_id: &str, content: &str) -> Result<Post> {
        require_content(content)?;
        let existing = self.require_post(post_id).await?;
        if existing.author_id != editor.id {
            return Err(Error::Forbidden {
                message: format!("{} may not edit post {post_id}", editor.email),
            });
        }

        let tagged = analyze(content);
        let post = self
            .store
            .save_post(PostWrite {
                id: existing.id,
                author_id: existing.author_id,
                content: content.to_string(),
                sentiment: tagged.sentiment,
                hashtags: tagged.hashtags,
                created_at: existing.created_at,
                updated_at: Utc::now(),
            })
            .await?;
        info!("updated post {}", post.id);
        Ok(post)
    }

    /// Deletes a post with everything hanging off it. Authors and admins only.
    pub async fn delete_post(&self, actor: &User, post_id: &str) -> Result<()> {
        let existing = self.require_post(post_id).await?;
        if existing.author_id != actor.id && !actor.is_admin() {
            return Err(Error::Forbidden {
                message: format!("{} may not delete post {post_id}", actor.email),
            });
        }
        if !self.store.delete_post(post_id).await? {
            return Err(Error::not_found("post", post_id));
        }
        info!("deleted post {post_id}");
        Ok(())
    }

    pub async fn get_post(&self, post_id: &str) -> Result<PostDetail> {
        let post = self.require_post(post_id).await?;
        let comments = self.store.comments_for_post(post_id).await?;

        let mut ids: Vec<String> = comments.iter().map(|comment| comment.author_id.clone()).collect();
        ids.push(post.author_id.clone());
        let authors = self.store.users_by_ids(&ids).await?;

        Ok(PostDetail {
            user: author_ref(&authors, &post.author_id),
            comments: comments
                .into_iter()
                .map(|comment| CommentView {
                    user: author_ref(&authors, &comment.author_id),
                    comment,
                })
                .collect(),
            post,
        })
    }

    pub async fn create_comment(&self, author: &User, post_id: &str, content: &str) -> Result<Comment> {
        self.create_comment_at(author, post_id, content, Utc::now()).await
    }

    /// Creates a comment and publishes one [`CommentEvent`] on the post's
    /// channel.
    ///
    /// The post is checked again inside the store write, so a comment never
    /// outlives a concurrent delete.
    pub async fn create_comment_at(
        &self,
        author: &User,
        post_id: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Comment> {
        require_content(content)?;
        self.require_post(post_id).await?;

        let sentiment = score_sentiment(content);
        let comment = self
            .store
            .save_comment(Comment {
                id: generate_id(),
                post_id: post_id.to_string(),
                author_id: author.id.clone(),
                content: content.to_string(),
                sentiment_score: sentiment.score,
                sentiment_label: sentiment.label,
                created_at,
                updated_at: created_at,
            })
            .await?;

        info!("created comment {} on post {post_id}", comment.id);
        self.announce(&CommentEvent::new(&comment, author)).await;
        Ok(comment)
    }

    /// Publishes a comment event. The comment is already stored, so delivery
    /// failures are logged rather than returned.
    async fn announce(&self, event: &CommentEvent) {
        let channel = event.channel();
        let published = match serde_json::to_value(event) {
            Ok(payload) => self.broadcaster.publish(&channel, &payload).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = published {
            warn!("comment {} stored but not announced on '{channel}': {err}", event.id);
        }
    }

    /// Comments on a post, oldest first, with their authors.
    pub async fn comments_for_post(&self, post_id: &str) -> Result<Vec<CommentView>> {
        self.require_post(post_id).await?;
        let comments = self.store.comments_for_post(post_id).await?;
        let ids: Vec<String> = comments.iter().map(|comment| comment.author_id.clone()).collect();
        let authors = self.store.users_by_ids(&ids).await?;
        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                user: author_ref(&authors, &comment.author_id),
                comment,
            })
            .collect())
    }

    pub async fn like(&self, user: &User, post_id: &str) -> Result<EngagementOutcome> {
        self.engage(EngagementKind::Like, user, post_id).await
    }

    pub async fn unlike(&self, user: &User, post_id: &str) -> Result<()> {
        self.disengage(EngagementKind::Like, user, post_id).await
    }

    pub async fn bookmark(&self, user: &User, post_id: &str) -> Result<EngagementOutcome> {
        self.engage(EngagementKind::Bookmark, user, post_id).await
    }

    pub async fn unbookmark(&self, user: &User, post_id: &str) -> Result<()> {
        self.disengage(EngagementKind::Bookmark, user, post_id).await
    }

    async fn engage(&self, kind: EngagementKind, user: &User, post_id: &str) -> Result<EngagementOutcome> {
        self.require_post(post_id).await?;
        let outcome = self.store.add_engagement(kind, &user.id, post_id).await?;
        debug!("{} {post_id} by {}: {outcome:?}", kind.entity(), user.id);
        Ok(outcome)
    }

    async fn disengage(&self, kind: EngagementKind, user: &User, post_id: &str) -> Result<()> {
        self.require_post(post_id).await?;
        if !self.store.remove_engagement(kind, &user.id, post_id).await? {
            return Err(Error::not_found(kind.entity(), format!("{}/{post_id}", user.id)));
        }
        debug!("removed {} {post_id} by {}", kind.entity(), user.id);
        Ok(())
    }

    /// Newest-first feed page.
    ///
    /// Engagement filters apply only when there is a viewer; without one the
    /// liked/bookmarked flags are all false.
    pub async fn feed(&self, viewer: Option<&User>, query: &FeedQuery) -> Result<Vec<FeedItem>> {
        let pagination = query.pagination();
        let mut posts = self.store.posts_in_window(&TimeWindow::all()).await?;
        posts.reverse();

        if let Some(name) = query.hashtag_filter() {
            let tagged = self.store.post_ids_for_hashtag(&name).await?;
            posts.retain(|post| tagged.contains(&post.id));
        }

        let (liked, bookmarked) = match viewer {
            Some(viewer) => (
                self.store.engaged_post_ids(EngagementKind::Like, &viewer.id).await?,
                self.store.engaged_post_ids(EngagementKind::Bookmark, &viewer.id).await?,
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        if viewer.is_some() {
            match query.engagement_filter() {
                Some(FeedFilter::Liked) => posts.retain(|post| liked.contains(&post.id)),
                Some(FeedFilter::Bookmarked) => posts.retain(|post| bookmarked.contains(&post.id)),
                None => {}
            }
        }

        let page = pagination.apply(posts);
        let mut comments_by_post = HashMap::with_capacity(page.len());
        let mut author_ids: Vec<String> = page.iter().map(|post| post.author_id.clone()).collect();
        for post in &page {
            let comments = self.store.comments_for_post(&post.id).await?;
            author_ids.extend(comments.iter().map(|comment| comment.author_id.clone()));
            comments_by_post.insert(post.id.clone(), comments);
        }
        let authors = self.store.users_by_ids(&author_ids).await?;

        Ok(page
            .into_iter()
            .map(|post| {
                let comments = comments_by_post
                    .remove(&post.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|comment| FeedComment {
                        user: author_ref(&authors, &comment.author_id),
                        id: comment.id,
                        content: comment.content,
                        created_at: comment.created_at,
                    })
                    .collect();
                FeedItem {
                    user: author_ref(&authors, &post.author_id),
                    liked_by_current_user: liked.contains(&post.id),
                    bookmarked_by_current_user: bookmarked.contains(&post.id),
                    id: post.id,
                    content: post.content,
                    created_at: post.created_at,
                    likes_count: post.likes_count,
                    hashtags: post.hashtags,
                    comments,
                }
            })
            .collect())
    }

    async fn require_post(&self, post_id: &str) -> Result<Post> {
        self.store
            .get_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found("post", post_id))
    }
}

fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(ValidationError::single("content", "blank", "can't be blank").into());
    }
    Ok(())
}

fn author_ref(authors: &HashMap<String, User>, author_id: &str) -> UserRef {
    authors.get(author_id).map(UserRef::from).unwrap_or_else(|| UserRef {
        id: author_id.to_string(),
        email: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_query_defaults_to_fifteen_per_page() {
        let query = FeedQuery::default();
        assert_eq!(query.pagination(), Pagination::new(1, DEFAULT_FEED_PER_PAGE));
        assert_eq!(query.engagement_filter(), None);
    }

    #[test]
    fn feed_query_parses_filter_and_hashtag() {
        let query = FeedQuery {
            hashtag: Some("#Rails".to_string()),
            filter: Some("Bookmarked".to_string()),
            ..FeedQuery::default()
        };
        assert_eq!(query.hashtag_filter().as_deref(), Some("rails"));
        assert_eq!(query.engagement_filter(), Some(FeedFilter::Bookmarked));

        let unknown = FeedQuery {
            filter: Some("popular".to_string()),
            ..FeedQuery::default()
        };
        assert_eq!(unknown.engagement_filter(), None);
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = require_content("   \n").unwrap_err();
        assert!(err.is_validation());
        assert!(require_content("hi").is_ok());
    }

    #[test]
    fn missing_author_falls_back_to_id() {
        let user = author_ref(&HashMap::new(), "ghost");
        assert_eq!(user.id, "ghost");
        assert!(user.email.is_empty());
    }
}
