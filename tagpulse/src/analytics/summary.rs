use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::models::{Comment, Post, User};

/// Maximum length of summarized content, marker included.
pub const SUMMARY_LENGTH: usize = 50;
const OMISSION: &str = "...";

/// Shortens `content` to at most [`SUMMARY_LENGTH`] characters, ending in
/// `...` when cut.
pub fn truncate(content: &str) -> String {
    if content.chars().count() <= SUMMARY_LENGTH {
        return content.to_string();
    }
    let keep = SUMMARY_LENGTH - OMISSION.len();
    let mut out: String = content.chars().take(keep).collect();
    out.push_str(OMISSION);
    out
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
    /// Author email.
    #[serde(rename = "user")]
    pub user_email: String,
}

impl PostSummary {
    pub fn new(post: &Post, authors: &HashMap<String, User>) -> Self {
        Self {
            id: post.id.clone(),
            content: truncate(&post.content),
            hashtags: post.hashtags.clone(),
            likes_count: post.likes_count,
            created_at: post.created_at,
            user_email: author_email(authors, &post.author_id),
        }
    }
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub id: String,
    pub content: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "user")]
    pub user_email: String,
}

impl CommentSummary {
    pub fn new(comment: &Comment, authors: &HashMap<String, User>) -> Self {
        Self {
            id: comment.id.clone(),
            content: truncate(&comment.content),
            post_id: comment.post_id.clone(),
            created_at: comment.created_at,
            user_email: author_email(authors, &comment.author_id),
        }
    }
}

fn author_email(authors: &HashMap<String, User>, author_id: &str) -> String {
    authors.get(author_id).map(|user| user.email.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate("hello #world"), "hello #world");
        let exact = "x".repeat(SUMMARY_LENGTH);
        assert_eq!(truncate(&exact), exact);
    }

    #[test]
    fn long_content_is_cut_with_marker() {
        let long = "a".repeat(80);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), SUMMARY_LENGTH);
        assert!(cut.ends_with("..."));
        assert!(cut.starts_with(&"a".repeat(47)));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(60);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), SUMMARY_LENGTH);
    }

    #[test]
    fn summaries_serialize_author_as_user() {
        let post = Post {
            id: "p1".to_string(),
            author_id: "u1".to_string(),
            content: "Hello #world".to_string(),
            sentiment_score: 0.0,
            sentiment_label: Default::default(),
            hashtags: vec!["world".to_string()],
            likes_count: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut authors = HashMap::new();
        authors.insert(
            "u1".to_string(),
            User {
                id: "u1".to_string(),
                email: "demo@example.com".to_string(),
                role: Default::default(),
                created_at: Utc::now(),
            },
        );
        let json = serde_json::to_value(PostSummary::new(&post, &authors)).unwrap();
        assert_eq!(json["user"], "demo@example.com");
        assert_eq!(json["likes_count"], 2);
        assert_eq!(json["hashtags"][0], "world");
    }
}
