//! Content tagging pipeline.
//!
//! Derives the hashtag names and the sentiment signal persisted alongside a
//! post or comment. Everything here is pure and total over its input: any
//! failure on the save path comes from the store, never from tagging.

mod hashtags;
mod sentiment;

pub use hashtags::{extract_hashtags, normalize_hashtag};
pub use sentiment::{Sentiment, label_for, score_sentiment};

/// Derived fields for one piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedContent {
    pub hashtags: Vec<String>,
    pub sentiment: Sentiment,
}

/// Runs hashtag extraction and sentiment scoring over `text`.
pub fn analyze(text: &str) -> TaggedContent {
    TaggedContent {
        hashtags: extract_hashtags(text),
        sentiment: score_sentiment(text),
    }
}
