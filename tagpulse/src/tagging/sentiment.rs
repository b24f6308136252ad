use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::models::SentimentLabel;

const POSITIVE_MARKERS: &[&str] = &[
    "good", "great", "awesome", "amazing", "love", "like", "best", "happy", "excellent",
];
const NEGATIVE_MARKERS: &[&str] = &["bad", "terrible", "awful", "hate", "dislike", "worst", "sad", "poor"];

/// Raw marker tallies are clamped to `[-SCORE_SPAN, SCORE_SPAN]` before scaling.
const SCORE_SPAN: i32 = 5;
const POSITIVE_THRESHOLD: f64 = 0.3;
const NEGATIVE_THRESHOLD: f64 = -0.3;

/// Keyword-derived polarity of a piece of text.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// In `[-1.0, 1.0]`.
    pub score: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    pub const NEUTRAL: Sentiment = Sentiment {
        score: 0.0,
        label: SentimentLabel::Neutral,
    };

    /// Builds a sentiment from a score, deriving the label.
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            label: label_for(score),
        }
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Scores text by counting exact positive and negative marker words.
///
/// Tokens are whitespace-separated and lowercased; punctuation stays attached,
/// so `"great!"` is not a marker. Blank text is neutral.
pub fn score_sentiment(text: &str) -> Sentiment {
    if text.trim().is_empty() {
        return Sentiment::NEUTRAL;
    }

    let normalized = text.to_lowercase();
    let tally: i32 = normalized
        .split_whitespace()
        .map(|token| {
            if POSITIVE_MARKERS.contains(&token) {
                1
            } else if NEGATIVE_MARKERS.contains(&token) {
                -1
            } else {
                0
            }
        })
        .sum();

    let clamped = tally.clamp(-SCORE_SPAN, SCORE_SPAN);
    Sentiment::from_score(f64::from(clamped) / f64::from(SCORE_SPAN))
}

pub fn label_for(score: f64) -> SentimentLabel {
    if score > POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if score < NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}
