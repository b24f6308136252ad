//! tagpulse core library.
//!
//! Hashtag extraction and sentiment tagging on the content write path, and an
//! analytics engine that aggregates persisted posts and comments into daily
//! series, top-hashtag rankings and paginated listings. Storage sits behind
//! the [`Store`] trait (in-memory or Redis); comment fan-out behind
//! [`Broadcaster`].

pub mod analytics;
pub mod content;
pub mod errors;
pub mod id;
pub mod keys;
pub mod models;
pub mod realtime;
pub mod runtime;
pub mod seed;
pub mod store;
pub mod tagging;

pub use analytics::{AnalyticsConfig, AnalyticsEngine, AnalyticsQuery, ContentKind, Overview, Paginated, Scope, Snapshot};
pub use content::{ContentService, FeedFilter, FeedItem, FeedQuery, PostDetail};
pub use errors::{Error, Result, ValidationError, ValidationIssue};
pub use models::{Comment, EngagementKind, EngagementOutcome, Hashtag, Post, Role, SentimentLabel, User, UserRef};
pub use realtime::{Broadcaster, ChannelHub, CommentEvent, RedisPublisher};
pub use store::{MemoryStore, RedisStore, Store, TimeWindow};
pub use tagging::{Sentiment, TaggedContent, analyze, extract_hashtags, score_sentiment};
