//! Comment fan-out.
//!
//! The content service emits one [`CommentEvent`] per created comment through
//! a [`Broadcaster`]. Delivery, ordering across subscribers and reconnection
//! belong to the transport.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use log::debug;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    errors::Result,
    keys::KeyContext,
    models::{Comment, SentimentLabel, User, UserRef},
};

const HUB_CAPACITY: usize = 64;

/// Channel key subscribers of a post listen on.
pub fn comment_channel(post_id: &str) -> String {
    format!("comments:{post_id}")
}

/// Payload published when a comment is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CommentEvent {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserRef,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

impl CommentEvent {
    pub fn new(comment: &Comment, author: &User) -> Self {
        Self {
            id: comment.id.clone(),
            post_id: comment.post_id.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            user: UserRef::from(author),
            sentiment_score: comment.sentiment_score,
            sentiment_label: comment.sentiment_label,
        }
    }

    pub fn channel(&self) -> String {
        comment_channel(&self.post_id)
    }
}

#[allow(async_fn_in_trait)]
pub trait Broadcaster {
    async fn publish(&self, channel: &str, payload: &Value) -> Result<()>;
}

/// In-process pub/sub keyed by channel name.
///
/// Publishing to a channel nobody subscribed to is not an error.
#[derive(Debug, Clone, Default)]
pub struct ChannelHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Value>>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value> {
        let mut channels = self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(HUB_CAPACITY).0)
            .subscribe()
    }
}

impl Broadcaster for ChannelHub {
    async fn publish(&self, channel: &str, payload: &Value) -> Result<()> {
        let sender = {
            let channels = self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            channels.get(channel).cloned()
        };
        match sender {
            Some(sender) => {
                let receivers = sender.send(payload.clone()).unwrap_or(0);
                debug!("published to '{channel}' ({receivers} receiver(s))");
            }
            None => debug!("no subscribers on '{channel}'"),
        }
        Ok(())
    }
}

/// Publishes through Redis `PUBLISH` on prefixed channel names.
#[derive(Clone)]
pub struct RedisPublisher {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl RedisPublisher {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            keys: KeyContext::new(prefix),
        }
    }
}

impl Broadcaster for RedisPublisher {
    async fn publish(&self, channel: &str, payload: &Value) -> Result<()> {
        let mut conn = self.conn.clone();
        let receivers: u64 = redis::cmd("PUBLISH")
            .arg(self.keys.channel(channel))
            .arg(serde_json::to_string(payload)?)
            .query_async(&mut conn)
            .await?;
        debug!("published to '{channel}' ({receivers} receiver(s))");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    #[tokio::test]
    async fn hub_delivers_to_subscribers_of_the_channel() {
        let hub = ChannelHub::new();
        let mut first = hub.subscribe("comments:p1");
        let mut other = hub.subscribe("comments:p2");

        hub.publish("comments:p1", &json!({ "id": "c1" })).await.unwrap();

        assert_eq!(first.recv().await.unwrap()["id"], "c1");
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn publishing_without_subscribers_succeeds() {
        let hub = ChannelHub::new();
        hub.publish("comments:none", &json!({})).await.unwrap();
    }

    #[test]
    fn event_payload_carries_author_and_sentiment() {
        let now = Utc::now();
        let author = User {
            id: "u1".to_string(),
            email: "demo@example.com".to_string(),
            role: Role::User,
            created_at: now,
        };
        let comment = Comment {
            id: "c1".to_string(),
            post_id: "p1".to_string(),
            author_id: "u1".to_string(),
            content: "great post".to_string(),
            sentiment_score: 0.2,
            sentiment_label: SentimentLabel::Neutral,
            created_at: now,
            updated_at: now,
        };

        let event = CommentEvent::new(&comment, &author);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["user"]["email"], "demo@example.com");
        assert_eq!(json["sentiment_label"], "neutral");
        assert_eq!(json["post_id"], "p1");
        assert_eq!(event.channel(), "comments:p1");
    }
}
