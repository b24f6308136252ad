use std::collections::{HashMap, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;

use super::{GetOrCreate, PostWrite, Store, TimeWindow};
use crate::{
    errors::{Error, Result},
    id::generate_id,
    keys::KeyContext,
    models::{Comment, EngagementKind, EngagementOutcome, Hashtag, Post, User},
    runtime::{
        ScriptCommand,
        commands::{
            CreateUserCommand, DeletePostCommand, EngagementCommand, EngagementOp, HashtagCandidate,
            HashtagCommand, SaveCommentCommand, SavePostCommand,
        },
        execute_command, reply_branch,
    },
};

const POSTS: &str = "posts";
const COMMENTS: &str = "comments";
const USERS: &str = "users";

/// Redis-backed store.
///
/// Records are JSON strings; `created_at` windows are served from sorted-set
/// indexes. Multi-key writes run as Lua scripts (see `lua/`), which Redis
/// executes atomically.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            keys: KeyContext::new(prefix),
        }
    }

    /// Opens a managed connection to `url`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix))
    }

    pub fn keys(&self) -> &KeyContext {
        &self.keys
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    fn prefix(&self) -> String {
        self.keys.prefix().to_string()
    }

    async fn load_records<T: DeserializeOwned>(&self, collection: &str, ids: &[String]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let record_keys: Vec<String> = ids.iter().map(|id| self.keys.record(collection, id)).collect();
        let mut conn = self.connection();
        let raw: Vec<Option<String>> = redis::cmd("MGET").arg(&record_keys).query_async(&mut conn).await?;

        let mut records = Vec::with_capacity(raw.len());
        for json in raw.into_iter().flatten() {
            records.push(serde_json::from_str(&json)?);
        }
        Ok(records)
    }

    async fn load_record<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        let mut conn = self.connection();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.keys.record(collection, id))
            .query_async(&mut conn)
            .await?;
        raw.map(|json| serde_json::from_str(&json).map_err(Error::from)).transpose()
    }

    /// Loads posts and overlays the live like counters.
    async fn load_posts(&self, ids: &[String]) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.load_records(POSTS, ids).await?;
        if posts.is_empty() {
            return Ok(posts);
        }
        let post_ids: Vec<&str> = posts.iter().map(|post| post.id.as_str()).collect();
        let mut conn = self.connection();
        let counts: Vec<Option<u64>> = redis::cmd("HMGET")
            .arg(self.keys.like_counts())
            .arg(&post_ids)
            .query_async(&mut conn)
            .await?;
        for (post, count) in posts.iter_mut().zip(counts) {
            post.likes_count = count.unwrap_or(0);
        }
        Ok(posts)
    }

    async fn ids_in_window(&self, collection: &str, window: &TimeWindow) -> Result<Vec<String>> {
        let min = window
            .start
            .map(|at| at.timestamp_millis().to_string())
            .unwrap_or_else(|| "-inf".to_string());
        let max = window
            .end
            .map(|at| at.timestamp_millis().to_string())
            .unwrap_or_else(|| "+inf".to_string());
        let mut conn = self.connection();
        let ids: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(self.keys.created_index(collection))
            .arg(min)
            .arg(max)
            .query_async(&mut conn)
            .await?;
        Ok(ids)
    }

    async fn run(&self, command: ScriptCommand) -> Result<serde_json::Value> {
        let mut conn = self.connection();
        execute_command(&mut conn, &command).await
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Store for RedisStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let command = CreateUserCommand {
            prefix: self.prefix(),
            user_id: user.id.clone(),
            email_key: user.email.to_lowercase(),
            user_json: serde_json::to_string(&user)?,
        };
        self.run(ScriptCommand::CreateUser(command)).await?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.load_record(USERS, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.connection();
        let id: Option<String> = redis::cmd("HGET")
            .arg(self.keys.user_email_index())
            .arg(email.to_lowercase())
            .query_async(&mut conn)
            .await?;
        match id {
            Some(id) => self.get_user(&id).await,
            None => Ok(None),
        }
    }

    async fn users_by_ids(&self, ids: &[String]) -> Result<HashMap<String, User>> {
        let unique: Vec<String> = ids.iter().cloned().collect::<HashSet<_>>().into_iter().collect();
        let users: Vec<User> = self.load_records(USERS, &unique).await?;
        Ok(users.into_iter().map(|user| (user.id.clone(), user)).collect())
    }

    async fn find_or_create_hashtag(&self, name: &str) -> Result<GetOrCreate<Hashtag>> {
        let command = HashtagCommand {
            prefix: self.prefix(),
            name: name.to_string(),
            id: generate_id(),
            created_at: timestamp(Utc::now()),
        };
        let reply = self.run(ScriptCommand::GetOrCreateHashtag(command)).await?;
        let branch = reply_branch(&reply)?.to_string();
        let hashtag: Hashtag = serde_json::from_value(reply.get("hashtag").cloned().unwrap_or_default())?;
        match branch.as_str() {
            "created" => Ok(GetOrCreate::Created(hashtag)),
            _ => Ok(GetOrCreate::Found(hashtag)),
        }
    }

    async fn hashtag_count(&self) -> Result<u64> {
        let mut conn = self.connection();
        let count: u64 = redis::cmd("HLEN")
            .arg(self.keys.hashtag_name_index())
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    async fn save_post(&self, post: PostWrite) -> Result<Post> {
        let now = timestamp(Utc::now());
        let tags = post
            .hashtags
            .iter()
            .map(|name| HashtagCandidate {
                name: name.clone(),
                id: generate_id(),
                created_at: now.clone(),
            })
            .collect();
        let created_score = post.created_at.timestamp_millis();
        let stored = post.into_post(0);

        let command = SavePostCommand {
            prefix: self.prefix(),
            post_id: stored.id.clone(),
            post_json: serde_json::to_string(&stored)?,
            created_score,
            tags,
        };
        let reply = self.run(ScriptCommand::SavePost(command)).await?;

        let created = reply.get("created_hashtags").and_then(|v| v.as_u64()).unwrap_or(0);
        if created > 0 {
            debug!("post {} created {created} new hashtag(s)", stored.id);
        }
        let likes_count = reply.get("likes_count").and_then(|v| v.as_u64()).unwrap_or(0);
        Ok(Post { likes_count, ..stored })
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.load_posts(&[id.to_string()]).await?.into_iter().next())
    }

    async fn delete_post(&self, id: &str) -> Result<bool> {
        let command = DeletePostCommand {
            prefix: self.prefix(),
            post_id: id.to_string(),
        };
        let reply = self.run(ScriptCommand::DeletePost(command)).await?;
        Ok(reply_branch(&reply)? == "deleted")
    }

    async fn posts_in_window(&self, window: &TimeWindow) -> Result<Vec<Post>> {
        let ids = self.ids_in_window(POSTS, window).await?;
        self.load_posts(&ids).await
    }

    async fn post_ids_for_hashtag(&self, name: &str) -> Result<HashSet<String>> {
        let mut conn = self.connection();
        let hashtag_id: Option<String> = redis::cmd("HGET")
            .arg(self.keys.hashtag_name_index())
            .arg(name)
            .query_async(&mut conn)
            .await?;
        let Some(hashtag_id) = hashtag_id else {
            return Ok(HashSet::new());
        };
        let ids: HashSet<String> = redis::cmd("SMEMBERS")
            .arg(self.keys.hashtag_posts(&hashtag_id))
            .query_async(&mut conn)
            .await?;
        Ok(ids)
    }

    async fn save_comment(&self, comment: Comment) -> Result<Comment> {
        let command = SaveCommentCommand {
            prefix: self.prefix(),
            post_id: comment.post_id.clone(),
            comment_id: comment.id.clone(),
            comment_json: serde_json::to_string(&comment)?,
            created_score: comment.created_at.timestamp_millis(),
        };
        self.run(ScriptCommand::SaveComment(command)).await?;
        Ok(comment)
    }

    async fn comments_for_post(&self, post_id: &str) -> Result<Vec<Comment>> {
        let mut conn = self.connection();
        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.keys.post_comments(post_id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        self.load_records(COMMENTS, &ids).await
    }

    async fn comments_in_window(&self, window: &TimeWindow) -> Result<Vec<Comment>> {
        let ids = self.ids_in_window(COMMENTS, window).await?;
        self.load_records(COMMENTS, &ids).await
    }

    async fn add_engagement(&self, kind: EngagementKind, user_id: &str, post_id: &str) -> Result<EngagementOutcome> {
        let command = EngagementCommand {
            prefix: self.prefix(),
            op: EngagementOp::Add,
            kind: kind.collection(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
        };
        let reply = self.run(ScriptCommand::Engagement(command)).await?;
        match reply_branch(&reply)? {
            "created" => Ok(EngagementOutcome::Created),
            _ => Ok(EngagementOutcome::AlreadyPresent),
        }
    }

    async fn remove_engagement(&self, kind: EngagementKind, user_id: &str, post_id: &str) -> Result<bool> {
        let command = EngagementCommand {
            prefix: self.prefix(),
            op: EngagementOp::Remove,
            kind: kind.collection(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
        };
        let reply = self.run(ScriptCommand::Engagement(command)).await?;
        Ok(reply_branch(&reply)? == "removed")
    }

    async fn engaged_post_ids(&self, kind: EngagementKind, user_id: &str) -> Result<HashSet<String>> {
        let mut conn = self.connection();
        let ids: HashSet<String> = redis::cmd("SMEMBERS")
            .arg(self.keys.user_engagements(kind.collection(), user_id))
            .query_async(&mut conn)
            .await?;
        Ok(ids)
    }

    async fn purge(&self) -> Result<()> {
        let mut conn = self.connection();
        let deleted = cleanup_pattern(&mut conn, &self.keys.all_keys_pattern()).await?;
        debug!("purged {deleted} key(s) under '{}'", self.keys.prefix());
        Ok(())
    }
}

/// Delete all keys matching a pattern.
///
/// Uses SCAN + DEL so Redis is never blocked by a single large KEYS call.
pub async fn cleanup_pattern(conn: &mut ConnectionManager, pattern: &str) -> Result<u64, redis::RedisError> {
    const SCAN_COUNT: usize = 1000;
    let mut cursor: u64 = 0;
    let mut total_deleted: u64 = 0;

    loop {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(conn)
            .await?;

        if !keys.is_empty() {
            let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(conn).await?;
            total_deleted += deleted;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(total_deleted)
}

// Key names used in the Lua scripts are built from the prefix by hand; keep
// them in step with `KeyContext`.
#[cfg(test)]
mod tests {
    use super::*;

    const HASHTAGS: &str = "hashtags";

    #[test]
    fn lua_key_layout_matches_key_context() {
        let keys = KeyContext::new("tp");
        assert_eq!(keys.record(POSTS, "p1"), "tp:posts:p1");
        assert_eq!(keys.record(HASHTAGS, "h1"), "tp:hashtags:h1");
        assert_eq!(keys.post_hashtags("p1"), "tp:posts:p1:hashtags");
        assert_eq!(keys.hashtag_posts("h1"), "tp:hashtags:h1:posts");
        assert_eq!(keys.post_comments("p1"), "tp:posts:p1:comments");
        assert_eq!(keys.created_index(COMMENTS), "tp:comments:by_created");
        assert_eq!(keys.like_counts(), "tp:posts:like_counts");
        assert_eq!(keys.user_email_index(), "tp:users:by_email");
    }

    #[test]
    fn timestamps_round_trip_through_serde() {
        let now = Utc::now();
        let text = timestamp(now);
        let parsed: DateTime<Utc> = serde_json::from_value(serde_json::Value::String(text)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }
}
