/// Redis key layout for the tagpulse store.
///
/// Every key is namespaced by `prefix`, so several deployments (or test runs)
/// can share one Redis database.
#[derive(Debug, Clone)]
pub struct KeyContext {
    prefix: String,
}

impl KeyContext {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// JSON document of a single record.
    pub fn record(&self, collection: &str, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, collection, id)
    }

    /// Sorted set of record ids scored by `created_at` in milliseconds.
    pub fn created_index(&self, collection: &str) -> String {
        format!("{}:{}:by_created", self.prefix, collection)
    }

    pub fn user_email_index(&self) -> String {
        format!("{}:users:by_email", self.prefix)
    }

    /// Hash of normalized hashtag name to hashtag id.
    pub fn hashtag_name_index(&self) -> String {
        format!("{}:hashtags:by_name", self.prefix)
    }

    /// Set of hashtag ids linked to a post.
    pub fn post_hashtags(&self, post_id: &str) -> String {
        format!("{}:posts:{}:hashtags", self.prefix, post_id)
    }

    /// Set of post ids linked to a hashtag.
    pub fn hashtag_posts(&self, hashtag_id: &str) -> String {
        format!("{}:hashtags:{}:posts", self.prefix, hashtag_id)
    }

    /// Sorted set of comment ids on a post scored by `created_at`.
    pub fn post_comments(&self, post_id: &str) -> String {
        format!("{}:posts:{}:comments", self.prefix, post_id)
    }

    /// Set of user ids that liked or bookmarked a post.
    pub fn post_engagements(&self, kind: &str, post_id: &str) -> String {
        format!("{}:posts:{}:{}", self.prefix, post_id, kind)
    }

    /// Set of post ids a user liked or bookmarked.
    pub fn user_engagements(&self, kind: &str, user_id: &str) -> String {
        format!("{}:users:{}:{}", self.prefix, user_id, kind)
    }

    /// Hash of post id to like count.
    pub fn like_counts(&self) -> String {
        format!("{}:posts:like_counts", self.prefix)
    }

    /// Pub/sub channel name.
    pub fn channel(&self, name: &str) -> String {
        format!("{}:channel:{}", self.prefix, name)
    }

    /// Pattern matching every key owned by this prefix.
    pub fn all_keys_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }
}
