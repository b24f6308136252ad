use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;

use super::{GetOrCreate, PostWrite, Store, TimeWindow};
use crate::{
    errors::{Error, Result, ValidationError},
    id::generate_id,
    models::{Comment, EngagementKind, EngagementOutcome, Hashtag, Post, User},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    /// Lowercased email to user id.
    emails: HashMap<String, String>,
    posts: HashMap<String, Post>,
    comments: HashMap<String, Comment>,
    hashtags: HashMap<String, Hashtag>,
    /// Normalized name to hashtag id.
    hashtag_names: HashMap<String, String>,
    /// (post id, hashtag id)
    links: BTreeSet<(String, String)>,
    /// (kind, user id, post id)
    engagements: HashSet<(EngagementKind, String, String)>,
}

impl MemoryState {
    fn find_or_create_hashtag(&mut self, name: &str) -> GetOrCreate<Hashtag> {
        if let Some(id) = self.hashtag_names.get(name)
            && let Some(existing) = self.hashtags.get(id)
        {
            return GetOrCreate::Found(existing.clone());
        }

        let hashtag = Hashtag {
            id: generate_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.hashtag_names.insert(hashtag.name.clone(), hashtag.id.clone());
        self.hashtags.insert(hashtag.id.clone(), hashtag.clone());
        GetOrCreate::Created(hashtag)
    }

    fn like_count(&self, post_id: &str) -> u64 {
        self.engagements
            .iter()
            .filter(|(kind, _, post)| *kind == EngagementKind::Like && post == post_id)
            .count() as u64
    }
}

/// Process-local store guarded by a single async mutex.
///
/// Every operation takes the lock once, which makes each write atomic with
/// respect to concurrent callers. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut state = self.state.lock().await;
        let email_key = user.email.to_lowercase();
        if state.emails.contains_key(&email_key) {
            return Err(ValidationError::single("email", "taken", "has already been taken").into());
        }
        state.emails.insert(email_key, user.id.clone());
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .emails
            .get(&email.to_lowercase())
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn users_by_ids(&self, ids: &[String]) -> Result<HashMap<String, User>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|user| (id.clone(), user.clone())))
            .collect())
    }

    async fn find_or_create_hashtag(&self, name: &str) -> Result<GetOrCreate<Hashtag>> {
        Ok(self.state.lock().await.find_or_create_hashtag(name))
    }

    async fn hashtag_count(&self) -> Result<u64> {
        Ok(self.state.lock().await.hashtags.len() as u64)
    }

    async fn save_post(&self, post: PostWrite) -> Result<Post> {
        let mut state = self.state.lock().await;

        let mut wanted = HashSet::with_capacity(post.hashtags.len());
        for name in &post.hashtags {
            let hashtag = state.find_or_create_hashtag(name);
            if hashtag.was_created() {
                debug!("created hashtag '{name}'");
            }
            let hashtag_id = hashtag.into_inner().id;
            state.links.insert((post.id.clone(), hashtag_id.clone()));
            wanted.insert(hashtag_id);
        }
        let post_id = post.id.clone();
        state
            .links
            .retain(|(linked_post, hashtag_id)| linked_post != &post_id || wanted.contains(hashtag_id));

        let likes_count = state.like_count(&post_id);
        let saved = post.into_post(likes_count);
        state.posts.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.state.lock().await.posts.get(id).cloned())
    }

    async fn delete_post(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.posts.remove(id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, comment| comment.post_id != id);
        state.links.retain(|(post_id, _)| post_id != id);
        state.engagements.retain(|(_, _, post_id)| post_id != id);
        Ok(true)
    }

    async fn posts_in_window(&self, window: &TimeWindow) -> Result<Vec<Post>> {
        let state = self.state.lock().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| window.contains(post.created_at))
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn post_ids_for_hashtag(&self, name: &str) -> Result<HashSet<String>> {
        let state = self.state.lock().await;
        let Some(hashtag_id) = state.hashtag_names.get(name) else {
            return Ok(HashSet::new());
        };
        Ok(state
            .links
            .iter()
            .filter(|(_, linked)| linked == hashtag_id)
            .map(|(post_id, _)| post_id.clone())
            .collect())
    }

    async fn save_comment(&self, comment: Comment) -> Result<Comment> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(Error::not_found("post", comment.post_id));
        }
        state.comments.insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    async fn comments_for_post(&self, post_id: &str) -> Result<Vec<Comment>> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn comments_in_window(&self, window: &TimeWindow) -> Result<Vec<Comment>> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| window.contains(comment.created_at))
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn add_engagement(&self, kind: EngagementKind, user_id: &str, post_id: &str) -> Result<EngagementOutcome> {
        let mut state = self.state.lock().await;
        let inserted = state
            .engagements
            .insert((kind, user_id.to_string(), post_id.to_string()));
        if !inserted {
            return Ok(EngagementOutcome::AlreadyPresent);
        }
        if kind == EngagementKind::Like
            && let Some(post) = state.posts.get_mut(post_id)
        {
            post.likes_count += 1;
        }
        Ok(EngagementOutcome::Created)
    }

    async fn remove_engagement(&self, kind: EngagementKind, user_id: &str, post_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let removed = state
            .engagements
            .remove(&(kind, user_id.to_string(), post_id.to_string()));
        if removed
            && kind == EngagementKind::Like
            && let Some(post) = state.posts.get_mut(post_id)
        {
            post.likes_count = post.likes_count.saturating_sub(1);
        }
        Ok(removed)
    }

    async fn engaged_post_ids(&self, kind: EngagementKind, user_id: &str) -> Result<HashSet<String>> {
        let state = self.state.lock().await;
        Ok(state
            .engagements
            .iter()
            .filter(|(engaged_kind, user, _)| *engaged_kind == kind && user == user_id)
            .map(|(_, _, post_id)| post_id.clone())
            .collect())
    }

    async fn purge(&self) -> Result<()> {
        *self.state.lock().await = MemoryState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Role, tagging::Sentiment};
    use chrono::{DateTime, Duration, TimeZone};

    fn user(email: &str) -> User {
        User {
            id: generate_id(),
            email: email.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn post_write(id: &str, tags: &[&str], at: DateTime<Utc>) -> PostWrite {
        PostWrite {
            id: id.to_string(),
            author_id: "author".to_string(),
            content: "content".to_string(),
            sentiment: Sentiment::NEUTRAL,
            hashtags: tags.iter().map(|tag| tag.to_string()).collect(),
            created_at: at,
            updated_at: at,
        }
    }

    fn comment_on(post_id: &str, at: DateTime<Utc>) -> Comment {
        Comment {
            id: generate_id(),
            post_id: post_id.to_string(),
            author_id: "author".to_string(),
            content: "Nice!".to_string(),
            sentiment_score: 0.0,
            sentiment_label: Default::default(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store.insert_user(user("sam@test.com")).await.unwrap();
        let err = store.insert_user(user("SAM@test.com")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.find_user_by_email("Sam@Test.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn resaving_a_post_keeps_one_link_per_tag() {
        let store = MemoryStore::new();
        let at = Utc::now();
        store.save_post(post_write("p1", &["ruby", "world"], at)).await.unwrap();
        store.save_post(post_write("p1", &["ruby", "world"], at)).await.unwrap();

        assert_eq!(store.hashtag_count().await.unwrap(), 2);
        assert_eq!(store.state.lock().await.links.len(), 2);

        store.save_post(post_write("p1", &["ruby"], at)).await.unwrap();
        assert!(store.post_ids_for_hashtag("world").await.unwrap().is_empty());
        // hashtag rows outlive their links
        assert_eq!(store.hashtag_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn window_query_is_sorted_and_bounded() {
        let store = MemoryStore::new();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        store.save_post(post_write("late", &[], base + Duration::days(2))).await.unwrap();
        store.save_post(post_write("early", &[], base)).await.unwrap();
        store.save_post(post_write("outside", &[], base + Duration::days(9))).await.unwrap();

        let window = TimeWindow::between(base, base + Duration::days(3));
        let ids: Vec<String> = store
            .posts_in_window(&window)
            .await
            .unwrap()
            .into_iter()
            .map(|post| post.id)
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn engagements_are_binary_and_count_likes() {
        let store = MemoryStore::new();
        store.save_post(post_write("p1", &[], Utc::now())).await.unwrap();

        let first = store.add_engagement(EngagementKind::Like, "u1", "p1").await.unwrap();
        let second = store.add_engagement(EngagementKind::Like, "u1", "p1").await.unwrap();
        assert_eq!(first, EngagementOutcome::Created);
        assert_eq!(second, EngagementOutcome::AlreadyPresent);
        assert_eq!(store.get_post("p1").await.unwrap().unwrap().likes_count, 1);

        store.add_engagement(EngagementKind::Bookmark, "u1", "p1").await.unwrap();
        assert_eq!(store.get_post("p1").await.unwrap().unwrap().likes_count, 1);

        assert!(store.remove_engagement(EngagementKind::Like, "u1", "p1").await.unwrap());
        assert!(!store.remove_engagement(EngagementKind::Like, "u1", "p1").await.unwrap());
        assert_eq!(store.get_post("p1").await.unwrap().unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn delete_cascades_to_dependents() {
        let store = MemoryStore::new();
        let at = Utc::now();
        store.save_post(post_write("p1", &["ruby"], at)).await.unwrap();
        store.save_comment(comment_on("p1", at)).await.unwrap();
        store.add_engagement(EngagementKind::Bookmark, "u1", "p1").await.unwrap();

        assert!(store.delete_post("p1").await.unwrap());
        assert!(!store.delete_post("p1").await.unwrap());
        assert!(store.comments_for_post("p1").await.unwrap().is_empty());
        assert!(store.post_ids_for_hashtag("ruby").await.unwrap().is_empty());
        assert!(store.engaged_post_ids(EngagementKind::Bookmark, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_on_deleted_post_is_refused() {
        let store = MemoryStore::new();
        let at = Utc::now();
        store.save_post(post_write("p1", &[], at)).await.unwrap();
        store.delete_post("p1").await.unwrap();

        let err = store.save_comment(comment_on("p1", at)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.comments_in_window(&TimeWindow::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_find_or_create_yields_one_row() {
        let store = MemoryStore::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.find_or_create_hashtag("rust").await.unwrap().into_inner().id })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 1);
        assert_eq!(store.hashtag_count().await.unwrap(), 1);
    }
}
