//! Deterministic demo dataset.
//!
//! The same seed and `now` always produce the same users, posts and comments
//! (ids aside), which keeps CLI sessions on the memory backend reproducible.

use chrono::{DateTime, TimeDelta, Utc};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::Serialize;

use crate::{
    content::ContentService,
    errors::{Error, Result},
    models::{Post, Role, User},
    realtime::Broadcaster,
    store::Store,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEFAULT_SEED: u64 = 42;

const OTHER_EMAILS: &[&str] = &[
    "alex@test.com",
    "sam@test.com",
    "jordan@test.com",
    "casey@test.com",
    "taylor@test.com",
    "morgan@test.com",
    "riley@test.com",
    "jamie@test.com",
];

const HASHTAGS: &[&str] = &[
    "#ruby",
    "#rails",
    "#react",
    "#javascript",
    "#coding",
    "#webdev",
    "#frontend",
    "#backend",
    "#fullstack",
    "#learning",
    "#docker",
    "#deployment",
    "#testing",
    "#advice",
    "#career",
];

const SENTENCES: &[&str] = &[
    "Just started learning a new framework today! It's amazing.",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "Ruby on Rails is still so productive in 2024. Love it.",
    "React hooks are powerful but can be tricky.",
    "Anyone used the new features in the latest release?",
    "Refactoring code is my therapy.",
    "Deploying to production on a Friday... wish me luck!",
    "CSS Grid makes layouts so much easier.",
    "Just shipped a new feature! user feedback is great so far.",
    "Why does this code work? I have no idea.",
];

const COMMENTS: &[&str] = &[
    "Great post!",
    "Totally agree.",
    "This happened to me yesterday.",
    "Can you share more details?",
    "Awesome work!",
    "Nice!",
    "So true.",
    "Interesting perspective.",
    "Thanks for sharing.",
];

const ADMIN_POSTS: usize = 15;
const DEMO_POSTS: usize = 40;
const RANDOM_COMMENTS: usize = 150;
const DEMO_REPLIES: usize = 30;

#[derive(Debug, Clone, Copy)]
pub struct SeedOptions {
    pub seed: u64,
    /// Reference time; posts land within the 30 days before it.
    pub now: DateTime<Utc>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
}

/// Clears the store and loads the demo dataset.
pub async fn seed_demo<S, B>(content: &ContentService<'_, S, B>, options: SeedOptions) -> Result<SeedReport>
where
    S: Store,
    B: Broadcaster,
{
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut report = SeedReport::default();
    content.store().purge().await?;

    let admin = content.register_user(ADMIN_EMAIL, Role::Admin).await?;
    let demo = content.register_user(DEMO_EMAIL, Role::User).await?;
    let mut others = Vec::with_capacity(OTHER_EMAILS.len());
    for email in OTHER_EMAILS {
        others.push(content.register_user(email, Role::User).await?);
    }
    report.users = 2 + others.len();

    let mut posts: Vec<Post> = Vec::new();
    posts.extend(create_posts_for(content, &admin, ADMIN_POSTS, &mut rng, options.now).await?);
    let demo_posts = create_posts_for(content, &demo, DEMO_POSTS, &mut rng, options.now).await?;
    posts.extend(demo_posts.iter().cloned());
    for user in &others {
        let count = rng.random_range(5..=15);
        posts.extend(create_posts_for(content, user, count, &mut rng, options.now).await?);
    }
    report.posts = posts.len();

    let mut everyone: Vec<&User> = vec![&admin, &demo];
    everyone.extend(others.iter());

    for _ in 0..RANDOM_COMMENTS {
        let post = pick(&posts, &mut rng)?;
        let author = *pick(&everyone, &mut rng)?;
        let text = *pick(COMMENTS, &mut rng)?;
        let at = post.created_at + TimeDelta::hours(rng.random_range(1..=24));
        content.create_comment_at(author, &post.id, text, at).await?;
    }
    for _ in 0..DEMO_REPLIES {
        let post = pick(&demo_posts, &mut rng)?;
        let author = pick(&others, &mut rng)?;
        let text = format!("Replying to your demo post: {}", pick(COMMENTS, &mut rng)?);
        let at = post.created_at + TimeDelta::hours(rng.random_range(1..=5));
        content.create_comment_at(author, &post.id, &text, at).await?;
    }
    report.comments = RANDOM_COMMENTS + DEMO_REPLIES;

    info!(
        "seeded {} users, {} posts, {} comments",
        report.users, report.posts, report.comments
    );
    Ok(report)
}

async fn create_posts_for<S, B>(
    content: &ContentService<'_, S, B>,
    author: &User,
    count: usize,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<Vec<Post>>
where
    S: Store,
    B: Broadcaster,
{
    let mut posts = Vec::with_capacity(count);
    for _ in 0..count {
        let sentence_count = rng.random_range(2..=3);
        let body: Vec<&str> = SENTENCES.choose_multiple(rng, sentence_count).copied().collect();
        let tag_count = rng.random_range(1..=4);
        let tags: Vec<&str> = HASHTAGS.choose_multiple(rng, tag_count).copied().collect();
        let text = format!("{}\n\n{}", body.join(" "), tags.join(" "));
        let at = now - TimeDelta::days(rng.random_range(1..=30));
        posts.push(content.create_post_at(author, &text, at).await?);
    }
    Ok(posts)
}

fn pick<'a, T>(items: &'a [T], rng: &mut StdRng) -> Result<&'a T> {
    items.choose(rng).ok_or_else(|| Error::Other {
        message: "cannot pick from an empty seed pool".into(),
    })
}
