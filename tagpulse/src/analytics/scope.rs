use crate::models::{Comment, Post, User};

/// Which content a viewer's analytics cover.
///
/// Chosen once per request from the viewer's role; every aggregation filters
/// through it instead of inspecting the role itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// All posts and comments.
    Admin,
    /// Only content authored by this user id.
    Owner(String),
}

impl Scope {
    pub fn for_viewer(viewer: &User) -> Self {
        if viewer.is_admin() {
            Scope::Admin
        } else {
            Scope::Owner(viewer.id.clone())
        }
    }

    pub fn includes_author(&self, author_id: &str) -> bool {
        match self {
            Scope::Admin => true,
            Scope::Owner(owner) => owner == author_id,
        }
    }

    pub fn includes_post(&self, post: &Post) -> bool {
        self.includes_author(&post.author_id)
    }

    pub fn includes_comment(&self, comment: &Comment) -> bool {
        self.includes_author(&comment.author_id)
    }
}
