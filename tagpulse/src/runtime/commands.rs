use serde::Serialize;

/// A single atomic write executed as one Lua script.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ScriptCommand {
    SavePost(SavePostCommand),
    DeletePost(DeletePostCommand),
    SaveComment(SaveCommentCommand),
    GetOrCreateHashtag(HashtagCommand),
    CreateUser(CreateUserCommand),
    Engagement(EngagementCommand),
}

impl ScriptCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptCommand::SavePost(_) => "save_post",
            ScriptCommand::DeletePost(_) => "delete_post",
            ScriptCommand::SaveComment(_) => "save_comment",
            ScriptCommand::GetOrCreateHashtag(_) => "get_or_create_hashtag",
            ScriptCommand::CreateUser(_) => "create_user",
            ScriptCommand::Engagement(_) => "engagement",
        }
    }
}

/// Post document plus the hashtags it must be linked to.
#[derive(Debug, Serialize)]
pub struct SavePostCommand {
    pub prefix: String,
    pub post_id: String,
    /// Serialized post record stored verbatim.
    pub post_json: String,
    /// `created_at` in epoch milliseconds.
    pub created_score: i64,
    pub tags: Vec<HashtagCandidate>,
}

/// A hashtag to link, with the id and timestamp used only if it is new.
#[derive(Debug, Serialize)]
pub struct HashtagCandidate {
    pub name: String,
    pub id: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeletePostCommand {
    pub prefix: String,
    pub post_id: String,
}

/// Comment document; refused when the post is gone.
#[derive(Debug, Serialize)]
pub struct SaveCommentCommand {
    pub prefix: String,
    pub post_id: String,
    pub comment_id: String,
    pub comment_json: String,
    pub created_score: i64,
}

#[derive(Debug, Serialize)]
pub struct HashtagCommand {
    pub prefix: String,
    pub name: String,
    pub id: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserCommand {
    pub prefix: String,
    pub user_id: String,
    /// Lowercased email used as the uniqueness key.
    pub email_key: String,
    pub user_json: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementOp {
    Add,
    Remove,
}

#[derive(Debug, Serialize)]
pub struct EngagementCommand {
    pub prefix: String,
    pub op: EngagementOp,
    /// `likes` or `bookmarks`.
    pub kind: &'static str,
    pub user_id: String,
    pub post_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_without_variant_wrapper() {
        let command = ScriptCommand::Engagement(EngagementCommand {
            prefix: "tp".to_string(),
            op: EngagementOp::Add,
            kind: "likes",
            user_id: "u1".to_string(),
            post_id: "p1".to_string(),
        });
        let json: serde_json::Value = serde_json::to_value(&command).unwrap();
        assert_eq!(json["op"], "add");
        assert_eq!(json["kind"], "likes");
        assert_eq!(command.name(), "engagement");
    }

    #[test]
    fn save_post_serializes_tag_candidates() {
        let command = SavePostCommand {
            prefix: "tp".to_string(),
            post_id: "p1".to_string(),
            post_json: "{}".to_string(),
            created_score: 1_700_000_000_000,
            tags: vec![HashtagCandidate {
                name: "ruby".to_string(),
                id: "h1".to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            }],
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["tags"][0]["name"], "ruby");
        assert_eq!(json["created_score"], 1_700_000_000_000_i64);
    }
}
