use redis::Script;
use std::sync::LazyLock;

pub const POST_SAVE_SCRIPT_BODY: &str = include_str!("../../lua/post_save.lua");
pub const POST_DELETE_SCRIPT_BODY: &str = include_str!("../../lua/post_delete.lua");
pub const COMMENT_SAVE_SCRIPT_BODY: &str = include_str!("../../lua/comment_save.lua");
pub const HASHTAG_GET_OR_CREATE_SCRIPT_BODY: &str = include_str!("../../lua/hashtag_get_or_create.lua");
pub const USER_CREATE_SCRIPT_BODY: &str = include_str!("../../lua/user_create.lua");
pub const ENGAGEMENT_SCRIPT_BODY: &str = include_str!("../../lua/engagement.lua");

pub static POST_SAVE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(POST_SAVE_SCRIPT_BODY));
pub static POST_DELETE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(POST_DELETE_SCRIPT_BODY));
pub static COMMENT_SAVE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(COMMENT_SAVE_SCRIPT_BODY));
pub static HASHTAG_GET_OR_CREATE_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(HASHTAG_GET_OR_CREATE_SCRIPT_BODY));
pub static USER_CREATE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(USER_CREATE_SCRIPT_BODY));
pub static ENGAGEMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ENGAGEMENT_SCRIPT_BODY));
