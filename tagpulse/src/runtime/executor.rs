use std::borrow::Cow;

use log::debug;
use redis::aio::ConnectionLike;
use serde_json::Value;

use crate::{
    errors::{Error, ValidationError},
    runtime::{
        commands::ScriptCommand,
        scripts::{
            COMMENT_SAVE_SCRIPT, ENGAGEMENT_SCRIPT, HASHTAG_GET_OR_CREATE_SCRIPT, POST_DELETE_SCRIPT, POST_SAVE_SCRIPT,
            USER_CREATE_SCRIPT,
        },
    },
};

/// Runs one command as a Lua script and returns its decoded JSON reply.
///
/// Error codes reported by the script are mapped onto [`Error`] variants.
pub async fn execute_command<C>(conn: &mut C, command: &ScriptCommand) -> Result<Value, Error>
where
    C: ConnectionLike + Send,
{
    let script = match command {
        ScriptCommand::SavePost(_) => &*POST_SAVE_SCRIPT,
        ScriptCommand::DeletePost(_) => &*POST_DELETE_SCRIPT,
        ScriptCommand::SaveComment(_) => &*COMMENT_SAVE_SCRIPT,
        ScriptCommand::GetOrCreateHashtag(_) => &*HASHTAG_GET_OR_CREATE_SCRIPT,
        ScriptCommand::CreateUser(_) => &*USER_CREATE_SCRIPT,
        ScriptCommand::Engagement(_) => &*ENGAGEMENT_SCRIPT,
    };

    let payload = serde_json::to_string(command).map_err(|err| Error::Other {
        message: Cow::Owned(format!("failed to serialize {} command: {err}", command.name())),
    })?;

    debug!("running {} script", command.name());
    let mut invocation = script.prepare_invoke();
    invocation.arg(payload);
    let raw: String = invocation.invoke_async(conn).await?;

    let value: Value = serde_json::from_str(&raw).map_err(|err| Error::Other {
        message: Cow::Owned(format!("failed to parse lua response: {err}")),
    })?;

    if let Some(error) = value.get("error") {
        return Err(map_script_error(error, &value));
    }

    Ok(value)
}

fn map_script_error(error: &Value, reply: &Value) -> Error {
    match error.as_str() {
        Some("email_taken") => ValidationError::single("email", "taken", "has already been taken").into(),
        Some("entity_not_found") => {
            let id = reply
                .get("entity_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Error::not_found("post", id)
        }
        Some(other) => Error::Other {
            message: Cow::Owned(other.to_string()),
        },
        None => Error::Other {
            message: Cow::Borrowed("lua_error"),
        },
    }
}

/// Reads the `branch` field every script reply carries.
pub fn reply_branch(reply: &Value) -> Result<&str, Error> {
    reply.get("branch").and_then(|v| v.as_str()).ok_or(Error::Other {
        message: Cow::Borrowed("script response missing 'branch' field"),
    })
}
