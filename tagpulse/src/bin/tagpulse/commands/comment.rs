use anyhow::Result;
use clap::Subcommand;
use tagpulse::{Broadcaster, Store};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::{CommentList, OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Comments",
    commands: &[
        "tagpulse comment create <POST_ID> \"Great post!\"  # Publishes a comment event",
        "tagpulse comment list <POST_ID>                  # Oldest first",
    ],
}];

#[derive(Subcommand)]
pub enum CommentCommands {
    /// Comment on a post
    #[command(name = "create")]
    Create {
        /// Post id
        post_id: String,

        /// Comment content
        content: String,
    },

    /// List the comments on a post
    #[command(name = "list")]
    List {
        /// Post id
        post_id: String,
    },
}

pub async fn handle_comment_commands<S, B>(
    command: CommentCommands,
    app: &App<S, B>,
    output: &OutputManager,
) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    let content = app.content();
    match command {
        CommentCommands::Create { post_id, content: text } => {
            let author = app.current_user().await?;
            let comment = content.create_comment(&author, &post_id, &text).await?;
            output.success(&format!("Commented on {post_id}"));
            output.display(&comment)?;
        }
        CommentCommands::List { post_id } => {
            let comments = content.comments_for_post(&post_id).await?;
            output.display(&CommentList(comments))?;
        }
    }
    Ok(())
}
