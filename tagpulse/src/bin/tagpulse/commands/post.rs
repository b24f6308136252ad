use anyhow::Result;
use clap::Subcommand;
use tagpulse::{Broadcaster, Store};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Writing",
        commands: &[
            "tagpulse post create \"Shipping on Friday #deployment #yolo\"",
            "tagpulse post update <POST_ID> \"Rolled back. #deployment\"",
            "tagpulse --as admin@example.com post delete <POST_ID>",
        ],
    },
    ExampleGroup {
        title: "Reading",
        commands: &["tagpulse post show <POST_ID>             # Post, author and comments"],
    },
];

#[derive(Subcommand)]
pub enum PostCommands {
    /// Create a post; hashtags and sentiment are derived from the content
    #[command(name = "create")]
    Create {
        /// Post content
        content: String,
    },

    /// Replace the content of one of your posts
    #[command(name = "update")]
    Update {
        /// Post id
        id: String,

        /// New content
        content: String,
    },

    /// Delete a post with its comments, likes and bookmarks
    #[command(name = "delete")]
    Delete {
        /// Post id
        id: String,
    },

    /// Show a post with its comments
    #[command(name = "show")]
    Show {
        /// Post id
        id: String,
    },
}

pub async fn handle_post_commands<S, B>(command: PostCommands, app: &App<S, B>, output: &OutputManager) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    let content = app.content();
    match command {
        PostCommands::Create { content: text } => {
            let author = app.current_user().await?;
            let post = content.create_post(&author, &text).await?;
            output.success(&format!("Created post {}", post.id));
            output.display(&post)?;
        }
        PostCommands::Update { id, content: text } => {
            let editor = app.current_user().await?;
            let post = content.update_post(&editor, &id, &text).await?;
            output.success(&format!("Updated post {}", post.id));
            output.display(&post)?;
        }
        PostCommands::Delete { id } => {
            let actor = app.current_user().await?;
            content.delete_post(&actor, &id).await?;
            output.success(&format!("Deleted post {id}"));
        }
        PostCommands::Show { id } => {
            let detail = content.get_post(&id).await?;
            output.display(&detail)?;
        }
    }
    Ok(())
}
