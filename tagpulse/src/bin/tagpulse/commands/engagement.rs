use anyhow::Result;
use clap::Args;
use tagpulse::{Broadcaster, EngagementKind, EngagementOutcome, Store};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Likes & Bookmarks",
    commands: &[
        "tagpulse like <POST_ID>         # Liking twice is a no-op",
        "tagpulse unlike <POST_ID>",
        "tagpulse bookmark <POST_ID>",
        "tagpulse unbookmark <POST_ID>",
    ],
}];

#[derive(Args)]
pub struct PostTarget {
    /// Post id
    pub post_id: String,
}

pub async fn handle_engage<S, B>(
    kind: EngagementKind,
    target: PostTarget,
    app: &App<S, B>,
    output: &OutputManager,
) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    let user = app.current_user().await?;
    let content = app.content();
    let outcome = match kind {
        EngagementKind::Like => content.like(&user, &target.post_id).await?,
        EngagementKind::Bookmark => content.bookmark(&user, &target.post_id).await?,
    };
    match outcome {
        EngagementOutcome::Created => output.success(&format!("{} added to {}", kind.entity(), target.post_id)),
        EngagementOutcome::AlreadyPresent => {
            output.info(&format!("{} already present on {}", kind.entity(), target.post_id))
        }
    }
    Ok(())
}

pub async fn handle_disengage<S, B>(
    kind: EngagementKind,
    target: PostTarget,
    app: &App<S, B>,
    output: &OutputManager,
) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    let user = app.current_user().await?;
    let content = app.content();
    match kind {
        EngagementKind::Like => content.unlike(&user, &target.post_id).await?,
        EngagementKind::Bookmark => content.unbookmark(&user, &target.post_id).await?,
    }
    output.success(&format!("{} removed from {}", kind.entity(), target.post_id));
    Ok(())
}
