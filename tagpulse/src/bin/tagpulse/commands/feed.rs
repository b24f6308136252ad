use anyhow::Result;
use clap::Args;
use tagpulse::{Broadcaster, FeedQuery, Store};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::{Feed, OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Browsing",
    commands: &[
        "tagpulse feed                          # Newest 15 posts",
        "tagpulse feed --hashtag rails --page 2",
        "tagpulse feed --filter liked           # Posts you liked",
        "tagpulse feed --anonymous              # No viewer flags or filters",
    ],
}];

#[derive(Args)]
pub struct FeedArgs {
    /// Page number (falls back to 1 when invalid)
    #[arg(long)]
    pub page: Option<String>,

    /// Posts per page (defaults to 15)
    #[arg(long)]
    pub per_page: Option<String>,

    /// Only posts tagged with this hashtag
    #[arg(long)]
    pub hashtag: Option<String>,

    /// liked or bookmarked
    #[arg(long)]
    pub filter: Option<String>,

    /// Browse without a viewer
    #[arg(long)]
    pub anonymous: bool,
}

pub async fn handle_feed<S, B>(args: FeedArgs, app: &App<S, B>, output: &OutputManager) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    let viewer = if args.anonymous {
        None
    } else {
        Some(app.current_user().await?)
    };
    let query = FeedQuery {
        page: args.page,
        per_page: args.per_page,
        hashtag: args.hashtag,
        filter: args.filter,
    };
    if query.filter.is_some() && query.engagement_filter().is_none() {
        output.warning("Unknown --filter value ignored (expected liked or bookmarked)");
    }

    let items = app.content().feed(viewer.as_ref(), &query).await?;
    output.display(&Feed(items))?;
    Ok(())
}
