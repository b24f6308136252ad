use anyhow::Result;
use clap::{Args, Subcommand};
use tagpulse::{AnalyticsQuery, Broadcaster, ContentKind, Scope, Store};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Dashboard",
        commands: &[
            "tagpulse analytics overview                                   # Last 30 days",
            "tagpulse analytics overview --start-date 2026-01-01 --end-date 2026-01-31",
            "tagpulse --as admin@example.com analytics overview --hashtag rails",
            "tagpulse analytics snapshot                                   # Last 7 days, all users",
        ],
    },
    ExampleGroup {
        title: "Listings",
        commands: &[
            "tagpulse analytics posts --page 2 --per-page 20",
            "tagpulse --output json analytics comments --hashtag docker",
        ],
    },
];

#[derive(Args, Clone, Default)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD, inclusive); defaults to 30 days ago
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day (YYYY-MM-DD, inclusive); defaults to today
    #[arg(long)]
    pub end_date: Option<String>,

    /// Only content tagged with (or commenting on posts tagged with) this hashtag
    #[arg(long)]
    pub hashtag: Option<String>,
}

#[derive(Args, Clone, Default)]
pub struct PageArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Page number (falls back to 1 when invalid)
    #[arg(long)]
    pub page: Option<String>,

    /// Items per page (defaults to 10)
    #[arg(long)]
    pub per_page: Option<String>,
}

#[derive(Subcommand)]
pub enum AnalyticsCommands {
    /// Totals, daily series, top hashtags and first listing pages
    #[command(name = "overview")]
    Overview(RangeArgs),

    /// Paginated post listing
    #[command(name = "posts")]
    Posts(PageArgs),

    /// Paginated comment listing
    #[command(name = "comments")]
    Comments(PageArgs),

    /// Unscoped posts-per-day for the last week and all-time top hashtags
    #[command(name = "snapshot")]
    Snapshot,
}

fn to_query(range: RangeArgs, page: Option<String>, per_page: Option<String>) -> AnalyticsQuery {
    AnalyticsQuery {
        start_date: range.start_date,
        end_date: range.end_date,
        hashtag: range.hashtag,
        page,
        per_page,
    }
}

pub async fn handle_analytics_commands<S, B>(
    command: AnalyticsCommands,
    app: &App<S, B>,
    output: &OutputManager,
) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    let engine = app.analytics();

    match command {
        AnalyticsCommands::Snapshot => {
            output.heading("Global snapshot");
            let snapshot = engine.compute_global_snapshot().await?;
            output.display(&snapshot)?;
        }
        AnalyticsCommands::Overview(range) => {
            let viewer = app.current_user().await?;
            output.heading(&format!("Overview for {}", viewer.email));
            describe_scope(&Scope::for_viewer(&viewer), output);
            let overview = engine.compute_overview(&viewer, &to_query(range, None, None)).await?;
            output.display(&overview)?;
        }
        AnalyticsCommands::Posts(args) => {
            let viewer = app.current_user().await?;
            describe_scope(&Scope::for_viewer(&viewer), output);
            let query = to_query(args.range, args.page, args.per_page);
            let page = engine.compute_paginated(&viewer, ContentKind::Posts, &query).await?;
            output.display(&page)?;
        }
        AnalyticsCommands::Comments(args) => {
            let viewer = app.current_user().await?;
            describe_scope(&Scope::for_viewer(&viewer), output);
            let query = to_query(args.range, args.page, args.per_page);
            let page = engine.compute_paginated(&viewer, ContentKind::Comments, &query).await?;
            output.display(&page)?;
        }
    }
    Ok(())
}

fn describe_scope(scope: &Scope, output: &OutputManager) {
    match scope {
        Scope::Admin => output.verbose("admin scope: all users' content"),
        Scope::Owner(id) => output.verbose(&format!("owner scope: content by {id}")),
    }
}
