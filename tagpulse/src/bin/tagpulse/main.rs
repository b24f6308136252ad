mod app;
mod commands;
mod context;
mod examples;
mod output;
mod theme;

use anyhow::{Context, Result};
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
    error::ErrorKind,
};

use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};
use std::fmt::Write;
use std::io::{self, Write as IoWrite};
use std::path::PathBuf;

use tagpulse::{
    Broadcaster, ChannelHub, EngagementKind, MemoryStore, RedisPublisher, RedisStore, Store,
    seed::{DEMO_EMAIL, SeedOptions, seed_demo},
};

use app::App;
use commands::{
    analytics::{AnalyticsCommands, handle_analytics_commands},
    comment::{CommentCommands, handle_comment_commands},
    engagement::{PostTarget, handle_disengage, handle_engage},
    feed::{FeedArgs, handle_feed},
    post::{PostCommands, handle_post_commands},
    seed::{SeedArgs, handle_seed},
    user::{UserCommands, handle_user_commands},
};
use context::{AppContext, Backend, validate_redis_url};
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL (expanded from ${REDIS_URL} in tagpulse.toml)"),
    ("TAGPULSE_CONFIG", "Path to the configuration file (default: ./tagpulse.toml)"),
    ("TAGPULSE_USER", "Email of the user commands act as"),
    ("RUST_LOG", "Log filter, e.g. tagpulse=debug"),
];

#[derive(Parser)]
#[command(name = "tagpulse")]
#[command(version)]
#[command(
    about = "Hashtag tagging and engagement analytics for a social posting backend",
    long_about = r#"tagpulse runs the content pipeline and the analytics engine from the command line:

• Hashtag extraction and keyword sentiment on every post and comment
• Likes, bookmarks and a paginated feed
• Role-scoped analytics: totals, daily series, top hashtags, listings
• In-memory demo store or a persistent Redis store

Commands:
  seed        Load the demo dataset
  user        Register users
  post        Create, update, delete and show posts
  comment     Comment on posts
  like        Like / unlike / bookmark / unbookmark a post
  feed        Browse the newest posts
  analytics   Overview, listings and the global snapshot
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file
    #[arg(long, env = "TAGPULSE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Storage backend (overrides [store] backend)
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    /// Redis URL (overrides [redis] url)
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Key prefix (overrides [store] prefix)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Email of the user to act as
    #[arg(long = "as", env = "TAGPULSE_USER", default_value = DEMO_EMAIL, global = true)]
    acting_as: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            output_format: self.output,
            quiet: self.quiet,
            verbose: self.verbose,
            no_color: self.no_color,
        }
    }

    /// Parses arguments with the themed help. Help and version go to stdout,
    /// usage errors to stderr, each framed by blank lines.
    fn parse_with_styles() -> Self {
        let matches = match build_cli_command().styles(help_styles()).try_get_matches() {
            Ok(matches) => matches,
            Err(err) => report_clap_error(err),
        };
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn report_clap_error(err: clap::error::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = blank_line(io::stdout());
            print_clap_output(&err);
            let _ = blank_line(io::stdout());
            std::process::exit(0);
        }
        ErrorKind::MissingSubcommand => {
            let mut command = build_cli_command().styles(help_styles());
            let name = command.get_name().to_string();
            let mut stderr = io::stderr();
            let _ = blank_line(&mut stderr);
            let _ = writeln!(stderr, "error: '{name}' requires a subcommand but one was not provided\n");
            if command.write_long_help(&mut stderr).is_ok() {
                let _ = blank_line(&mut stderr);
            }
            let _ = blank_line(&mut stderr);
            std::process::exit(err.exit_code());
        }
        _ => {
            let _ = blank_line(io::stderr());
            print_clap_output(&err);
            let _ = blank_line(io::stderr());
            std::process::exit(err.exit_code());
        }
    }
}

fn print_clap_output(err: &clap::error::Error) {
    if let Err(print_err) = err.print()
        && print_err.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("Failed to write to the terminal: {print_err}");
    }
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .after_long_help(render_appendix(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });

    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            *subcommand = subcommand
                .clone()
                .after_long_help(render_examples(example.groups, use_color));
        }
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let paint = Painter(use_color);
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", paint.bold("Examples:", THEME.heading));

    let sections: Vec<String> = groups
        .iter()
        .map(|group| {
            let mut section = format!("  {}\n", paint.bold(group.title, THEME.accent));
            for line in group.commands {
                let _ = writeln!(
                    section,
                    "    {} {}",
                    paint.plain(ICONS.arrow, THEME.dim),
                    paint.plain(line, THEME.command)
                );
            }
            section
        })
        .collect();
    buffer.push_str(&sections.join("\n"));
    buffer
}

fn render_appendix(use_color: bool) -> String {
    let paint = Painter(use_color);
    let mut buffer = String::new();

    let _ = writeln!(buffer, "{}", paint.bold("Environment Variables:", THEME.heading));
    let width = ENVIRONMENT_VARIABLES.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, description) in ENVIRONMENT_VARIABLES {
        let padded = format!("{key:<width$}");
        let _ = writeln!(
            buffer,
            "  {}  {}",
            paint.bold(&padded, THEME.label),
            paint.plain(description, THEME.text)
        );
    }

    let _ = writeln!(
        buffer,
        "\n{} {}",
        paint.bold("Tip:", THEME.heading),
        paint.plain("Run 'tagpulse <command> --help' for examples.", THEME.command)
    );
    buffer
}

/// Applies theme colors only when the terminal supports them.
#[derive(Clone, Copy)]
struct Painter(bool);

impl Painter {
    fn plain(self, text: &str, color: ThemeColor) -> String {
        if self.0 { text.color(color).to_string() } else { text.to_string() }
    }

    fn bold(self, text: &str, color: ThemeColor) -> String {
        if self.0 { text.color(color).bold().to_string() } else { text.to_string() }
    }
}

fn blank_line(mut out: impl IoWrite) -> io::Result<()> {
    out.write_all(b"\n")?;
    out.flush()
}

fn help_styles() -> Styles {
    let style = |color: ThemeColor| Style::new().fg_color(Some(clap_color(color)));
    Styles::styled()
        .usage(style(THEME.accent).bold())
        .header(style(THEME.heading).bold())
        .literal(style(THEME.command))
        .placeholder(style(THEME.dim))
        .valid(style(THEME.success))
        .invalid(style(THEME.warning))
        .error(style(THEME.error).bold())
}

fn clap_color(color: ThemeColor) -> ClapColor {
    let ansi = match color {
        ThemeColor::TrueColor { r, g, b } => return ClapColor::Rgb(RgbColor(r, g, b)),
        ThemeColor::Black => AnsiColor::Black,
        ThemeColor::Red => AnsiColor::Red,
        ThemeColor::Green => AnsiColor::Green,
        ThemeColor::Yellow => AnsiColor::Yellow,
        ThemeColor::Blue => AnsiColor::Blue,
        ThemeColor::Magenta => AnsiColor::Magenta,
        ThemeColor::Cyan => AnsiColor::Cyan,
        ThemeColor::White => AnsiColor::White,
        ThemeColor::BrightBlack => AnsiColor::BrightBlack,
        ThemeColor::BrightRed => AnsiColor::BrightRed,
        ThemeColor::BrightGreen => AnsiColor::BrightGreen,
        ThemeColor::BrightYellow => AnsiColor::BrightYellow,
        ThemeColor::BrightBlue => AnsiColor::BrightBlue,
        ThemeColor::BrightMagenta => AnsiColor::BrightMagenta,
        ThemeColor::BrightCyan => AnsiColor::BrightCyan,
        ThemeColor::BrightWhite => AnsiColor::BrightWhite,
    };
    ClapColor::Ansi(ansi)
}

#[derive(Subcommand)]
enum Commands {
    /// Replace all data with the deterministic demo dataset
    Seed(SeedArgs),

    /// Manage users
    #[command(subcommand)]
    User(UserCommands),

    /// Create, update, delete and show posts
    #[command(subcommand)]
    Post(PostCommands),

    /// Comment on posts
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Like a post
    Like(PostTarget),

    /// Remove your like from a post
    Unlike(PostTarget),

    /// Bookmark a post
    Bookmark(PostTarget),

    /// Remove your bookmark from a post
    Unbookmark(PostTarget),

    /// Browse the newest posts
    Feed(FeedArgs),

    /// Role-scoped analytics
    #[command(subcommand)]
    Analytics(AnalyticsCommands),
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    let global_options = cli.global_options();
    if global_options.no_color {
        colored::control::set_override(false);
    }
    let output = OutputManager::new(global_options);

    let _ = blank_line(io::stdout());

    match execute(cli, &output).await {
        Ok(()) => {
            let _ = blank_line(io::stdout());
        }
        Err(err) => {
            output.error(&format!("{err:#}"));
            let _ = blank_line(io::stdout());
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let ctx = AppContext::load(cli.config.as_deref())?;
    if let Some(path) = &ctx.config_path {
        output.verbose(&format!("Loaded {}", path.display()));
    }

    let backend = cli.backend.unwrap_or(ctx.config.store.backend);
    let prefix = cli.prefix.unwrap_or_else(|| ctx.config.store.prefix.clone());
    let analytics = ctx.config.analytics;
    if output.options.verbose {
        output.key_value("backend", &format!("{backend:?}").to_lowercase());
        output.key_value("prefix", &prefix);
    }

    match backend {
        Backend::Memory => {
            let app = App {
                store: MemoryStore::new(),
                broadcaster: ChannelHub::new(),
                analytics,
                acting_as: cli.acting_as,
            };
            if !matches!(cli.command, Commands::Seed(_)) {
                seed_demo(&app.content(), SeedOptions::default())
                    .await
                    .context("Failed to seed the in-memory store")?;
                output.verbose("memory backend: demo data loaded, changes are discarded on exit");
            }
            dispatch(cli.command, &app, output).await
        }
        Backend::Redis => {
            let url = match cli.redis_url {
                Some(url) => {
                    validate_redis_url(&url)?;
                    url
                }
                None => ctx
                    .redis_url()
                    .context("Set REDIS_URL or [redis] url in tagpulse.toml to use the redis backend")?,
            };
            output.verbose(&format!("Connecting to Redis (prefix '{prefix}')"));
            let store = RedisStore::connect(&url, prefix.clone())
                .await
                .context("Failed to connect to Redis")?;
            let broadcaster = RedisPublisher::new(store.connection(), prefix);
            let app = App {
                store,
                broadcaster,
                analytics,
                acting_as: cli.acting_as,
            };
            dispatch(cli.command, &app, output).await
        }
    }
}

async fn dispatch<S, B>(command: Commands, app: &App<S, B>, output: &OutputManager) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    match command {
        Commands::Seed(args) => handle_seed(args, app, output).await?,
        Commands::User(user_cmd) => handle_user_commands(user_cmd, app, output).await?,
        Commands::Post(post_cmd) => handle_post_commands(post_cmd, app, output).await?,
        Commands::Comment(comment_cmd) => handle_comment_commands(comment_cmd, app, output).await?,
        Commands::Like(target) => handle_engage(EngagementKind::Like, target, app, output).await?,
        Commands::Unlike(target) => handle_disengage(EngagementKind::Like, target, app, output).await?,
        Commands::Bookmark(target) => handle_engage(EngagementKind::Bookmark, target, app, output).await?,
        Commands::Unbookmark(target) => handle_disengage(EngagementKind::Bookmark, target, app, output).await?,
        Commands::Feed(args) => handle_feed(args, app, output).await?,
        Commands::Analytics(analytics_cmd) => handle_analytics_commands(analytics_cmd, app, output).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_leave_the_command_intact() {
        let cli = Cli::try_parse_from(["tagpulse", "--output", "json", "-q", "feed", "--hashtag", "rust"]).unwrap();
        let options = cli.global_options();
        assert_eq!(options.output_format, OutputFormat::Json);
        assert!(options.quiet);
        assert!(!options.verbose);

        let Commands::Feed(args) = cli.command else {
            panic!("expected the feed command");
        };
        assert_eq!(args.hashtag.as_deref(), Some("rust"));
    }

    #[test]
    fn every_example_names_a_subcommand() {
        let command = Cli::command();
        for example in command_examples() {
            assert!(command.find_subcommand(example.name).is_some(), "{}", example.name);
        }
    }
}
