use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::{Color as ThemeColor, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;

use tagpulse::{
    Comment, Overview, Paginated, Post, PostDetail, SentimentLabel, Snapshot, User,
    analytics::{DailyStat, HashtagCount, PageMeta},
    content::{CommentView, FeedItem},
    seed::SeedReport,
};

use crate::theme::{ICONS, THEME};

/// How command results are rendered.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Table,
    /// Pretty JSON; status lines are kept off stdout.
    Json,
    /// One line per record.
    Compact,
}

#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Renders a result as a table or as compact text.
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Prints command results and status lines according to [`GlobalOptions`].
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }
        let rendered = match self.options.output_format {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Table => data.to_table(&self.options).to_string(),
            OutputFormat::Compact => data.to_compact(),
        };
        println!("{rendered}");
        Ok(())
    }

    pub fn success(&self, message: &str) {
        self.status(Stream::Stdout, ICONS.success, THEME.success, message);
    }

    /// Always printed, even with `--quiet`.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(ICONS.error, THEME.error, message));
    }

    pub fn warning(&self, message: &str) {
        self.status(Stream::Stderr, ICONS.warning, THEME.warning, message);
    }

    /// Printed only with `--verbose`.
    pub fn verbose(&self, message: &str) {
        if self.options.verbose {
            self.status(Stream::Stderr, ICONS.arrow, THEME.dim, message);
        }
    }

    pub fn info(&self, message: &str) {
        self.status(Stream::Stdout, ICONS.info, THEME.info, message);
    }

    pub fn heading(&self, text: &str) {
        if self.shows_stdout_status() {
            let text = if self.options.no_color {
                text.to_string()
            } else {
                text.color(THEME.accent).bold().to_string()
            };
            println!("{text}");
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.shows_stdout_status() {
            if self.options.no_color {
                println!("{key}: {value}");
            } else {
                println!("{}: {}", key.color(THEME.label).bold(), value.color(THEME.text));
            }
        }
    }

    pub fn bullet(&self, text: &str) {
        if self.shows_stdout_status() {
            let glyph = if self.options.no_color {
                ICONS.bullet.to_string()
            } else {
                ICONS.bullet.color(THEME.dim).to_string()
            };
            println!("  {glyph} {text}");
        }
    }

    /// Status lines on stdout would corrupt JSON output.
    fn shows_stdout_status(&self) -> bool {
        !self.options.quiet && self.options.output_format != OutputFormat::Json
    }

    fn status(&self, stream: Stream, icon: &str, color: ThemeColor, message: &str) {
        match stream {
            Stream::Stdout if self.shows_stdout_status() => println!("{}", self.line(icon, color, message)),
            Stream::Stderr if !self.options.quiet => eprintln!("{}", self.line(icon, color, message)),
            _ => {}
        }
    }

    fn line(&self, icon: &str, color: ThemeColor, message: &str) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }
}

fn new_table(options: &GlobalOptions) -> Table {
    let mut table = Table::new();
    if options.no_color {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    } else {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    }
    table
}

fn set_header(table: &mut Table, options: &GlobalOptions, headers: &[&str]) {
    let cells: Vec<Cell> = headers
        .iter()
        .map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            tinted(cell, THEME.heading, options)
        })
        .collect();
    table.set_header(cells);
}

fn key_value_table(options: &GlobalOptions, rows: Vec<(&str, String)>) -> Table {
    let mut table = new_table(options);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    table
}

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn sentiment_cell(label: SentimentLabel, score: f64, options: &GlobalOptions) -> Cell {
    let cell = Cell::new(format!("{label} ({score:+.1})"));
    match label {
        SentimentLabel::Positive => tinted(cell, THEME.positive, options),
        SentimentLabel::Negative => tinted(cell, THEME.negative, options),
        SentimentLabel::Neutral => cell,
    }
}

fn tinted(cell: Cell, color: ThemeColor, options: &GlobalOptions) -> Cell {
    if options.no_color {
        return cell;
    }
    let color = match color {
        ThemeColor::Black => TableColor::Black,
        ThemeColor::Red | ThemeColor::BrightRed => TableColor::Red,
        ThemeColor::Green | ThemeColor::BrightGreen => TableColor::Green,
        ThemeColor::Yellow | ThemeColor::BrightYellow => TableColor::Yellow,
        ThemeColor::Blue | ThemeColor::BrightBlue => TableColor::Blue,
        ThemeColor::Magenta | ThemeColor::BrightMagenta => TableColor::Magenta,
        ThemeColor::Cyan | ThemeColor::BrightCyan => TableColor::Cyan,
        ThemeColor::White | ThemeColor::BrightWhite => TableColor::White,
        ThemeColor::BrightBlack => TableColor::Grey,
        ThemeColor::TrueColor { r, g, b } => TableColor::Rgb { r, g, b },
    };
    cell.fg(color)
}

fn meta_compact(meta: &PageMeta) -> String {
    format!(
        "page={}/{} total={}",
        meta.current_page, meta.total_pages, meta.total_count
    )
}

fn hashtag_list(tags: &[String]) -> String {
    tags.iter().map(|tag| format!("#{tag}")).collect::<Vec<_>>().join(" ")
}

fn hashtag_cell(tags: &[String], options: &GlobalOptions) -> Cell {
    tinted(Cell::new(hashtag_list(tags)), THEME.hashtag, options)
}

impl TableDisplay for SeedReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("Users", self.users.to_string()),
                ("Posts", self.posts.to_string()),
                ("Comments", self.comments.to_string()),
            ],
        )
    }

    fn to_compact(&self) -> String {
        format!("users={} posts={} comments={}", self.users, self.posts, self.comments)
    }
}

impl TableDisplay for User {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("ID", self.id.clone()),
                ("Email", self.email.clone()),
                ("Role", self.role.to_string()),
                ("Created", format_datetime(self.created_at)),
            ],
        )
    }

    fn to_compact(&self) -> String {
        format!("{} {} {}", self.id, self.email, self.role)
    }
}

impl TableDisplay for Post {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = key_value_table(
            options,
            vec![
                ("ID", self.id.clone()),
                ("Content", self.content.clone()),
                ("Hashtags", hashtag_list(&self.hashtags)),
                ("Likes", self.likes_count.to_string()),
                ("Created", format_datetime(self.created_at)),
                ("Updated", format_datetime(self.updated_at)),
            ],
        );
        table.add_row(vec![
            Cell::new("Sentiment").add_attribute(Attribute::Bold),
            sentiment_cell(self.sentiment_label, self.sentiment_score, options),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "{} {} [{}] {}",
            self.id,
            self.sentiment_label,
            self.hashtags.join(","),
            self.likes_count
        )
    }
}

impl TableDisplay for Comment {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = key_value_table(
            options,
            vec![
                ("ID", self.id.clone()),
                ("Post", self.post_id.clone()),
                ("Content", self.content.clone()),
                ("Created", format_datetime(self.created_at)),
            ],
        );
        table.add_row(vec![
            Cell::new("Sentiment").add_attribute(Attribute::Bold),
            sentiment_cell(self.sentiment_label, self.sentiment_score, options),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{} {} {}", self.id, self.post_id, self.sentiment_label)
    }
}

fn comments_table(comments: &[CommentView], options: &GlobalOptions) -> Table {
    let mut table = new_table(options);
    set_header(&mut table, options, &["ID", "Author", "Content", "Sentiment", "Created"]);
    for view in comments {
        table.add_row(vec![
            Cell::new(&view.comment.id),
            Cell::new(&view.user.email),
            Cell::new(&view.comment.content),
            sentiment_cell(view.comment.sentiment_label, view.comment.sentiment_score, options),
            Cell::new(format_datetime(view.comment.created_at)),
        ]);
    }
    table
}

impl TableDisplay for PostDetail {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = self.post.to_table(options);
        table.add_row(vec![Cell::new("Author").add_attribute(Attribute::Bold), Cell::new(&self.user.email)]);
        table.add_row(vec![
            Cell::new("Comments").add_attribute(Attribute::Bold),
            Cell::new(comments_table(&self.comments, options).to_string()),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{} by {} ({} comments)", self.post.id, self.user.email, self.comments.len())
    }
}

/// Comments on one post.
#[derive(Serialize)]
#[serde(transparent)]
pub struct CommentList(pub Vec<CommentView>);

impl TableDisplay for CommentList {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        comments_table(&self.0, options)
    }

    fn to_compact(&self) -> String {
        format!("Count: {}", self.0.len())
    }
}

/// One feed page.
#[derive(Serialize)]
#[serde(transparent)]
pub struct Feed(pub Vec<FeedItem>);

impl TableDisplay for Feed {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options);
        if self.0.is_empty() {
            table.add_row(vec![Cell::new("No posts found")]);
            return table;
        }
        set_header(&mut table, options, &["ID", "Author", "Content", "Hashtags", "Likes", "Comments", ""]);
        for item in &self.0 {
            let mut flags = String::new();
            if item.liked_by_current_user {
                flags.push_str(ICONS.heart);
            }
            if item.bookmarked_by_current_user {
                flags.push_str(ICONS.bookmark);
            }
            table.add_row(vec![
                Cell::new(&item.id),
                Cell::new(&item.user.email),
                Cell::new(tagpulse::analytics::truncate(&item.content)),
                hashtag_cell(&item.hashtags, options),
                Cell::new(item.likes_count),
                Cell::new(item.comments.len()),
                Cell::new(flags),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("Count: {}", self.0.len())
    }
}

fn daily_table(stats: &[DailyStat], options: &GlobalOptions) -> Table {
    let mut table = new_table(options);
    set_header(&mut table, options, &["Date", "Posts", "Comments"]);
    for stat in stats {
        table.add_row(vec![
            Cell::new(stat.date),
            Cell::new(stat.posts),
            Cell::new(stat.comments),
        ]);
    }
    table
}

fn hashtags_table(hashtags: &[HashtagCount], options: &GlobalOptions) -> Table {
    let mut table = new_table(options);
    set_header(&mut table, options, &["Hashtag", "Posts"]);
    for entry in hashtags {
        table.add_row(vec![Cell::new(format!("#{}", entry.name)), Cell::new(entry.count)]);
    }
    table
}

impl TableDisplay for Overview {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options);
        set_header(&mut table, options, &["Section", ""]);
        table.add_row(vec![
            Cell::new("Totals"),
            Cell::new(format!(
                "posts: {}  comments: {}  hashtags: {}",
                self.totals.posts, self.totals.comments, self.totals.hashtags
            )),
        ]);
        table.add_row(vec![Cell::new("Daily"), Cell::new(daily_table(&self.daily_stats, options).to_string())]);
        table.add_row(vec![
            Cell::new("Top hashtags"),
            Cell::new(hashtags_table(&self.top_hashtags, options).to_string()),
        ]);
        table.add_row(vec![
            Cell::new(format!("Posts ({})", meta_compact(&self.posts_meta))),
            Cell::new(
                self.posts
                    .iter()
                    .map(|post| format!("{}  {}  {}", post.id, post.user_email, post.content))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        ]);
        table.add_row(vec![
            Cell::new(format!("Comments ({})", meta_compact(&self.comments_meta))),
            Cell::new(
                self.comments
                    .iter()
                    .map(|comment| format!("{}  {}  {}", comment.id, comment.user_email, comment.content))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "posts={} comments={} hashtags={} days={} top={}",
            self.totals.posts,
            self.totals.comments,
            self.totals.hashtags,
            self.daily_stats.len(),
            self.top_hashtags
                .iter()
                .map(|entry| format!("{}:{}", entry.name, entry.count))
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}

impl TableDisplay for Paginated {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options);
        match self {
            Paginated::Posts(page) => {
                set_header(&mut table, options, &["ID", "Author", "Content", "Hashtags", "Likes", "Created"]);
                for post in &page.data {
                    table.add_row(vec![
                        Cell::new(&post.id),
                        Cell::new(&post.user_email),
                        Cell::new(&post.content),
                        hashtag_cell(&post.hashtags, options),
                        Cell::new(post.likes_count),
                        Cell::new(format_datetime(post.created_at)),
                    ]);
                }
            }
            Paginated::Comments(page) => {
                set_header(&mut table, options, &["ID", "Author", "Content", "Post", "Created"]);
                for comment in &page.data {
                    table.add_row(vec![
                        Cell::new(&comment.id),
                        Cell::new(&comment.user_email),
                        Cell::new(&comment.content),
                        Cell::new(&comment.post_id),
                        Cell::new(format_datetime(comment.created_at)),
                    ]);
                }
            }
        }
        table.add_row(vec![Cell::new(meta_compact(self.meta())).add_attribute(Attribute::Italic)]);
        table
    }

    fn to_compact(&self) -> String {
        format!("items={} {}", self.len(), meta_compact(self.meta()))
    }
}

impl TableDisplay for Snapshot {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options);
        set_header(&mut table, options, &["Date", "Posts"]);
        for day in &self.daily_posts {
            table.add_row(vec![Cell::new(day.date), Cell::new(day.count)]);
        }
        table.add_row(vec![
            Cell::new("Top hashtags").add_attribute(Attribute::Bold),
            Cell::new(hashtags_table(&self.top_hashtags, options).to_string()),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        let posts: u64 = self.daily_posts.iter().map(|day| day.count).sum();
        format!("posts={posts} days={} top={}", self.daily_posts.len(), self.top_hashtags.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagpulse::analytics::{PageResult, PostSummary};

    fn sample_page() -> Paginated {
        Paginated::Posts(PageResult {
            data: vec![PostSummary {
                id: "p1".to_string(),
                content: "Hello #world".to_string(),
                hashtags: vec!["world".to_string()],
                likes_count: 3,
                created_at: Utc::now(),
                user_email: "demo@example.com".to_string(),
            }],
            meta: PageMeta {
                current_page: 1,
                total_pages: 1,
                total_count: 1,
            },
        })
    }

    #[test]
    fn test_output_manager_json() {
        let options = GlobalOptions {
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        let manager = OutputManager::new(options);
        assert!(manager.display(&sample_page()).is_ok());
    }

    #[test]
    fn test_status_lines_stay_off_json_stdout() {
        let json = OutputManager::new(GlobalOptions {
            output_format: OutputFormat::Json,
            ..Default::default()
        });
        assert!(!json.shows_stdout_status());
        assert!(OutputManager::new(GlobalOptions::default()).shows_stdout_status());
    }

    #[test]
    fn test_output_manager_quiet() {
        let options = GlobalOptions {
            quiet: true,
            ..Default::default()
        };
        let manager = OutputManager::new(options);
        assert!(manager.display(&sample_page()).is_ok());
    }

    #[test]
    fn test_page_renders_rows_and_meta() {
        let options = GlobalOptions {
            no_color: true,
            ..Default::default()
        };
        let page = sample_page();
        let rendered = page.to_table(&options).to_string();
        assert!(rendered.contains("demo@example.com"));
        assert!(rendered.contains("#world"));
        assert_eq!(page.to_compact(), "items=1 page=1/1 total=1");
    }

    #[test]
    fn test_seed_report_compact() {
        let report = SeedReport {
            users: 10,
            posts: 120,
            comments: 180,
        };
        assert_eq!(report.to_compact(), "users=10 posts=120 comments=180");
    }
}
