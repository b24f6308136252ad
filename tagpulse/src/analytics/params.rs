use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::{IssueCollector, ValidationError},
    store::TimeWindow,
    tagging::normalize_hashtag,
};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query parameters as they arrive from an HTTP boundary: every field is an
/// optional raw string.
#[cfg_attr(feature = "utoipa", derive(ToSchema, IntoParams))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<String>,
}

impl AnalyticsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }

    pub fn with_hashtag(mut self, hashtag: impl Into<String>) -> Self {
        self.hashtag = Some(hashtag.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>, per_page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self.per_page = Some(per_page.into());
        self
    }

    /// Normalized hashtag filter; blank input means no filter.
    pub fn hashtag_filter(&self) -> Option<String> {
        self.hashtag.as_deref().and_then(normalize_hashtag)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::parse(self.page.as_deref(), self.per_page.as_deref(), DEFAULT_PER_PAGE)
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::single(
                "start_date",
                "invalid_range",
                "must be on or before end_date",
            ));
        }
        Ok(Self { start, end })
    }

    /// `days` calendar days ending on `today`, both ends included.
    pub fn trailing(today: NaiveDate, days: u64) -> Self {
        let start = today
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// Parses optional `YYYY-MM-DD` bounds.
    ///
    /// A missing or blank start defaults to `today - default_days`, a missing
    /// end to `today`. Malformed dates are rejected, never defaulted.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
        default_days: u64,
    ) -> Result<Self, ValidationError> {
        let mut issues = IssueCollector::new();
        let start = parse_date("start_date", start, &mut issues);
        let end = parse_date("end_date", end, &mut issues);
        issues.finish()?;

        let start = start
            .flatten()
            .unwrap_or_else(|| today.checked_sub_days(Days::new(default_days)).unwrap_or(NaiveDate::MIN));
        let end = end.flatten().unwrap_or(today);
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered.
    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every day in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Timestamp window from the start of the first day to the last instant
    /// of the final day (UTC).
    pub fn window(&self) -> TimeWindow {
        TimeWindow::between(start_of_day(self.start), end_of_day(self.end))
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + TimeDelta::days(1) - TimeDelta::nanoseconds(1)
}

/// `Some(None)` when absent, `None` when malformed (issue recorded).
fn parse_date(field: &str, raw: Option<&str>, issues: &mut IssueCollector) -> Option<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Some(None);
    };
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(Some(date)),
        Err(_) => {
            issues.push(field, "invalid_date", format!("must be a date in YYYY-MM-DD format (got '{raw}')"));
            None
        }
    }
}

/// Resolved page request. Both values are at least 1; neither is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Tolerant parse: missing, non-numeric, zero or negative values fall
    /// back to the defaults.
    pub fn parse(page: Option<&str>, per_page: Option<&str>, default_per_page: u64) -> Self {
        let page = positive(page).unwrap_or(DEFAULT_PAGE);
        let per_page = positive(per_page).unwrap_or(default_per_page);
        Self::new(page, per_page)
    }

    /// Items skipped before this page; saturates for absurdly large pages.
    pub fn offset(&self) -> usize {
        let offset = (self.page - 1).saturating_mul(self.per_page);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.per_page)
    }

    pub fn meta(&self, total_count: u64) -> PageMeta {
        PageMeta {
            current_page: self.page,
            total_pages: self.total_pages(total_count),
            total_count,
        }
    }

    /// Takes this page out of an already ordered listing.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let per_page = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        items.into_iter().skip(self.offset()).take(per_page).collect()
    }
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .map(|value| value as u64)
}

/// Pagination metadata returned next to every listing.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
}
