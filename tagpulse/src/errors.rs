use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by tagpulse services and stores.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation before any tagging or aggregation ran.
    #[error("validation failed: {}", .0.messages().join(", "))]
    Validation(#[from] ValidationError),

    /// Referenced post, comment, user or engagement does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The acting user may not mutate the target.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Infrastructure failure that does not fit the other kinds.
    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other {
            message: Cow::Owned(format!("serialization error: {err}")),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Collection of validation issues encountered while preparing a request.
#[derive(Debug, Error)]
#[error("{}", .issues.iter().map(ValidationIssue::to_message).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable messages, one per issue.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ValidationIssue::to_message).collect()
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn to_message(&self) -> String {
        format!("{} {}", self.field, self.message)
    }
}

/// Accumulates issues so callers can report every problem at once.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, code, message));
    }

    /// Returns `Err` when at least one issue was recorded.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_join_field_and_text() {
        let err = ValidationError::single("start_date", "invalid_date", "is not a valid date");
        assert_eq!(err.messages(), vec!["start_date is not a valid date".to_string()]);

        let wrapped = Error::from(err);
        assert!(wrapped.is_validation());
        assert_eq!(wrapped.to_string(), "validation failed: start_date is not a valid date");
    }

    #[test]
    fn collector_reports_all_issues() {
        let mut issues = IssueCollector::new();
        issues.push("start_date", "invalid_date", "is not a valid date");
        issues.push("end_date", "invalid_date", "is not a valid date");
        let err = issues.finish().unwrap_err();
        assert_eq!(err.issues.len(), 2);

        assert!(IssueCollector::new().finish().is_ok());
    }

    #[test]
    fn not_found_is_distinct_from_validation() {
        let err = Error::not_found("post", "abc");
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "post not found: abc");
    }
}
