//! Core type definitions with validation.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Strict `YYYY-MM-DD` shape; chrono alone accepts unpadded fields.
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Validation errors for user-supplied values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A date did not match `YYYY-MM-DD` or does not exist.
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// The timezone name is not one of the supported offsets.
    #[error("unsupported timezone '{value}'")]
    UnsupportedTimezone { value: String },

    /// An admin command received malformed arguments.
    #[error("invalid arguments for /{command}: {reason}")]
    InvalidArguments {
        command: &'static str,
        reason: String,
    },
}

/// A chat user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A validated task label.
///
/// Labels are trimmed free text. They are not unique: the same label may be
/// tracked many times and reports group entries by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskLabel(String);

impl TaskLabel {
    /// Creates a label from raw input, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "task name",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed, persisted unit of tracked work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: i64,
    pub user_id: UserId,
    pub label: String,
    /// Whole seconds, never negative.
    pub duration_secs: i64,
    /// The date the timer was started on.
    pub date: NaiveDate,
    /// Local clock time at which the timer was stopped, minute precision.
    pub end_clock: NaiveTime,
    pub description: Option<String>,
}

/// Parses a date typed by a user.
///
/// Only the exact `YYYY-MM-DD` form is accepted, and the date must exist.
pub fn parse_strict_date(text: &str) -> Result<NaiveDate, ValidationError> {
    let text = text.trim();
    let invalid = || ValidationError::InvalidDate {
        value: text.to_string(),
    };
    if !DATE_RE.is_match(text) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())
}

/// Formats an end clock the way it is persisted (`HH:MM`).
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parses a persisted `HH:MM` clock value.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_label_is_trimmed() {
        let label = TaskLabel::new("  Write report \n").unwrap();
        assert_eq!(label.as_str(), "Write report");
    }

    #[test]
    fn task_label_rejects_blank_input() {
        assert_eq!(
            TaskLabel::new("   "),
            Err(ValidationError::Empty {
                field: "task name"
            })
        );
    }

    #[test]
    fn strict_date_accepts_iso_dates() {
        assert_eq!(
            parse_strict_date("2025-03-07").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
        );
    }

    #[test]
    fn strict_date_rejects_malformed_and_impossible_dates() {
        for text in ["2025-13-40", "2025-3-7", "07.03.2025", "2025-02-30", "", "+2025-03-07"] {
            assert!(
                matches!(parse_strict_date(text), Err(ValidationError::InvalidDate { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn clock_round_trips_through_text() {
        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(format_clock(time), "09:05");
        assert_eq!(parse_clock("09:05"), Some(time));
        assert_eq!(parse_clock("9h05"), None);
    }

    #[test]
    fn user_id_parses_from_text() {
        assert_eq!(" 42 ".parse::<UserId>().unwrap(), UserId::new(42));
        assert!("abc".parse::<UserId>().is_err());
    }
}
