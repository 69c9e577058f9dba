//! Recurring blocks: weekly targets and dated completion records.
//!
//! A block is a named recurring commitment ("Exercise", "Deep Work") tracked
//! against a weekly frequency. `weekly_target = 0` is a sentinel for a daily
//! cadence, not "zero times per week". Completion records reference blocks by
//! name only; there is no referential integrity and no cascading delete.

use std::fmt;

use chrono::NaiveDate;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to block tracking.
#[derive(Debug, Error, Diagnostic)]
pub enum BlockError {
    #[error("block target not found: \"{name}\"")]
    #[diagnostic(
        code(ue::block::target_not_found),
        help("Create it with `ue block target \"{name}\" <weekly_count>` (0 = daily).")
    )]
    TargetNotFound { name: String },

    #[error("unknown completion status \"{value}\"")]
    #[diagnostic(
        code(ue::block::status),
        help("Valid statuses: completed, skipped, partial.")
    )]
    UnknownStatus { value: String },
}

pub type BlockResult<T> = std::result::Result<T, BlockError>;

/// A named recurring commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceTarget {
    pub name: String,
    /// Completions wanted per week; 0 means daily.
    pub weekly_target: u32,
    pub category: Option<String>,
    pub active: bool,
}

impl RecurrenceTarget {
    pub fn new(name: impl Into<String>, weekly_target: u32, category: Option<String>) -> Self {
        Self {
            name: name.into(),
            weekly_target,
            category,
            active: true,
        }
    }

    /// Whether this block expects one completion per day.
    pub fn is_daily(&self) -> bool {
        self.weekly_target == 0
    }

    /// Human label for the target: `daily` or `Nx/wk`.
    pub fn target_label(&self) -> String {
        if self.is_daily() {
            "daily".into()
        } else {
            format!("{}x/wk", self.weekly_target)
        }
    }
}

/// Outcome recorded for a block on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
    Skipped,
    Partial,
}

impl CompletionStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Partial => "partial",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "completed" | "done" => Some(Self::Completed),
            "skipped" | "skip" => Some(Self::Skipped),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl std::str::FromStr for CompletionStatus {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| BlockError::UnknownStatus { value: s.to_string() })
    }
}

/// One dated outcome for a block. Unique per `(name, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub name: String,
    pub date: NaiveDate,
    pub status: CompletionStatus,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub duration_minutes: Option<u32>,
}

impl CompletionRecord {
    /// A bare record with no reason, note or duration.
    pub fn new(name: impl Into<String>, date: NaiveDate, status: CompletionStatus) -> Self {
        Self {
            name: name.into(),
            date,
            status,
            reason: None,
            note: None,
            duration_minutes: None,
        }
    }

    pub fn completed(name: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(name, date, CompletionStatus::Completed)
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_duration(mut self, minutes: Option<u32>) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == CompletionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_sentinel() {
        let t = RecurrenceTarget::new("Meditation", 0, None);
        assert!(t.is_daily());
        assert!(t.active);
        assert_eq!(t.target_label(), "daily");
        assert_eq!(RecurrenceTarget::new("Gym", 3, None).target_label(), "3x/wk");
    }

    #[test]
    fn status_labels() {
        for status in [
            CompletionStatus::Completed,
            CompletionStatus::Skipped,
            CompletionStatus::Partial,
        ] {
            assert_eq!(CompletionStatus::from_label(status.as_label()), Some(status));
        }
        assert_eq!("done".parse::<CompletionStatus>().unwrap(), CompletionStatus::Completed);
        assert!("maybe".parse::<CompletionStatus>().is_err());
    }
}
