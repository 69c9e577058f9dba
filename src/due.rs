//! Natural-language due dates.
//!
//! Understands `today`, `tomorrow`, weekday names and their common
//! abbreviations, and `next <weekday>`. Anything else is assumed to already be
//! a canonical `YYYY-MM-DD` date and is passed through untouched, without
//! validation.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::temporal::weekday_index;

/// Outcome of parsing a due-date token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DueDate {
    /// The token named a date relative to today.
    Date(NaiveDate),
    /// Unrecognized token, kept exactly as the user typed it.
    Verbatim(String),
}

impl DueDate {
    /// Canonical string form: ISO date, or the original token.
    pub fn as_string(&self) -> String {
        match self {
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Verbatim(raw) => raw.clone(),
        }
    }

    /// The resolved date, if the token was recognized or is a valid ISO date.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Verbatim(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        }
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Map a weekday word to its index (Monday = 0).
fn weekday_from_label(s: &str) -> Option<u32> {
    match s {
        "monday" | "mon" => Some(0),
        "tuesday" | "tue" | "tues" => Some(1),
        "wednesday" | "wed" | "weds" => Some(2),
        "thursday" | "thu" | "thur" | "thurs" => Some(3),
        "friday" | "fri" => Some(4),
        "saturday" | "sat" => Some(5),
        "sunday" | "sun" => Some(6),
        _ => None,
    }
}

/// Days until the next `target` weekday strictly after `today` (1..=7).
fn days_until(today: NaiveDate, target: u32) -> i64 {
    let ahead = i64::from(target) - i64::from(weekday_index(today));
    if ahead <= 0 { ahead + 7 } else { ahead }
}

/// Parse a due-date token relative to `today`.
pub fn parse_due_date(token: &str, today: NaiveDate) -> DueDate {
    let lower = token.trim().to_lowercase();

    if lower == "today" {
        return DueDate::Date(today);
    }
    if lower == "tomorrow" {
        return DueDate::Date(today + Duration::days(1));
    }
    if let Some(rest) = lower.strip_prefix("next ") {
        return match weekday_from_label(rest.trim()) {
            Some(target) => DueDate::Date(today + Duration::days(days_until(today, target) + 7)),
            None => DueDate::Verbatim(token.to_string()),
        };
    }
    match weekday_from_label(&lower) {
        Some(target) => DueDate::Date(today + Duration::days(days_until(today, target))),
        None => DueDate::Verbatim(token.to_string()),
    }
}

/// The date due tokens resolve against: the calendar date of `now`, without
/// the 2am shift, so `today` never lands before what `overdue` calls today.
pub fn due_reference(now: NaiveDateTime) -> NaiveDate {
    now.date()
}

/// Parse an optional CLI value; empty input means "no due date".
pub fn parse_optional(token: Option<&str>, today: NaiveDate) -> Option<DueDate> {
    token
        .filter(|t| !t.trim().is_empty())
        .map(|t| parse_due_date(t, today))
}
