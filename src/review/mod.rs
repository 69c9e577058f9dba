//! Derived views: morning brief, evening check-in, week status, dashboard,
//! and the weekly and monthly reviews.
//!
//! Each builder reads what it needs from a [`Tracker`](crate::tracker::Tracker)
//! at a given wall-clock `now` and returns a plain struct. Rendering is the
//! struct's `Display` impl, so the CLI only prints.

pub mod daily;
pub mod dashboard;
pub mod period;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::UeResult;
use crate::stats;
use crate::task::Task;
use crate::tracker::Tracker;

pub use daily::{EveningCheckIn, MorningBrief, WeekStatus};
pub use dashboard::Dashboard;
pub use period::{MonthReview, WeekReview};

/// How far back the missed-day hint looks.
pub const MISSED_LOOKBACK_DAYS: u32 = 14;

/// History window used when computing streaks.
pub const STREAK_WINDOW_DAYS: i64 = 60;

/// Midnight at the start of `date`.
pub(crate) fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Consecutive unlogged days before `today`, oldest first.
pub fn missed_days(tracker: &Tracker, today: NaiveDate) -> UeResult<Vec<NaiveDate>> {
    let from = today - Duration::days(i64::from(MISSED_LOOKBACK_DAYS));
    let records = tracker
        .blocks()
        .completions_between(from, today - Duration::days(1))?;
    Ok(stats::missed_days(&records, today, MISSED_LOOKBACK_DAYS))
}

/// Count items by a string key; most frequent first, then alphabetical.
pub(crate) fn count_by<'a, I>(keys: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// `email_sent` → `Email Sent`.
pub(crate) fn kind_label(kind: &str) -> String {
    kind.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `today`, `tomorrow` or `in N days`.
pub(crate) fn due_phrase(days_until: i64) -> String {
    match days_until {
        0 => "today".into(),
        1 => "tomorrow".into(),
        n => format!("in {n} days"),
    }
}

pub(crate) fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// One task line: title, category and due information.
pub(crate) fn task_line(task: &Task, today: NaiveDate) -> String {
    let mut line = String::new();
    if task.priority == crate::task::TaskPriority::High {
        line.push_str("! ");
    }
    line.push_str(&task.title);
    if let Some(category) = &task.category {
        line.push_str(&format!(" ({category})"));
    }
    match (task.due_date(), &task.due) {
        (Some(due), _) if due < today => line.push_str(&format!(" (overdue: {due})")),
        (Some(due), _) if due == today => line.push_str(" (due today)"),
        (_, Some(raw)) => line.push_str(&format!(" (due {raw})")),
        (_, None) => {}
    }
    line
}

/// The "you didn't log" hint shared by several views.
pub(crate) fn write_missed_hint(f: &mut fmt::Formatter<'_>, missed: &[NaiveDate]) -> fmt::Result {
    match missed {
        [] => Ok(()),
        [only] => writeln!(
            f,
            "\nYou didn't log anything on {}. Run `ue catchup` to fill it in.",
            only.format("%b %d")
        ),
        [first, .., last] => writeln!(
            f,
            "\nYou didn't log anything on {} - {}. Run `ue catchup` to fill them in.",
            first.format("%b %d"),
            last.format("%b %d")
        ),
    }
}
