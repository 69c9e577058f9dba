//! Streaks, completion rates and week-over-week trends.
//!
//! Everything here is a pure function over completion records; none of it
//! fails. Empty input gives zeros and empty lists.

use std::collections::HashSet;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::block::CompletionRecord;
use crate::temporal::WeekWindow;

/// Consecutive completed days for `name`, counting back from `today`.
///
/// No record for `today` yet does not break the streak; counting then starts
/// at yesterday. Any other gap, skip or partial ends it.
pub fn streak(name: &str, completions: &[CompletionRecord], today: NaiveDate) -> u32 {
    let done: HashSet<NaiveDate> = completions
        .iter()
        .filter(|r| r.name == name && r.is_completed())
        .map(|r| r.date)
        .collect();

    let mut day = today;
    if !done.contains(&day) {
        let today_recorded = completions
            .iter()
            .any(|r| r.name == name && r.date == today);
        if today_recorded {
            return 0;
        }
        day -= Duration::days(1);
    }

    let mut count = 0;
    while done.contains(&day) {
        count += 1;
        day -= Duration::days(1);
    }
    count
}

/// Percentage of the target reached. Daily blocks (`target = 0`) are measured
/// against the days elapsed. A zero denominator yields 0.
pub fn completion_rate(completed: u32, target: u32, days_elapsed: u32) -> f64 {
    let denominator = if target == 0 { days_elapsed } else { target };
    if denominator == 0 {
        0.0
    } else {
        f64::from(completed) / f64::from(denominator) * 100.0
    }
}

/// Direction of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => "→",
        }
    }
}

/// Week-over-week comparison for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekDelta {
    pub delta: i64,
    pub trend: Trend,
    /// Nothing last week, something this week.
    pub is_new: bool,
}

impl fmt::Display for WeekDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_new {
            f.write_str("new")
        } else if self.delta == 0 {
            f.write_str("→ same")
        } else {
            write!(f, "{} {:+}", self.trend.arrow(), self.delta)
        }
    }
}

pub fn week_over_week_delta(current: u32, previous: u32) -> WeekDelta {
    let delta = i64::from(current) - i64::from(previous);
    let trend = match delta.signum() {
        1 => Trend::Up,
        -1 => Trend::Down,
        _ => Trend::Flat,
    };
    WeekDelta {
        delta,
        trend,
        is_new: previous == 0 && current > 0,
    }
}

/// Dates before `today` with no record of any status, scanning back from
/// yesterday and stopping at the first recorded date or after
/// `lookback_limit` days. Oldest first.
pub fn missed_days(
    completions: &[CompletionRecord],
    today: NaiveDate,
    lookback_limit: u32,
) -> Vec<NaiveDate> {
    let recorded: HashSet<NaiveDate> = completions.iter().map(|r| r.date).collect();
    let mut missed = Vec::new();
    for back in 1..=i64::from(lookback_limit) {
        let day = today - Duration::days(back);
        if recorded.contains(&day) {
            break;
        }
        missed.push(day);
    }
    missed.reverse();
    missed
}

/// Completed records for `name` in each window.
pub fn weekly_counts(
    name: &str,
    completions: &[CompletionRecord],
    weeks: &[WeekWindow],
) -> Vec<u32> {
    weeks
        .iter()
        .map(|w| {
            completions
                .iter()
                .filter(|r| r.name == name && r.is_completed() && w.contains(r.date))
                .count() as u32
        })
        .collect()
}

/// Average rate over `weeks` weeks given the total completed.
pub fn average_rate(total: u32, target: u32, weeks: u32) -> f64 {
    let per_week = if target == 0 { 7 } else { target };
    let denominator = per_week * weeks;
    if denominator == 0 {
        0.0
    } else {
        f64::from(total) / f64::from(denominator) * 100.0
    }
}

/// Compare the second half of `counts` with the first: more than 20% higher
/// is up, more than 20% lower is down.
pub fn velocity_trend(counts: &[u32]) -> Trend {
    let mid = counts.len() / 2;
    let first: u32 = counts[..mid].iter().sum();
    let second: u32 = counts[mid..].iter().sum();
    let (first, second) = (f64::from(first), f64::from(second));
    if second > first * 1.2 {
        Trend::Up
    } else if second < first * 0.8 {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// Index of the first week with the highest non-zero count.
pub fn peak_week(counts: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &count) in counts.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, c)| count > c) {
            best = Some((i, count));
        }
    }
    best.map(|(i, _)| i)
}

/// Weekly pacing band used by the status view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pace {
    Met,
    Close,
    Behind,
}

impl Pace {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Met => "met",
            Self::Close => "close",
            Self::Behind => "behind",
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Weekly blocks are close at half the target; daily blocks one day behind.
pub fn pace(completed: u32, target: u32, days_elapsed: u32) -> Pace {
    if target == 0 {
        if completed >= days_elapsed {
            Pace::Met
        } else if completed + 1 >= days_elapsed {
            Pace::Close
        } else {
            Pace::Behind
        }
    } else if completed >= target {
        Pace::Met
    } else if completed >= target / 2 {
        Pace::Close
    } else {
        Pace::Behind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::CompletionStatus;
    use crate::temporal::trailing_weeks;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn done(name: &str, days: &[u32]) -> Vec<CompletionRecord> {
        days.iter()
            .map(|&d| CompletionRecord::completed(name, date(d)))
            .collect()
    }

    #[test]
    fn streak_stops_at_gap() {
        let records = done("Read", &[20, 19, 18, 16]);
        assert_eq!(streak("Read", &records, date(20)), 3);
    }

    #[test]
    fn streak_tolerates_missing_today() {
        let records = done("Read", &[19, 18]);
        assert_eq!(streak("Read", &records, date(20)), 2);
        assert_eq!(streak("Other", &records, date(20)), 0);
        assert_eq!(streak("Read", &[], date(20)), 0);
    }

    #[test]
    fn skip_breaks_streak() {
        let mut records = done("Read", &[18, 17]);
        records.push(CompletionRecord::new("Read", date(19), CompletionStatus::Skipped));
        assert_eq!(streak("Read", &records, date(20)), 0);

        records.push(CompletionRecord::new("Read", date(20), CompletionStatus::Partial));
        assert_eq!(streak("Read", &records, date(20)), 0);
    }

    #[test]
    fn rates() {
        assert_eq!(completion_rate(3, 4, 2), 75.0);
        assert_eq!(completion_rate(2, 0, 4), 50.0);
        assert_eq!(completion_rate(2, 0, 0), 0.0);
        assert_eq!(average_rate(14, 0, 4), 50.0);
        assert_eq!(average_rate(6, 3, 4), 50.0);
        assert_eq!(average_rate(1, 3, 0), 0.0);
    }

    #[test]
    fn deltas() {
        let up = week_over_week_delta(4, 2);
        assert_eq!((up.delta, up.trend, up.is_new), (2, Trend::Up, false));
        assert_eq!(up.to_string(), "↑ +2");
        let down = week_over_week_delta(1, 3);
        assert_eq!(down.trend, Trend::Down);
        assert_eq!(down.to_string(), "↓ -2");
        assert_eq!(week_over_week_delta(2, 2).trend, Trend::Flat);
        assert!(week_over_week_delta(2, 0).is_new);
        assert!(!week_over_week_delta(0, 0).is_new);
    }

    #[test]
    fn missed_days_stop_at_first_record() {
        // Today is the 20th; a record 6 days ago, none in the last 5.
        let records = done("Any", &[14]);
        let missed = missed_days(&records, date(20), 14);
        assert_eq!(missed, vec![date(15), date(16), date(17), date(18), date(19)]);
    }

    #[test]
    fn missed_days_counts_any_status_and_caps() {
        let records = vec![CompletionRecord::new("X", date(19), CompletionStatus::Skipped)];
        assert!(missed_days(&records, date(20), 14).is_empty());
        assert_eq!(missed_days(&[], date(20), 3).len(), 3);
        assert_eq!(missed_days(&[], date(20), 3)[0], date(17));
    }

    #[test]
    fn weekly_counts_follow_windows() {
        let weeks = trailing_weeks(date(24), 4);
        let records = done("Gym", &[1, 2, 8, 22, 23, 24]);
        assert_eq!(weekly_counts("Gym", &records, &weeks), vec![2, 1, 0, 3]);
    }

    #[test]
    fn velocity_and_peak() {
        assert_eq!(velocity_trend(&[1, 1, 2, 2]), Trend::Up);
        assert_eq!(velocity_trend(&[3, 3, 1, 1]), Trend::Down);
        assert_eq!(velocity_trend(&[2, 2, 2, 2]), Trend::Flat);
        assert_eq!(velocity_trend(&[]), Trend::Flat);
        assert_eq!(peak_week(&[1, 3, 3, 0]), Some(1));
        assert_eq!(peak_week(&[0, 0]), None);
    }

    #[test]
    fn pace_bands() {
        assert_eq!(pace(5, 5, 3), Pace::Met);
        assert_eq!(pace(2, 5, 3), Pace::Close);
        assert_eq!(pace(1, 5, 3), Pace::Behind);
        assert_eq!(pace(3, 0, 3), Pace::Met);
        assert_eq!(pace(2, 0, 3), Pace::Close);
        assert_eq!(pace(1, 0, 3), Pace::Behind);
    }
}
