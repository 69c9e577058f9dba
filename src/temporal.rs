//! Temporal reference: the effective day and Monday-anchored weeks.
//!
//! Two rules govern every date computed by the tracker:
//!
//! - **Effective day**: the day boundary sits at 02:00, so anything logged
//!   between midnight and 2am counts toward the previous calendar day.
//! - **Week**: always Monday through Sunday. No Sunday-start or ISO-week
//!   numbering is used anywhere downstream.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Hour (exclusive) before which the effective day is still "yesterday".
pub const DAY_BOUNDARY_HOUR: u32 = 2;

/// Compute the effective calendar date for a wall-clock instant.
pub fn effective_date(now: NaiveDateTime) -> NaiveDate {
    if now.hour() < DAY_BOUNDARY_HOUR {
        (now - Duration::days(1)).date()
    } else {
        now.date()
    }
}

/// `date` minus `days`, saturating at [`NaiveDate::MIN`].
pub fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Weekday index with Monday = 0 and Sunday = 6.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// Days of the week already started, including `date` (Monday = 1).
pub fn days_elapsed(date: NaiveDate) -> u32 {
    weekday_index(date) + 1
}

/// Days left in the week after `date`, as used by the risk classifier.
pub fn days_left(date: NaiveDate) -> u32 {
    6 - weekday_index(date)
}

/// Return `(monday, sunday)` of the week containing `reference`, shifted back
/// by `weeks_ago` whole weeks.
pub fn week_bounds(reference: NaiveDate, weeks_ago: u32) -> (NaiveDate, NaiveDate) {
    let monday = reference
        - Duration::days(i64::from(weekday_index(reference)))
        - Duration::weeks(i64::from(weeks_ago));
    (monday, monday + Duration::days(6))
}

/// A closed Monday–Sunday window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    /// The week containing `reference`, `weeks_ago` weeks back.
    pub fn containing(reference: NaiveDate, weeks_ago: u32) -> Self {
        let (start, end) = week_bounds(reference, weeks_ago);
        Self { start, end }
    }

    /// Whether `date` falls inside the window (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The last `count` weeks up to and including the current one, oldest first.
pub fn trailing_weeks(reference: NaiveDate, count: u32) -> Vec<WeekWindow> {
    (0..count)
        .rev()
        .map(|weeks_ago| WeekWindow::containing(reference, weeks_ago))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        d.and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn half_past_midnight_is_yesterday() {
        let today = date(2024, 1, 10);
        assert_eq!(effective_date(at(today, 0, 30)), date(2024, 1, 9));
    }

    #[test]
    fn two_am_sharp_is_today() {
        let today = date(2024, 1, 10);
        assert_eq!(effective_date(at(today, 2, 0)), today);
        assert_eq!(effective_date(at(today, 14, 0)), today);
    }

    #[test]
    fn early_monday_belongs_to_previous_week() {
        let monday = date(2024, 1, 8);
        let eff = effective_date(at(monday, 1, 59));
        assert_eq!(eff, date(2024, 1, 7));
        assert_eq!(week_bounds(eff, 0).0, date(2024, 1, 1));
    }

    #[test]
    fn week_bounds_of_wednesday() {
        assert_eq!(
            week_bounds(date(2024, 1, 10), 0),
            (date(2024, 1, 8), date(2024, 1, 14))
        );
        assert_eq!(
            week_bounds(date(2024, 1, 10), 1),
            (date(2024, 1, 1), date(2024, 1, 7))
        );
    }

    #[test]
    fn week_bounds_on_sunday_and_monday() {
        assert_eq!(week_bounds(date(2024, 1, 14), 0).0, date(2024, 1, 8));
        assert_eq!(week_bounds(date(2024, 1, 8), 0).1, date(2024, 1, 14));
    }

    #[test]
    fn look_back_saturates() {
        let today = date(2024, 1, 10);
        assert_eq!(days_before(today, 9), date(2024, 1, 1));
        assert_eq!(days_before(today, 0), today);
        assert_eq!(days_before(today, u32::MAX), NaiveDate::MIN);
    }

    #[test]
    fn elapsed_and_left() {
        let wednesday = date(2024, 1, 10);
        assert_eq!(weekday_index(wednesday), 2);
        assert_eq!(days_elapsed(wednesday), 3);
        assert_eq!(days_left(wednesday), 4);
        assert_eq!(days_left(date(2024, 1, 14)), 0);
    }

    #[test]
    fn trailing_weeks_oldest_first() {
        let weeks = trailing_weeks(date(2024, 1, 10), 4);
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0].start, date(2023, 12, 18));
        assert_eq!(weeks[3].start, date(2024, 1, 8));
        assert!(weeks[3].contains(date(2024, 1, 14)));
        assert!(!weeks[3].contains(date(2024, 1, 15)));
    }
}
