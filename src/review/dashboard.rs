//! Activity dashboard: today by kind, plus the trailing week.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::activity::ActivityFilter;
use crate::error::UeResult;
use crate::review::{count_by, day_start, kind_label};
use crate::temporal::effective_date;
use crate::tracker::Tracker;

/// Descriptions shown per kind for today.
const SAMPLE_PER_KIND: usize = 3;

/// Today's activity for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSummary {
    pub kind: String,
    pub count: usize,
    /// The most recent descriptions, newest first.
    pub samples: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub today_by_kind: Vec<KindSummary>,
    /// Counts over the seven days ending today, busiest first.
    pub week_by_kind: Vec<(String, usize)>,
}

impl Dashboard {
    pub fn build(tracker: &Tracker, now: NaiveDateTime) -> UeResult<Self> {
        let today = effective_date(now);
        let activity = tracker.activity();

        let mut grouped: BTreeMap<String, KindSummary> = BTreeMap::new();
        for record in activity.query(&ActivityFilter::since(day_start(today)))? {
            let entry = grouped
                .entry(record.kind.clone())
                .or_insert_with(|| KindSummary {
                    kind: record.kind.clone(),
                    count: 0,
                    samples: Vec::new(),
                });
            entry.count += 1;
            if entry.samples.len() < SAMPLE_PER_KIND {
                entry.samples.push(record.description);
            }
        }
        let mut today_by_kind: Vec<KindSummary> = grouped.into_values().collect();
        today_by_kind.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));

        let week_start = day_start(today - Duration::days(6));
        let week = activity.query(&ActivityFilter::since(week_start))?;
        let week_by_kind = count_by(week.iter().map(|r| r.kind.as_str()));

        Ok(Self {
            today,
            today_by_kind,
            week_by_kind,
        })
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dashboard - {}", self.today.format("%A, %B %d"))?;

        writeln!(f, "\nTODAY")?;
        if self.today_by_kind.is_empty() {
            writeln!(f, "  No activity logged yet")?;
        }
        for summary in &self.today_by_kind {
            writeln!(f, "  {} ({})", kind_label(&summary.kind), summary.count)?;
            for sample in &summary.samples {
                writeln!(f, "    - {sample}")?;
            }
            let hidden = summary.count - summary.samples.len();
            if hidden > 0 {
                writeln!(f, "    ...and {hidden} more")?;
            }
        }

        writeln!(f, "\nLAST 7 DAYS")?;
        if self.week_by_kind.is_empty() {
            writeln!(f, "  Nothing logged")?;
        }
        for (kind, count) in &self.week_by_kind {
            writeln!(f, "  {:<16} {count}", kind_label(kind))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::NewActivity;
    use crate::config::Config;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn groups_today_and_trailing_week() {
        let tracker = Tracker::in_memory(Config::default());
        let log = tracker.activity();
        for (i, h) in [9, 10, 11, 12].into_iter().enumerate() {
            log.append(NewActivity::new("commit", format!("c{i}")), at(10, h))
                .unwrap();
        }
        log.append(NewActivity::win("demo went well", None, None), at(10, 13))
            .unwrap();
        log.append(NewActivity::new("email_sent", "follow up"), at(5, 9))
            .unwrap();
        // Outside the seven-day window.
        log.append(NewActivity::new("email_sent", "old"), at(1, 9))
            .unwrap();

        let dash = Dashboard::build(&tracker, at(10, 18)).unwrap();
        assert_eq!(dash.today_by_kind.len(), 2);
        let commits = &dash.today_by_kind[0];
        assert_eq!(commits.kind, "commit");
        assert_eq!(commits.count, 4);
        assert_eq!(commits.samples, vec!["c3", "c2", "c1"]);
        assert_eq!(
            dash.week_by_kind,
            vec![
                ("commit".to_string(), 4),
                ("email_sent".to_string(), 1),
                ("win".to_string(), 1),
            ]
        );

        let text = dash.to_string();
        assert!(text.contains("Commit (4)"));
        assert!(text.contains("...and 1 more"));
        assert!(text.contains("Email Sent"));
    }

    #[test]
    fn empty_dashboard() {
        let tracker = Tracker::in_memory(Config::default());
        let text = Dashboard::build(&tracker, at(10, 18)).unwrap().to_string();
        assert!(text.contains("No activity logged yet"));
        assert!(text.contains("Nothing logged"));
    }
}
