//! Demo data for trying the tool without touching a real store.
//!
//! Seeding is refused unless the tracker was opened in demo mode, which
//! points it at a separate data directory and config file.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::activity::NewActivity;
use crate::block::{CompletionRecord, CompletionStatus};
use crate::config::{Config, Priority};
use crate::due::DueDate;
use crate::error::{TrackerError, UeResult};
use crate::task::{NewTask, TaskPriority};
use crate::temporal::week_bounds;
use crate::tracker::Tracker;

const CATEGORIES: [(&str, Priority, &str); 4] = [
    ("work", Priority::High, "green"),
    ("side-project", Priority::Mid, "yellow"),
    ("learning", Priority::Mid, "blue"),
    ("health", Priority::Low, "red"),
];

const TARGETS: [(&str, u32, &str); 5] = [
    ("Deep Work", 5, "work"),
    ("Exercise", 4, "health"),
    ("Reading", 3, "learning"),
    ("Side Project", 2, "side-project"),
    ("Meditation", 0, "health"),
];

/// What `seed_demo` wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub categories: usize,
    pub targets: usize,
    pub completions: usize,
    pub tasks: usize,
    pub wins: usize,
}

fn upsert_category(
    config: &mut Config,
    name: &str,
    priority: Priority,
    color: &str,
) -> UeResult<()> {
    if config.categories.contains_key(name) {
        config.set_category(name, Some(priority), Some(color))?;
    } else {
        config.add_category(name, priority, color)?;
    }
    Ok(())
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
}

/// Populate a demo store relative to `today`.
///
/// Completions cover the days of this week before `today`, so the risk
/// views show a mix of on-track, at-risk and pending blocks.
pub fn seed_demo(tracker: &mut Tracker, today: NaiveDate) -> UeResult<DemoSummary> {
    if !tracker.is_demo() {
        return Err(TrackerError::NotDemoMode.into());
    }
    let mut summary = DemoSummary::default();

    for (name, priority, color) in CATEGORIES {
        upsert_category(tracker.config_mut(), name, priority, color)?;
        summary.categories += 1;
    }
    tracker.save_config()?;

    let blocks = tracker.blocks();
    for (name, weekly, category) in TARGETS {
        blocks.set_target(name, weekly, Some(category.to_string()))?;
        summary.targets += 1;
    }

    let (monday, _) = week_bounds(today, 0);
    let mut day = monday;
    let mut index = 0u32;
    while day < today {
        let mut records = vec![
            CompletionRecord::completed("Meditation", day).with_duration(Some(10)),
            CompletionRecord::completed("Deep Work", day).with_duration(Some(120)),
        ];
        if index % 2 == 0 {
            records.push(CompletionRecord::completed("Exercise", day).with_duration(Some(45)));
        } else {
            records.push(
                CompletionRecord::new("Reading", day, CompletionStatus::Partial)
                    .with_note(Some("two chapters".into())),
            );
        }
        for record in &records {
            blocks.log_completion(record)?;
            summary.completions += 1;
        }
        day += Duration::days(1);
        index += 1;
    }

    let tasks = tracker.tasks();
    let created = at(monday, 9);
    let seeded = [
        NewTask {
            title: "Send quarterly report".into(),
            due: Some(DueDate::Date(today - Duration::days(1))),
            category: Some("work".into()),
            priority: TaskPriority::High,
            note: None,
        },
        NewTask {
            title: "Review pull requests".into(),
            due: Some(DueDate::Date(today + Duration::days(2))),
            category: Some("work".into()),
            ..Default::default()
        },
        NewTask {
            title: "Book dentist appointment".into(),
            due: Some(DueDate::Date(today + Duration::days(5))),
            category: Some("health".into()),
            priority: TaskPriority::Low,
            note: None,
        },
        NewTask {
            title: "Draft blog outline".into(),
            category: Some("side-project".into()),
            ..Default::default()
        },
    ];
    for new in seeded {
        tasks.add(new, created)?;
        summary.tasks += 1;
    }
    let done = tasks.add(
        NewTask {
            title: "Set up weekly review".into(),
            category: Some("learning".into()),
            ..Default::default()
        },
        created,
    )?;
    tasks.complete(done.id, at(today, 10))?;
    summary.tasks += 1;

    let log = tracker.activity();
    log.append(
        NewActivity::win("Shipped the onboarding flow", Some("work".into()), None),
        at(monday, 17),
    )?;
    log.append(
        NewActivity::win(
            "Ran 10k without stopping",
            Some("health".into()),
            Some("new personal best"),
        ),
        at(today, 8),
    )?;
    summary.wins = 2;

    tracing::info!(
        targets = summary.targets,
        completions = summary.completions,
        tasks = summary.tasks,
        "seeded demo data"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UeError;
    use crate::risk::RiskStatus;
    use crate::task::TaskFilter;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn refuses_outside_demo_mode() {
        let mut tracker = Tracker::in_memory(Config::default());
        let err = seed_demo(&mut tracker, date(10)).unwrap_err();
        assert!(matches!(err, UeError::Tracker(TrackerError::NotDemoMode)));
        assert!(tracker.blocks().all_targets().unwrap().is_empty());
    }

    #[test]
    fn seeds_a_mixed_week() {
        let mut tracker = Tracker::in_memory(Config::default()).with_demo(true);
        // Wednesday: Monday and Tuesday get completions.
        let summary = seed_demo(&mut tracker, date(10)).unwrap();
        assert_eq!(summary.targets, 5);
        assert_eq!(summary.completions, 6);
        assert_eq!(summary.tasks, 5);

        assert_eq!(
            tracker.config().category_priority(Some("work")),
            Some(Priority::High)
        );
        let pending = tracker.tasks().list(&TaskFilter::default()).unwrap();
        assert_eq!(pending.len(), 4);
        assert_eq!(tracker.tasks().overdue(date(10)).unwrap().len(), 1);

        let risks = tracker.risks(date(10)).unwrap();
        assert!(risks.iter().any(|r| r.name == "Meditation" && r.status == RiskStatus::DailyPending));
        assert!(risks.iter().any(|r| r.name == "Deep Work"));
    }
}
