//! Weekly risk classification for recurring blocks.
//!
//! Given the active targets and this week's completion records, decide which
//! blocks need attention today. Blocks that are on track are omitted. The
//! classifier is a pure function of its inputs: it reads no clock and no
//! global configuration.
//!
//! For a weekly block with `remaining = target - completed` and
//! `slack = days_left - remaining`:
//!
//! | Condition                                         | Status        |
//! |---------------------------------------------------|---------------|
//! | `remaining <= 0`                                  | omitted       |
//! | `remaining > days_left`                           | `impossible`  |
//! | `slack <= 1`                                      | `at_risk`     |
//! | high/mid category and `completed < target / 2`    | `try_to_do`   |
//! | low category and `slack <= 2`                     | `try_to_do`   |
//! | otherwise                                         | omitted       |
//!
//! Daily blocks (`weekly_target = 0`) are `daily_pending` until a completed
//! record exists for today.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::block::{CompletionRecord, RecurrenceTarget};
use crate::config::{Config, Priority, priority_rank};
use crate::temporal::{WeekWindow, days_left};

/// Why a block is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    /// The target can no longer be reached this week.
    Impossible,
    /// At most one day of slack remains.
    AtRisk,
    /// Behind a comfortable pace for its category.
    TryToDo,
    /// Daily block not yet done today.
    DailyPending,
}

impl RiskStatus {
    /// Lower is more severe.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Impossible => 0,
            Self::AtRisk => 1,
            Self::TryToDo => 2,
            Self::DailyPending => 3,
        }
    }

    /// Impossible and at-risk blocks always make the headline.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Impossible | Self::AtRisk)
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Impossible => "impossible",
            Self::AtRisk => "at_risk",
            Self::TryToDo => "try_to_do",
            Self::DailyPending => "daily_pending",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One flagged block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRisk {
    pub name: String,
    pub status: RiskStatus,
    /// Completed records this week.
    pub completed: u32,
    /// Weekly target; 0 for daily blocks.
    pub target: u32,
    /// Completions still needed (1 for a pending daily block).
    pub remaining: u32,
    pub days_left: u32,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

impl BlockRisk {
    /// `3/5` for weekly blocks, `daily` otherwise.
    pub fn progress_label(&self) -> String {
        if self.target == 0 {
            "daily".into()
        } else {
            format!("{}/{}", self.completed, self.target)
        }
    }
}

/// Classify every active target as of `today`.
///
/// `completions` may contain records from any dates; only those inside the
/// Monday–Sunday week of `today` count. The result is ordered by severity,
/// then category priority (high, mid, low, none), otherwise in input order.
pub fn classify(
    targets: &[RecurrenceTarget],
    completions: &[CompletionRecord],
    today: NaiveDate,
    config: &Config,
) -> Vec<BlockRisk> {
    let week = WeekWindow::containing(today, 0);
    let left = days_left(today);
    let mut risks = Vec::new();

    for target in targets.iter().filter(|t| t.active) {
        let priority = config.category_priority(target.category.as_deref());
        let completed = completions
            .iter()
            .filter(|r| r.name == target.name && r.is_completed() && week.contains(r.date))
            .count() as u32;

        let flag = |status: RiskStatus, remaining: u32| BlockRisk {
            name: target.name.clone(),
            status,
            completed,
            target: target.weekly_target,
            remaining,
            days_left: left,
            category: target.category.clone(),
            priority,
        };

        if target.is_daily() {
            let done_today = completions
                .iter()
                .any(|r| r.name == target.name && r.date == today && r.is_completed());
            if !done_today {
                risks.push(flag(RiskStatus::DailyPending, 1));
            }
            continue;
        }

        if completed >= target.weekly_target {
            continue;
        }
        let remaining = target.weekly_target - completed;
        let slack = i64::from(left) - i64::from(remaining);

        let status = if remaining > left {
            Some(RiskStatus::Impossible)
        } else if slack <= 1 {
            Some(RiskStatus::AtRisk)
        } else {
            match priority {
                Some(Priority::High | Priority::Mid) if completed * 2 < target.weekly_target => {
                    Some(RiskStatus::TryToDo)
                }
                Some(Priority::Low) if slack <= 2 => Some(RiskStatus::TryToDo),
                _ => None,
            }
        };
        if let Some(status) = status {
            risks.push(flag(status, remaining));
        }
    }

    risks.sort_by_key(|r| (r.status.severity(), priority_rank(r.priority)));
    risks
}

/// Every critical entry, then the best-ranked others until `max` entries.
///
/// Critical entries are never dropped, so the result can exceed `max`.
pub fn headline(risks: &[BlockRisk], max: usize) -> Vec<&BlockRisk> {
    let mut out: Vec<&BlockRisk> = risks.iter().filter(|r| r.status.is_critical()).collect();
    for risk in risks.iter().filter(|r| !r.status.is_critical()) {
        if out.len() >= max {
            break;
        }
        out.push(risk);
    }
    out
}

/// What to work on first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    /// A single block that needs attention now.
    Block(BlockRisk),
    /// Only daily blocks are pending.
    Dailies(Vec<String>),
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(r) if r.status.is_critical() => {
                write!(f, "Priority: {} ({} - {})", r.name, r.progress_label(), r.status)
            }
            Self::Block(r) => write!(f, "Try to do: {} ({})", r.name, r.progress_label()),
            Self::Dailies(names) => write!(f, "Today: {}", names.join(", ")),
        }
    }
}

/// Pick a focus: the first critical block, else the first try-to-do block,
/// else the pending dailies.
pub fn suggest_focus(risks: &[BlockRisk]) -> Option<Focus> {
    if let Some(r) = risks.iter().find(|r| r.status.is_critical()) {
        return Some(Focus::Block(r.clone()));
    }
    if let Some(r) = risks.iter().find(|r| r.status == RiskStatus::TryToDo) {
        return Some(Focus::Block(r.clone()));
    }
    let dailies: Vec<String> = risks
        .iter()
        .filter(|r| r.status == RiskStatus::DailyPending)
        .map(|r| r.name.clone())
        .collect();
    if dailies.is_empty() {
        None
    } else {
        Some(Focus::Dailies(dailies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::CompletionStatus;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn target(name: &str, weekly: u32, category: Option<&str>) -> RecurrenceTarget {
        RecurrenceTarget::new(name, weekly, category.map(str::to_string))
    }

    fn done(name: &str, days: &[u32]) -> Vec<CompletionRecord> {
        days.iter()
            .map(|&d| CompletionRecord::completed(name, date(d)))
            .collect()
    }

    fn statuses(risks: &[BlockRisk]) -> Vec<(&str, RiskStatus)> {
        risks.iter().map(|r| (r.name.as_str(), r.status)).collect()
    }

    // 2024-01-08 is Monday, 01-12 Friday, 01-13 Saturday, 01-14 Sunday.

    #[test]
    fn at_risk_with_zero_slack() {
        let risks = classify(
            &[target("Deep Work", 5, None)],
            &done("Deep Work", &[8, 9, 10]),
            date(12),
            &Config::default(),
        );
        assert_eq!(risks.len(), 1);
        let r = &risks[0];
        assert_eq!(r.status, RiskStatus::AtRisk);
        assert_eq!((r.completed, r.remaining, r.days_left), (3, 2, 2));
    }

    #[test]
    fn impossible_when_remaining_exceeds_days_left() {
        let risks = classify(
            &[target("Deep Work", 5, None)],
            &done("Deep Work", &[8]),
            date(13),
            &Config::default(),
        );
        assert_eq!(statuses(&risks), vec![("Deep Work", RiskStatus::Impossible)]);
        assert_eq!(risks[0].remaining, 4);
        assert_eq!(risks[0].days_left, 1);
    }

    #[test]
    fn daily_pending_until_completed_today() {
        let targets = [target("Meditation", 0, None)];
        let config = Config::default();
        let risks = classify(&targets, &[], date(10), &config);
        assert_eq!(statuses(&risks), vec![("Meditation", RiskStatus::DailyPending)]);
        assert_eq!(risks[0].progress_label(), "daily");

        let skipped = [CompletionRecord::new("Meditation", date(10), CompletionStatus::Skipped)];
        assert_eq!(classify(&targets, &skipped, date(10), &config).len(), 1);

        let completed = done("Meditation", &[10]);
        assert!(classify(&targets, &completed, date(10), &config).is_empty());
    }

    #[test]
    fn met_targets_and_inactive_blocks_are_omitted() {
        let mut inactive = target("Old", 5, None);
        inactive.active = false;
        let risks = classify(
            &[target("Gym", 2, None), inactive],
            &done("Gym", &[8, 9]),
            date(13),
            &Config::default(),
        );
        assert!(risks.is_empty());
    }

    #[test]
    fn try_to_do_depends_on_category_priority() {
        // Monday: days_left = 6. Target 3, none done: remaining 3, slack 3.
        let config = Config::default();
        let targets = [
            target("Research", 3, Some("ai-research")),
            target("Consult", 3, Some("consulting")),
            target("Loose", 3, None),
        ];
        let risks = classify(&targets, &[], date(8), &config);
        assert_eq!(statuses(&risks), vec![("Research", RiskStatus::TryToDo)]);

        // Wednesday: days_left = 4, remaining 2, slack 2; low priority now flags.
        let risks = classify(
            &targets,
            &[done("Research", &[8]), done("Consult", &[8]), done("Loose", &[8])].concat(),
            date(10),
            &config,
        );
        let names: Vec<&str> = risks.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Research", "Consult"]);
    }

    #[test]
    fn unconfigured_category_has_no_priority() {
        let risks = classify(
            &[target("Side", 3, Some("unknown"))],
            &[],
            date(8),
            &Config::default(),
        );
        assert!(risks.is_empty());
    }

    #[test]
    fn ordering_by_severity_then_priority() {
        let config = Config::default();
        let targets = [
            target("Meditation", 0, Some("ai-research")),
            target("Blog", 6, Some("blog")),
            target("Consult", 6, Some("consulting")),
            target("Research", 6, Some("ai-research")),
            target("Dead", 7, None),
        ];
        // Tuesday: days_left 5. Target 6 with 0 done is impossible; 7 too.
        let risks = classify(&targets, &[], date(9), &config);
        let names: Vec<&str> = risks.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Research", "Blog", "Consult", "Dead", "Meditation"]);
    }

    #[test]
    fn only_this_weeks_records_count() {
        let risks = classify(
            &[target("Gym", 2, None)],
            &done("Gym", &[6, 7]),
            date(13),
            &Config::default(),
        );
        assert_eq!(statuses(&risks), vec![("Gym", RiskStatus::Impossible)]);
        assert_eq!(risks[0].completed, 0);
    }

    #[test]
    fn classify_is_idempotent_and_tolerates_empty_input() {
        let config = Config::default();
        assert!(classify(&[], &[], date(10), &config).is_empty());
        let targets = [target("A", 4, Some("blog")), target("B", 0, None)];
        let records = done("A", &[8]);
        assert_eq!(
            classify(&targets, &records, date(11), &config),
            classify(&targets, &records, date(11), &config)
        );
    }

    #[test]
    fn headline_keeps_all_critical() {
        let config = Config::default();
        let targets = [
            target("A", 7, None),
            target("B", 7, None),
            target("C", 7, None),
            target("D", 7, None),
            target("Daily", 0, None),
        ];
        let risks = classify(&targets, &[], date(9), &config);
        assert_eq!(headline(&risks, 3).len(), 4);

        let calm = classify(&[target("Daily", 0, None), target("M", 0, None)], &[], date(9), &config);
        assert_eq!(headline(&calm, 1).len(), 1);
    }

    #[test]
    fn focus_prefers_critical_then_try_to_do_then_dailies() {
        let config = Config::default();
        let risks = classify(
            &[target("Daily", 0, None), target("Research", 3, Some("ai-research"))],
            &[],
            date(8),
            &config,
        );
        match suggest_focus(&risks) {
            Some(Focus::Block(r)) => assert_eq!(r.name, "Research"),
            other => panic!("unexpected focus: {other:?}"),
        }

        let dailies = classify(&[target("Daily", 0, None)], &[], date(8), &config);
        let focus = suggest_focus(&dailies);
        assert_eq!(focus, Some(Focus::Dailies(vec!["Daily".to_string()])));
        assert_eq!(focus.unwrap().to_string(), "Today: Daily");
        assert_eq!(suggest_focus(&[]), None);
    }
}
