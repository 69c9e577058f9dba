//! Day-scale views: morning brief, evening check-in and week-to-date status.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::activity::{ActivityFilter, kinds};
use crate::block::{CompletionRecord, RecurrenceTarget};
use crate::error::UeResult;
use crate::review::{
    count_by, day_start, due_phrase, missed_days, plural, task_line, write_missed_hint,
};
use crate::risk::{self, BlockRisk, Focus, RiskStatus};
use crate::stats::{self, Pace};
use crate::task::{Task, TaskFilter};
use crate::temporal::{days_elapsed, effective_date, week_bounds};
use crate::tracker::Tracker;

/// Entries shown in the morning risk headline.
const HEADLINE_MAX: usize = 3;
/// Deadlines listed in the morning brief.
const DEADLINES_MAX: usize = 5;
/// Days ahead the morning brief looks for deadlines.
const DEADLINE_WINDOW_DAYS: u32 = 7;

fn risk_phrase(risk: &BlockRisk) -> String {
    match risk.status {
        RiskStatus::Impossible => format!("{}: {} - can't hit target", risk.name, risk.progress_label()),
        RiskStatus::AtRisk => format!("{}: {} - at risk", risk.name, risk.progress_label()),
        RiskStatus::TryToDo => format!("{}: {} - try to do", risk.name, risk.progress_label()),
        RiskStatus::DailyPending => format!("{}: not done today", risk.name),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Morning brief
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct MorningBrief {
    pub today: NaiveDate,
    pub overdue: Vec<Task>,
    /// Upcoming deadlines with days until due.
    pub deadlines: Vec<(Task, i64)>,
    /// Headline risks; empty when every block is on track.
    pub risks: Vec<BlockRisk>,
    pub focus: Option<Focus>,
    /// Commits this week per repository, busiest first.
    pub commits: Vec<(String, usize)>,
    pub missed: Vec<NaiveDate>,
}

impl MorningBrief {
    pub fn build(tracker: &Tracker, now: NaiveDateTime) -> UeResult<Self> {
        let today = effective_date(now);
        let tasks = tracker.tasks();

        let overdue = tasks.overdue(now.date())?;
        let deadlines = tasks
            .upcoming(today, DEADLINE_WINDOW_DAYS)?
            .into_iter()
            .filter(|t| !overdue.iter().any(|o| o.id == t.id))
            .take(DEADLINES_MAX)
            .filter_map(|t| {
                let days = (t.due_date()? - today).num_days();
                Some((t, days))
            })
            .collect();

        let all_risks = tracker.risks(today)?;
        let focus = risk::suggest_focus(&all_risks);
        let risks = risk::headline(&all_risks, HEADLINE_MAX)
            .into_iter()
            .cloned()
            .collect();

        let (monday, _) = week_bounds(today, 0);
        let commit_log = tracker
            .activity()
            .query(&ActivityFilter::since(day_start(monday)).kind(kinds::COMMIT))?;
        let repos: Vec<String> = commit_log
            .iter()
            .filter(|r| r.payload_json().is_some())
            .map(|r| r.payload_field("repo").unwrap_or_else(|| "unknown".into()))
            .collect();
        let commits = count_by(repos.iter().map(String::as_str));

        Ok(Self {
            today,
            overdue,
            deadlines,
            risks,
            focus,
            commits,
            missed: missed_days(tracker, today)?,
        })
    }
}

impl fmt::Display for MorningBrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Good morning! {}", self.today.format("%A, %B %d, %Y"))?;

        if !self.overdue.is_empty() {
            writeln!(f, "\nOVERDUE")?;
            for t in &self.overdue {
                let due = t.due.as_ref().map(|d| d.as_string()).unwrap_or_default();
                writeln!(f, "  #{} {} (was due {due})", t.id, t.title)?;
            }
        }

        if !self.deadlines.is_empty() {
            writeln!(f, "\nDEADLINES")?;
            for (t, days) in &self.deadlines {
                writeln!(f, "  #{} {} ({})", t.id, t.title, due_phrase(*days))?;
            }
        }

        if self.risks.is_empty() {
            writeln!(f, "\nAll blocks on track")?;
        } else {
            writeln!(f, "\nBLOCKS")?;
            for r in &self.risks {
                writeln!(f, "  {}", risk_phrase(r))?;
            }
        }

        if !self.commits.is_empty() {
            writeln!(f, "\nCOMMITS THIS WEEK")?;
            for (repo, n) in &self.commits {
                writeln!(f, "  {repo}: {}", plural(*n, "commit"))?;
            }
        }

        write_missed_hint(f, &self.missed)?;

        writeln!(f, "\nSUGGESTED FOCUS")?;
        match &self.focus {
            Some(focus) => writeln!(f, "  {focus}"),
            None => writeln!(f, "  All blocks on track - nice!"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Evening check-in
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct EveningCheckIn {
    pub today: NaiveDate,
    /// Today's activity per kind.
    pub activity: Vec<(String, usize)>,
    /// Blocks already logged today.
    pub logged: Vec<CompletionRecord>,
    /// Blocks still waiting for a record today.
    pub pending: Vec<RecurrenceTarget>,
    /// The two most urgent risks, for tomorrow.
    pub tomorrow: Vec<BlockRisk>,
    pub missed: Vec<NaiveDate>,
}

impl EveningCheckIn {
    pub fn build(tracker: &Tracker, now: NaiveDateTime) -> UeResult<Self> {
        let today = effective_date(now);
        let blocks = tracker.blocks();

        let today_log = tracker
            .activity()
            .query(&ActivityFilter::since(day_start(today)))?;
        let activity = count_by(today_log.iter().map(|r| r.kind.as_str()));

        let records = blocks.completions_on(today)?;
        let mut logged = Vec::new();
        let mut pending = Vec::new();
        for target in blocks.targets()? {
            // Once-a-week blocks drop out after they are met.
            if target.weekly_target == 1 && blocks.week_completed_count(&target.name, today)? >= 1 {
                continue;
            }
            match records.iter().find(|r| r.name == target.name) {
                Some(record) => logged.push(record.clone()),
                None => pending.push(target),
            }
        }

        let mut tomorrow = tracker.risks(today)?;
        tomorrow.truncate(2);

        Ok(Self {
            today,
            activity,
            logged,
            pending,
            tomorrow,
            missed: missed_days(tracker, today)?,
        })
    }
}

impl fmt::Display for EveningCheckIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evening review, {}", self.today.format("%A, %B %d"))?;

        if !self.activity.is_empty() {
            writeln!(f, "\nTODAY'S ACTIVITY")?;
            for (kind, n) in &self.activity {
                writeln!(f, "  {kind}: {n}")?;
            }
        }

        writeln!(f, "\nBLOCK CHECK-IN")?;
        for r in &self.logged {
            writeln!(f, "  {}: {}", r.name, r.status)?;
        }
        for t in &self.pending {
            writeln!(f, "  {}: not logged (ue block done|skip|partial \"{}\")", t.name, t.name)?;
        }
        if self.logged.is_empty() && self.pending.is_empty() {
            writeln!(f, "  No blocks to check in")?;
        }

        if !self.tomorrow.is_empty() {
            writeln!(f, "\nTOMORROW'S PRIORITY")?;
            for r in &self.tomorrow {
                writeln!(
                    f,
                    "  {}: {} remaining, {} left",
                    r.name,
                    r.remaining,
                    plural(r.days_left as usize, "day")
                )?;
            }
        }

        write_missed_hint(f, &self.missed)?;
        writeln!(f, "\nGood night!")
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Week status
// ═══════════════════════════════════════════════════════════════════════

/// This week's progress for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockProgress {
    pub name: String,
    pub completed: u32,
    pub target: u32,
    pub pace: Pace,
}

#[derive(Debug, Clone)]
pub struct WeekStatus {
    pub today: NaiveDate,
    pub week_start: NaiveDate,
    pub days_elapsed: u32,
    pub blocks: Vec<BlockProgress>,
    pub completed_tasks: Vec<Task>,
    pub pending_tasks: Vec<Task>,
    pub overdue_ids: Vec<u64>,
    pub missed: Vec<NaiveDate>,
}

impl WeekStatus {
    pub fn build(tracker: &Tracker, now: NaiveDateTime) -> UeResult<Self> {
        let today = effective_date(now);
        let (week_start, _) = week_bounds(today, 0);
        let elapsed = days_elapsed(today);
        let blocks = tracker.blocks();

        let mut progress = Vec::new();
        for target in blocks.targets()? {
            let completed = blocks.week_completed_count(&target.name, today)?;
            progress.push(BlockProgress {
                pace: stats::pace(completed, target.weekly_target, elapsed),
                name: target.name,
                completed,
                target: target.weekly_target,
            });
        }

        let tasks = tracker.tasks();
        let overdue_ids = tasks.overdue(now.date())?.iter().map(|t| t.id).collect();

        Ok(Self {
            today,
            week_start,
            days_elapsed: elapsed,
            blocks: progress,
            completed_tasks: tasks.completed_since(day_start(week_start))?,
            pending_tasks: tasks.list(&TaskFilter::default())?,
            overdue_ids,
            missed: missed_days(tracker, today)?,
        })
    }
}

impl fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Week status - {} to {} ({})",
            self.week_start.format("%b %d"),
            self.today.format("%b %d"),
            self.today.format("%A")
        )?;

        if !self.blocks.is_empty() {
            writeln!(f, "\nBlocks")?;
            for b in &self.blocks {
                let progress = if b.target == 0 {
                    format!("{}/{} days", b.completed, self.days_elapsed)
                } else {
                    format!("{}/{}", b.completed, b.target)
                };
                writeln!(f, "  {}: {progress} [{}]", b.name, b.pace)?;
            }
        }

        writeln!(f, "\nTasks")?;
        writeln!(f, "  Completed this week: {}", self.completed_tasks.len())?;
        writeln!(f, "  Still pending:       {}", self.pending_tasks.len())?;
        if !self.overdue_ids.is_empty() {
            writeln!(f, "  Overdue:             {}", self.overdue_ids.len())?;
        }

        if self.completed_tasks.is_empty() {
            writeln!(f, "\nNo tasks completed this week yet")?;
        } else {
            writeln!(f, "\nCompleted this week ({})", self.completed_tasks.len())?;
            for t in &self.completed_tasks {
                let day = t
                    .completed_at
                    .map(|at| at.format("%a").to_string())
                    .unwrap_or_default();
                writeln!(f, "  #{} {} {day}", t.id, t.title)?;
            }
        }

        if self.pending_tasks.is_empty() {
            writeln!(f, "\nAll tasks complete!")?;
        } else {
            writeln!(f, "\nStill to do ({})", self.pending_tasks.len())?;
            for t in &self.pending_tasks {
                writeln!(f, "  #{} {}", t.id, task_line(t, self.today))?;
            }
        }

        write_missed_hint(f, &self.missed)
    }
}
