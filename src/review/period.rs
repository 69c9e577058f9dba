//! Weekly and monthly reviews.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::activity::{ActivityFilter, ActivityRecord};
use crate::block::CompletionRecord;
use crate::error::UeResult;
use crate::review::{STREAK_WINDOW_DAYS, count_by, day_start, kind_label, plural};
use crate::stats::{self, Trend, WeekDelta};
use crate::task::TaskFilter;
use crate::temporal::{WeekWindow, days_elapsed, effective_date, trailing_weeks};
use crate::tracker::Tracker;

/// Wins listed before the rest are summarized.
const WINS_SHOWN: usize = 5;
/// Weeks covered by the monthly review.
const MONTH_WEEKS: u32 = 4;
const UNASSIGNED: &str = "(unassigned)";

fn write_wins(f: &mut fmt::Formatter<'_>, wins: &[ActivityRecord]) -> fmt::Result {
    if wins.is_empty() {
        return Ok(());
    }
    writeln!(f, "\nWINS ({})", wins.len())?;
    for win in wins.iter().take(WINS_SHOWN) {
        writeln!(f, "  * {}", win.description)?;
    }
    if wins.len() > WINS_SHOWN {
        writeln!(f, "  ...and {} more", wins.len() - WINS_SHOWN)?;
    }
    Ok(())
}

/// Completion records from the streak window through `until`.
fn history_through(
    tracker: &Tracker,
    today: NaiveDate,
    from: NaiveDate,
    until: NaiveDate,
) -> UeResult<Vec<CompletionRecord>> {
    let streak_start = today - Duration::days(STREAK_WINDOW_DAYS);
    Ok(tracker
        .blocks()
        .completions_between(from.min(streak_start), until)?)
}

// ═══════════════════════════════════════════════════════════════════════
// Week review
// ═══════════════════════════════════════════════════════════════════════

/// One block's week, compared with the week before.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekBlockRow {
    pub name: String,
    pub completed: u32,
    pub target: u32,
    pub rate: f64,
    pub streak: u32,
    pub delta: WeekDelta,
}

#[derive(Debug, Clone)]
pub struct WeekReview {
    pub today: NaiveDate,
    pub week: WeekWindow,
    pub blocks: Vec<WeekBlockRow>,
    pub tasks_completed: usize,
    pub tasks_pending: usize,
    pub tasks_overdue: usize,
    /// Wins this week, newest first.
    pub wins: Vec<ActivityRecord>,
    /// Other activity this week per kind, busiest first.
    pub activity: Vec<(String, usize)>,
}

impl WeekReview {
    pub fn build(tracker: &Tracker, now: NaiveDateTime) -> UeResult<Self> {
        let today = effective_date(now);
        let week = WeekWindow::containing(today, 0);
        let previous = WeekWindow::containing(today, 1);
        let elapsed = days_elapsed(today);

        let records = history_through(tracker, today, previous.start, week.end)?;
        let mut blocks = Vec::new();
        for target in tracker.blocks().targets()? {
            let counts = stats::weekly_counts(&target.name, &records, &[previous, week]);
            let (before, completed) = (counts[0], counts[1]);
            blocks.push(WeekBlockRow {
                rate: stats::completion_rate(completed, target.weekly_target, elapsed),
                streak: stats::streak(&target.name, &records, today),
                delta: stats::week_over_week_delta(completed, before),
                name: target.name,
                completed,
                target: target.weekly_target,
            });
        }

        let tasks = tracker.tasks();
        let tasks_completed = tasks.completed_since(day_start(week.start))?.len();
        let tasks_pending = tasks.list(&TaskFilter::default())?.len();
        let tasks_overdue = tasks.overdue(now.date())?.len();

        let log = tracker
            .activity()
            .query(&ActivityFilter::since(day_start(week.start)))?;
        let (wins, rest): (Vec<ActivityRecord>, Vec<ActivityRecord>) =
            log.into_iter().partition(ActivityRecord::is_win);
        let activity = count_by(rest.iter().map(|r| r.kind.as_str()));

        Ok(Self {
            today,
            week,
            blocks,
            tasks_completed,
            tasks_pending,
            tasks_overdue,
            wins,
            activity,
        })
    }
}

impl fmt::Display for WeekReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Week in review: {} - {}",
            self.week.start.format("%b %d"),
            self.week.end.format("%b %d")
        )?;

        if !self.blocks.is_empty() {
            writeln!(f, "\nBLOCKS")?;
            for row in &self.blocks {
                let progress = if row.target == 0 {
                    format!("{} days", row.completed)
                } else {
                    format!("{}/{}", row.completed, row.target)
                };
                write!(f, "  {:<16} {progress:<8} {:>3.0}%  {}", row.name, row.rate, row.delta)?;
                if row.streak > 0 {
                    write!(f, "  streak {}", plural(row.streak as usize, "day"))?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "\nTASKS")?;
        writeln!(f, "  Completed: {}", self.tasks_completed)?;
        writeln!(f, "  Pending:   {}", self.tasks_pending)?;
        if self.tasks_overdue > 0 {
            writeln!(f, "  Overdue:   {}", self.tasks_overdue)?;
        }

        write_wins(f, &self.wins)?;

        if !self.activity.is_empty() {
            writeln!(f, "\nACTIVITY")?;
            for (kind, n) in &self.activity {
                writeln!(f, "  {}: {n}", kind_label(kind))?;
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Month review
// ═══════════════════════════════════════════════════════════════════════

/// One block across the trailing weeks.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBlockRow {
    pub name: String,
    pub target: u32,
    /// Completed per week, oldest first.
    pub counts: Vec<u32>,
    pub average_rate: f64,
    pub streak: u32,
}

/// Share of the month's activity for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone)]
pub struct MonthReview {
    pub today: NaiveDate,
    pub weeks: Vec<WeekWindow>,
    pub blocks: Vec<MonthBlockRow>,
    /// Tasks completed per week, oldest first.
    pub task_velocity: Vec<u32>,
    pub peak_week: Option<usize>,
    pub velocity_trend: Trend,
    pub wins: Vec<ActivityRecord>,
    pub categories: Vec<CategoryShare>,
}

impl MonthReview {
    pub fn build(tracker: &Tracker, now: NaiveDateTime) -> UeResult<Self> {
        let today = effective_date(now);
        let weeks = trailing_weeks(today, MONTH_WEEKS);
        let (first, last) = match (weeks.first(), weeks.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (WeekWindow::containing(today, 0), WeekWindow::containing(today, 0)),
        };

        let records = history_through(tracker, today, first.start, last.end)?;
        let mut blocks = Vec::new();
        for target in tracker.blocks().targets()? {
            let counts = stats::weekly_counts(&target.name, &records, &weeks);
            let total: u32 = counts.iter().sum();
            blocks.push(MonthBlockRow {
                average_rate: stats::average_rate(total, target.weekly_target, MONTH_WEEKS),
                streak: stats::streak(&target.name, &records, today),
                name: target.name,
                target: target.weekly_target,
                counts,
            });
        }

        let done = tracker.tasks().completed_since(day_start(first.start))?;
        let task_velocity: Vec<u32> = weeks
            .iter()
            .map(|w| {
                done.iter()
                    .filter_map(|t| t.completed_at)
                    .filter(|at| w.contains(at.date()))
                    .count() as u32
            })
            .collect();

        let log = tracker
            .activity()
            .query(&ActivityFilter::since(day_start(first.start)))?;
        let shares = count_by(
            log.iter()
                .map(|r| r.category.as_deref().unwrap_or(UNASSIGNED)),
        );
        let categories = shares
            .into_iter()
            .map(|(category, count)| CategoryShare {
                percent: count as f64 / log.len() as f64 * 100.0,
                category,
                count,
            })
            .collect();
        let wins = log.into_iter().filter(ActivityRecord::is_win).collect();

        Ok(Self {
            today,
            peak_week: stats::peak_week(&task_velocity),
            velocity_trend: stats::velocity_trend(&task_velocity),
            weeks,
            blocks,
            task_velocity,
            wins,
            categories,
        })
    }
}

impl fmt::Display for MonthReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.weeks.first(), self.weeks.last()) {
            (Some(first), Some(last)) => writeln!(
                f,
                "Month in review: {} - {}",
                first.start.format("%b %d"),
                last.end.format("%b %d")
            )?,
            _ => writeln!(f, "Month in review")?,
        }

        if !self.blocks.is_empty() {
            writeln!(f, "\nBLOCKS (per week, oldest first)")?;
            for row in &self.blocks {
                let counts: Vec<String> = row.counts.iter().map(u32::to_string).collect();
                write!(
                    f,
                    "  {:<16} [{}]  avg {:.0}%",
                    row.name,
                    counts.join(" "),
                    row.average_rate
                )?;
                if row.streak > 0 {
                    write!(f, "  streak {}", plural(row.streak as usize, "day"))?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "\nTASK VELOCITY")?;
        for (i, (week, n)) in self.weeks.iter().zip(&self.task_velocity).enumerate() {
            let peak = if self.peak_week == Some(i) { "  (peak)" } else { "" };
            writeln!(f, "  Week of {}: {n}{peak}", week.start.format("%b %d"))?;
        }
        let trend = match self.velocity_trend {
            Trend::Up => "trending up",
            Trend::Down => "trending down",
            Trend::Flat => "steady",
        };
        writeln!(f, "  {} {trend}", self.velocity_trend.arrow())?;

        write_wins(f, &self.wins)?;

        if !self.categories.is_empty() {
            writeln!(f, "\nWHERE THE TIME WENT")?;
            for share in &self.categories {
                writeln!(
                    f,
                    "  {:<16} {:>3} ({:.0}%)",
                    share.category, share.count, share.percent
                )?;
            }
        }
        Ok(())
    }
}
