//! Deadline-bearing to-do items.
//!
//! Tasks start `pending` and move to `done` (stamping `completed_at`) or
//! `cancelled`. Both are terminal: a closed task cannot be completed,
//! cancelled or edited again.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::due::DueDate;

/// Errors specific to task management.
#[derive(Debug, Error, Diagnostic)]
pub enum TaskError {
    #[error("task #{id} not found")]
    #[diagnostic(
        code(ue::task::not_found),
        help("List pending tasks with `ue task list`.")
    )]
    NotFound { id: u64 },

    #[error("task #{id} is already {status}")]
    #[diagnostic(
        code(ue::task::closed),
        help("Done and cancelled tasks are final. Add a new task instead.")
    )]
    AlreadyClosed { id: u64, status: TaskStatus },

    #[error("unknown task priority \"{value}\"")]
    #[diagnostic(code(ue::task::priority), help("Valid priorities: low, normal, high."))]
    UnknownPriority { value: String },
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;

// ═══════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl TaskPriority {
    /// Larger is more urgent.
    pub fn weight(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| TaskError::UnknownPriority { value: s.to_string() })
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub due: Option<DueDate>,
    pub category: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Task {
    /// The due date if it resolves to a calendar date.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due.as_ref().and_then(DueDate::to_date)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Pending and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date().is_some_and(|d| d < today)
    }

    /// Pending and due within `[today, today + days]`.
    pub fn is_due_within(&self, today: NaiveDate, days: u32) -> bool {
        let horizon = today
            .checked_add_days(chrono::Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        self.is_pending() && self.due_date().is_some_and(|d| today <= d && d <= horizon)
    }

    /// Mark done. Fails on a closed task.
    pub fn complete(&mut self, at: NaiveDateTime) -> TaskResult<()> {
        self.ensure_open()?;
        self.status = TaskStatus::Done;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Mark cancelled. Fails on a closed task.
    pub fn cancel(&mut self) -> TaskResult<()> {
        self.ensure_open()?;
        self.status = TaskStatus::Cancelled;
        Ok(())
    }

    /// Apply a patch. Returns whether any field was touched.
    pub fn apply(&mut self, update: TaskUpdate) -> TaskResult<bool> {
        self.ensure_open()?;
        let mut changed = false;
        if let Some(title) = update.title {
            self.title = title;
            changed = true;
        }
        if let Some(due) = update.due {
            self.due = due;
            changed = true;
        }
        if let Some(category) = update.category {
            self.category = category;
            changed = true;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
            changed = true;
        }
        if let Some(note) = update.note {
            self.note = Some(note);
            changed = true;
        }
        Ok(changed)
    }

    fn ensure_open(&self) -> TaskResult<()> {
        if self.status.is_terminal() {
            return Err(TaskError::AlreadyClosed {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

/// Listing order: dated tasks first by due date ascending, then priority
/// descending, then id.
pub fn listing_order(a: &Task, b: &Task) -> Ordering {
    let key = |t: &Task| {
        let due = t.due_date();
        (due.is_none(), due)
    };
    key(a)
        .cmp(&key(b))
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub due: Option<DueDate>,
    pub category: Option<String>,
    pub priority: TaskPriority,
    pub note: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Partial update. Outer `None` leaves a field alone; for `due` and
/// `category`, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub due: Option<Option<DueDate>>,
    pub category: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub note: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.note.is_none()
    }
}

/// Filter for listing.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// `None` lists every status.
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            category: None,
        }
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self
                .category
                .as_deref()
                .is_none_or(|c| task.category.as_deref() == Some(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn task(id: u64, due: Option<u32>, priority: TaskPriority) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            due: due.map(|d| DueDate::Date(date(d))),
            category: None,
            priority,
            status: TaskStatus::Pending,
            note: None,
            created_at: date(1).and_hms_opt(9, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn complete_sets_timestamp_once() {
        let mut t = task(1, None, TaskPriority::Normal);
        let at = date(5).and_hms_opt(12, 0, 0).unwrap();
        t.complete(at).unwrap();
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.completed_at, Some(at));
        assert!(matches!(t.complete(at), Err(TaskError::AlreadyClosed { .. })));
        assert!(matches!(t.cancel(), Err(TaskError::AlreadyClosed { .. })));
    }

    #[test]
    fn cancelled_has_no_completion_time() {
        let mut t = task(1, None, TaskPriority::Normal);
        t.cancel().unwrap();
        assert_eq!(t.status, TaskStatus::Cancelled);
        assert!(t.completed_at.is_none());
        assert!(t.apply(TaskUpdate { title: Some("x".into()), ..Default::default() }).is_err());
    }

    #[test]
    fn apply_clears_and_sets() {
        let mut t = task(1, Some(10), TaskPriority::Normal);
        t.category = Some("blog".into());
        let changed = t
            .apply(TaskUpdate {
                due: Some(None),
                category: Some(None),
                priority: Some(TaskPriority::High),
                ..Default::default()
            })
            .unwrap();
        assert!(changed);
        assert!(t.due.is_none());
        assert!(t.category.is_none());
        assert_eq!(t.priority, TaskPriority::High);
        assert!(!t.apply(TaskUpdate::default()).unwrap());
    }

    #[test]
    fn overdue_and_window() {
        let t = task(1, Some(9), TaskPriority::Normal);
        assert!(t.is_overdue(date(10)));
        assert!(!t.is_due_within(date(10), 7));

        let soon = task(2, Some(17), TaskPriority::Normal);
        assert!(soon.is_due_within(date(10), 7));
        assert!(!soon.is_due_within(date(10), 6));
        assert!(!soon.is_overdue(date(10)));
    }

    #[test]
    fn huge_window_saturates() {
        let t = task(1, Some(17), TaskPriority::Normal);
        assert!(t.is_due_within(date(10), u32::MAX));
        assert!(!t.is_due_within(NaiveDate::MAX, u32::MAX));
    }

    #[test]
    fn verbatim_due_is_undated() {
        let mut t = task(1, None, TaskPriority::Normal);
        t.due = Some(DueDate::Verbatim("someday".into()));
        assert_eq!(t.due_date(), None);
        assert!(!t.is_overdue(date(10)));
    }

    #[test]
    fn listing_is_nulls_last_then_priority() {
        let mut tasks = vec![
            task(1, None, TaskPriority::High),
            task(2, Some(12), TaskPriority::Low),
            task(3, Some(12), TaskPriority::High),
            task(4, Some(11), TaskPriority::Normal),
        ];
        tasks.sort_by(listing_order);
        let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn filter_defaults_to_pending() {
        let mut done = task(1, None, TaskPriority::Normal);
        done.status = TaskStatus::Done;
        let pending = task(2, None, TaskPriority::Normal);
        let filter = TaskFilter::default();
        assert!(!filter.matches(&done));
        assert!(filter.matches(&pending));
        let all = TaskFilter { status: None, category: None };
        assert!(all.matches(&done));
    }
}
