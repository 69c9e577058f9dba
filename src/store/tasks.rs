//! Task repository: id allocation, status transitions, due-window queries.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::UeResult;
use crate::store::{Backend, StoreResult, Table, decode, encode, id_key};
use crate::task::{NewTask, Task, TaskError, TaskFilter, TaskStatus, TaskUpdate, listing_order};

const SEQUENCE: &str = "task";

pub struct TaskRepo<'a> {
    backend: &'a dyn Backend,
}

impl<'a> TaskRepo<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Create a pending task and return it with its assigned id.
    pub fn add(&self, new: NewTask, now: NaiveDateTime) -> StoreResult<Task> {
        let build = |id: u64| Task {
            id,
            title: new.title.clone(),
            due: new.due.clone(),
            category: new.category.clone(),
            priority: new.priority,
            status: TaskStatus::Pending,
            note: new.note.clone(),
            created_at: now,
            completed_at: None,
        };
        let id = self
            .backend
            .append(Table::Tasks, SEQUENCE, &|id| encode(&build(id)))?;
        tracing::info!(id, title = %new.title, "added task");
        Ok(build(id))
    }

    pub fn get(&self, id: u64) -> StoreResult<Option<Task>> {
        self.backend
            .get(Table::Tasks, &id_key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Fetch a task or fail with `TaskError::NotFound`.
    pub fn require(&self, id: u64) -> UeResult<Task> {
        Ok(self.get(id)?.ok_or(TaskError::NotFound { id })?)
    }

    fn save(&self, task: &Task) -> StoreResult<()> {
        self.backend.put(Table::Tasks, &id_key(task.id), &encode(task)?)
    }

    /// Every task in id order.
    pub fn all(&self) -> StoreResult<Vec<Task>> {
        self.backend
            .scan_all(Table::Tasks)?
            .iter()
            .map(|(_, v)| decode(v))
            .collect()
    }

    /// Filtered tasks in listing order.
    pub fn list(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .all()?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        tasks.sort_by(listing_order);
        Ok(tasks)
    }

    pub fn complete(&self, id: u64, now: NaiveDateTime) -> UeResult<Task> {
        let mut task = self.require(id)?;
        task.complete(now)?;
        self.save(&task)?;
        tracing::info!(id, "completed task");
        Ok(task)
    }

    pub fn cancel(&self, id: u64) -> UeResult<Task> {
        let mut task = self.require(id)?;
        task.cancel()?;
        self.save(&task)?;
        tracing::info!(id, "cancelled task");
        Ok(task)
    }

    /// Apply a patch. Returns the task and whether anything changed.
    pub fn update(&self, id: u64, update: TaskUpdate) -> UeResult<(Task, bool)> {
        let mut task = self.require(id)?;
        let changed = task.apply(update)?;
        if changed {
            self.save(&task)?;
            tracing::debug!(id, "updated task");
        }
        Ok((task, changed))
    }

    /// Pending tasks due in `[today, today + days]`, soonest first.
    pub fn upcoming(&self, today: NaiveDate, days: u32) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .all()?
            .into_iter()
            .filter(|t| t.is_due_within(today, days))
            .collect();
        tasks.sort_by(listing_order);
        Ok(tasks)
    }

    /// Pending tasks due before `today`, oldest due date first.
    ///
    /// Pass the wall-clock date here, not the effective date.
    pub fn overdue(&self, today: NaiveDate) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .all()?
            .into_iter()
            .filter(|t| t.is_overdue(today))
            .collect();
        tasks.sort_by(listing_order);
        Ok(tasks)
    }

    /// Done tasks with `completed_at >= since`, newest first.
    pub fn completed_since(&self, since: NaiveDateTime) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .all()?
            .into_iter()
            .filter(|t| t.status == TaskStatus::Done && t.completed_at.is_some_and(|at| at >= since))
            .collect();
        tasks.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(tasks)
    }

    /// Tasks of any status with `created_at >= since`, newest first.
    pub fn created_since(&self, since: NaiveDateTime) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .all()?
            .into_iter()
            .filter(|t| t.created_at >= since)
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::due::DueDate;
    use crate::error::UeError;
    use crate::store::Store;
    use crate::task::TaskPriority;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn due(title: &str, d: u32) -> NewTask {
        NewTask {
            due: Some(DueDate::Date(date(d))),
            ..NewTask::titled(title)
        }
    }

    #[test]
    fn ids_increase() {
        let store = Store::memory();
        let tasks = store.tasks();
        let a = tasks.add(NewTask::titled("a"), at(1, 9)).unwrap();
        let b = tasks.add(NewTask::titled("b"), at(1, 9)).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(tasks.get(2).unwrap().unwrap().title, "b");
        assert_eq!(a.priority, TaskPriority::Normal);
        assert_eq!(a.status, TaskStatus::Pending);
    }

    #[test]
    fn missing_task_is_not_found() {
        let store = Store::memory();
        let err = store.tasks().complete(42, at(1, 9)).unwrap_err();
        assert!(matches!(err, UeError::Task(TaskError::NotFound { id: 42 })));
    }

    #[test]
    fn closed_tasks_reject_changes() {
        let store = Store::memory();
        let tasks = store.tasks();
        let t = tasks.add(NewTask::titled("x"), at(1, 9)).unwrap();
        let done = tasks.complete(t.id, at(2, 10)).unwrap();
        assert_eq!(done.completed_at, Some(at(2, 10)));

        let err = tasks.cancel(t.id).unwrap_err();
        assert!(matches!(err, UeError::Task(TaskError::AlreadyClosed { .. })));
        assert_eq!(tasks.get(t.id).unwrap().unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn upcoming_excludes_overdue() {
        let store = Store::memory();
        let tasks = store.tasks();
        tasks.add(due("late", 8), at(1, 9)).unwrap();
        tasks.add(due("today", 10), at(1, 9)).unwrap();
        tasks.add(due("edge", 17), at(1, 9)).unwrap();
        tasks.add(due("far", 18), at(1, 9)).unwrap();
        tasks.add(NewTask::titled("undated"), at(1, 9)).unwrap();

        let upcoming: Vec<String> = tasks
            .upcoming(date(10), 7)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(upcoming, vec!["today", "edge"]);

        let overdue = tasks.overdue(date(10)).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "late");
    }

    #[test]
    fn upcoming_with_huge_window() {
        let store = Store::memory();
        let tasks = store.tasks();
        tasks.add(due("edge", 17), at(1, 9)).unwrap();
        tasks.add(due("late", 8), at(1, 9)).unwrap();
        let upcoming = tasks.upcoming(date(10), u32::MAX).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "edge");
    }

    #[test]
    fn list_filters_and_orders() {
        let store = Store::memory();
        let tasks = store.tasks();
        tasks.add(NewTask::titled("undated"), at(1, 9)).unwrap();
        tasks
            .add(
                NewTask {
                    category: Some("blog".into()),
                    ..due("blog post", 12)
                },
                at(1, 9),
            )
            .unwrap();
        let c = tasks.add(due("cancel me", 11), at(1, 9)).unwrap();
        tasks.cancel(c.id).unwrap();

        let pending: Vec<String> = tasks
            .list(&TaskFilter::default())
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(pending, vec!["blog post", "undated"]);

        let blog = tasks
            .list(&TaskFilter {
                category: Some("blog".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blog.len(), 1);

        let all = tasks
            .list(&TaskFilter {
                status: None,
                category: None,
            })
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn update_reports_changes() {
        let store = Store::memory();
        let tasks = store.tasks();
        let t = tasks.add(due("x", 12), at(1, 9)).unwrap();
        let (updated, changed) = tasks
            .update(
                t.id,
                TaskUpdate {
                    due: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changed);
        assert!(updated.due.is_none());
        let (_, changed) = tasks.update(t.id, TaskUpdate::default()).unwrap();
        assert!(!changed);
    }

    #[test]
    fn since_queries() {
        let store = Store::memory();
        let tasks = store.tasks();
        let old = tasks.add(NewTask::titled("old"), at(1, 9)).unwrap();
        let new = tasks.add(NewTask::titled("new"), at(9, 9)).unwrap();
        tasks.complete(old.id, at(9, 12)).unwrap();
        tasks.complete(new.id, at(10, 12)).unwrap();

        assert_eq!(tasks.created_since(at(8, 0)).unwrap().len(), 1);
        let done: Vec<u64> = tasks
            .completed_since(at(8, 0))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(done, vec![new.id, old.id]);
    }
}
