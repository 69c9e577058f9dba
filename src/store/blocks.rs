//! Block targets and completion records.
//!
//! Completion keys lead with the ISO date so a date window is a single key
//! range; the block name follows a unit separator. Writing the same
//! `(name, date)` twice replaces the record.

use chrono::NaiveDate;

use crate::block::{BlockError, CompletionRecord, RecurrenceTarget};
use crate::error::UeResult;
use crate::store::{Backend, StoreResult, Table, decode, encode};
use crate::temporal::week_bounds;

const SEPARATOR: char = '\x1f';

fn completion_key(date: NaiveDate, name: &str) -> Vec<u8> {
    format!("{}{SEPARATOR}{name}", date.format("%Y-%m-%d")).into_bytes()
}

fn date_prefix(date: NaiveDate) -> Vec<u8> {
    date.format("%Y-%m-%d").to_string().into_bytes()
}

/// Repository for recurring blocks.
pub struct BlockRepo<'a> {
    backend: &'a dyn Backend,
}

impl<'a> BlockRepo<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    // -----------------------------------------------------------------------
    // Targets
    // -----------------------------------------------------------------------

    /// Create or update a target. An existing target keeps its `active`
    /// flag; a new one starts active.
    pub fn set_target(
        &self,
        name: &str,
        weekly_target: u32,
        category: Option<String>,
    ) -> StoreResult<RecurrenceTarget> {
        let active = self.get_target(name)?.is_none_or(|t| t.active);
        let target = RecurrenceTarget {
            name: name.to_string(),
            weekly_target,
            category,
            active,
        };
        self.backend
            .put(Table::Targets, name.as_bytes(), &encode(&target)?)?;
        tracing::debug!(name, weekly_target, "upserted block target");
        Ok(target)
    }

    /// Flip the `active` flag. History is untouched either way.
    pub fn set_active(&self, name: &str, active: bool) -> UeResult<RecurrenceTarget> {
        let mut target = self
            .get_target(name)?
            .ok_or_else(|| BlockError::TargetNotFound {
                name: name.to_string(),
            })?;
        target.active = active;
        self.backend
            .put(Table::Targets, name.as_bytes(), &encode(&target)?)?;
        tracing::info!(name, active, "changed block state");
        Ok(target)
    }

    pub fn get_target(&self, name: &str) -> StoreResult<Option<RecurrenceTarget>> {
        self.backend
            .get(Table::Targets, name.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Active targets, ordered by name.
    pub fn targets(&self) -> StoreResult<Vec<RecurrenceTarget>> {
        Ok(self
            .all_targets()?
            .into_iter()
            .filter(|t| t.active)
            .collect())
    }

    /// Every target including deactivated ones, ordered by name.
    pub fn all_targets(&self) -> StoreResult<Vec<RecurrenceTarget>> {
        self.backend
            .scan_all(Table::Targets)?
            .iter()
            .map(|(_, v)| decode(v))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Upsert a completion record on `(name, date)`.
    pub fn log_completion(&self, record: &CompletionRecord) -> StoreResult<()> {
        let key = completion_key(record.date, &record.name);
        self.backend.put(Table::Completions, &key, &encode(record)?)?;
        tracing::debug!(
            name = %record.name,
            date = %record.date,
            status = %record.status,
            "logged completion"
        );
        Ok(())
    }

    /// All records with `start <= date <= end`, ordered by date then name.
    pub fn completions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<CompletionRecord>> {
        if end < start {
            return Ok(Vec::new());
        }
        let from = date_prefix(start);
        let to = end.succ_opt().map(date_prefix);
        self.backend
            .scan_range(Table::Completions, &from, to.as_deref())?
            .iter()
            .map(|(_, v)| decode(v))
            .collect()
    }

    /// Records for one block with `since <= date <= until`, oldest first.
    pub fn completions_for(
        &self,
        name: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> StoreResult<Vec<CompletionRecord>> {
        Ok(self
            .completions_between(since, until)?
            .into_iter()
            .filter(|r| r.name == name)
            .collect())
    }

    /// Records on one date.
    pub fn completions_on(&self, date: NaiveDate) -> StoreResult<Vec<CompletionRecord>> {
        self.completions_between(date, date)
    }

    /// Records in the Monday–Sunday week containing `today`.
    pub fn week_completions(&self, today: NaiveDate) -> StoreResult<Vec<CompletionRecord>> {
        let (monday, sunday) = week_bounds(today, 0);
        self.completions_between(monday, sunday)
    }

    /// Completed records for `name` this week, up to and including `today`.
    pub fn week_completed_count(&self, name: &str, today: NaiveDate) -> StoreResult<u32> {
        let (monday, _) = week_bounds(today, 0);
        Ok(self
            .completions_for(name, monday, today)?
            .iter()
            .filter(|r| r.is_completed())
            .count() as u32)
    }

    /// Newest-first history, optionally for one block and from a date.
    pub fn history(
        &self,
        name: Option<&str>,
        since: Option<NaiveDate>,
        limit: usize,
    ) -> StoreResult<Vec<CompletionRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let from = since.map(date_prefix).unwrap_or_default();
        let mut records = Vec::new();
        for (_, v) in self
            .backend
            .scan_range(Table::Completions, &from, None)?
            .iter()
            .rev()
        {
            let record: CompletionRecord = decode(v)?;
            if name.is_none_or(|n| record.name == n) {
                records.push(record);
                if records.len() == limit {
                    break;
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::CompletionStatus;
    use crate::store::Store;
    use chrono::Datelike;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn upsert_keeps_one_record() {
        let store = Store::memory();
        let blocks = store.blocks();
        blocks
            .log_completion(
                &CompletionRecord::new("Exercise", date(10), CompletionStatus::Skipped)
                    .with_reason(Some("sick".into())),
            )
            .unwrap();
        blocks
            .log_completion(&CompletionRecord::completed("Exercise", date(10)))
            .unwrap();

        let records = blocks.completions_on(date(10)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, CompletionStatus::Completed);
        assert_eq!(records[0].reason, None);
    }

    #[test]
    fn set_target_preserves_active_flag() {
        let store = Store::memory();
        let blocks = store.blocks();
        blocks.set_target("Gym", 3, None).unwrap();
        blocks.set_active("Gym", false).unwrap();
        let updated = blocks.set_target("Gym", 4, Some("health".into())).unwrap();
        assert!(!updated.active);
        assert_eq!(updated.weekly_target, 4);
        assert!(blocks.targets().unwrap().is_empty());
        assert_eq!(blocks.all_targets().unwrap().len(), 1);

        blocks.set_active("Gym", true).unwrap();
        assert_eq!(blocks.targets().unwrap().len(), 1);
    }

    #[test]
    fn set_active_on_missing_target() {
        let store = Store::memory();
        let err = store.blocks().set_active("Nope", false).unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn date_windows_are_inclusive() {
        let store = Store::memory();
        let blocks = store.blocks();
        for d in [7, 8, 10, 14, 15] {
            blocks
                .log_completion(&CompletionRecord::completed("Read", date(d)))
                .unwrap();
        }
        blocks
            .log_completion(&CompletionRecord::completed("Gym", date(9)))
            .unwrap();

        let week = blocks.week_completions(date(10)).unwrap();
        let days: Vec<u32> = week.iter().map(|r| r.date.day()).collect();
        assert_eq!(days, vec![8, 9, 10, 14]);

        assert_eq!(blocks.week_completed_count("Read", date(10)).unwrap(), 2);
        assert_eq!(blocks.completions_for("Gym", date(1), date(31)).unwrap().len(), 1);
        assert!(blocks.completions_between(date(10), date(9)).unwrap().is_empty());
    }

    #[test]
    fn history_is_newest_first() {
        let store = Store::memory();
        let blocks = store.blocks();
        for d in [1, 2, 3] {
            blocks
                .log_completion(&CompletionRecord::completed("Read", date(d)))
                .unwrap();
            blocks
                .log_completion(&CompletionRecord::completed("Gym", date(d)))
                .unwrap();
        }
        let hist = blocks.history(Some("Read"), None, 2).unwrap();
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[0].date, date(3));
        assert_eq!(hist[1].date, date(2));

        let since = blocks.history(None, Some(date(3)), 10).unwrap();
        assert_eq!(since.len(), 2);
        assert!(blocks.history(None, None, 0).unwrap().is_empty());
        assert!(blocks.history(Some("Read"), None, 0).unwrap().is_empty());
    }
}
