//! Activity log repository. Append-only.

use chrono::NaiveDateTime;

use crate::activity::{ActivityFilter, ActivityRecord, NewActivity};
use crate::store::{Backend, StoreResult, Table, decode, encode};

const SEQUENCE: &str = "activity";

pub struct ActivityRepo<'a> {
    backend: &'a dyn Backend,
}

impl<'a> ActivityRepo<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Append an entry. A missing timestamp is filled with `now`.
    pub fn append(&self, new: NewActivity, now: NaiveDateTime) -> StoreResult<ActivityRecord> {
        let timestamp = new.timestamp.unwrap_or(now);
        let build = |id: u64| ActivityRecord {
            id,
            kind: new.kind.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            source: new.source.clone(),
            payload: new.payload.clone(),
            timestamp,
        };
        let id = self
            .backend
            .append(Table::Activity, SEQUENCE, &|id| encode(&build(id)))?;
        tracing::debug!(id, kind = %new.kind, "appended activity");
        Ok(build(id))
    }

    fn all(&self) -> StoreResult<Vec<ActivityRecord>> {
        self.backend
            .scan_all(Table::Activity)?
            .iter()
            .map(|(_, v)| decode(v))
            .collect()
    }

    /// Matching entries, newest first, truncated to the filter's limit.
    pub fn query(&self, filter: &ActivityFilter) -> StoreResult<Vec<ActivityRecord>> {
        let mut records: Vec<ActivityRecord> = self
            .all()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    /// Whether an entry from `source` carries `key: value` at the top level of
    /// its JSON payload.
    pub fn exists_with(&self, source: &str, key: &str, value: &str) -> StoreResult<bool> {
        for record in self.all()?.iter().filter(|r| r.source == source) {
            let Some(raw) = record.payload.as_deref() else {
                continue;
            };
            match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(json) => {
                    if json.get(key).and_then(|v| v.as_str()) == Some(value) {
                        return Ok(true);
                    }
                }
                Err(e) => {
                    tracing::warn!(id = record.id, error = %e, "unreadable activity payload");
                }
            }
        }
        Ok(false)
    }
}
