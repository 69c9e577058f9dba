//! Storage for blocks, tasks and the activity log.
//!
//! Two interchangeable byte-level backends implement [`Backend`]:
//!
//! - [`MemStore`](mem::MemStore): concurrent hashmaps (DashMap), lost on exit
//! - [`DurableStore`](durable::DurableStore): ACID transactions in one redb file
//!
//! Typed repositories ([`BlockRepo`], [`TaskRepo`], [`ActivityRepo`]) sit on
//! top and own the key layout and the bincode record encoding.

pub mod activity;
pub mod blocks;
pub mod durable;
pub mod mem;
pub mod tasks;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

pub use activity::ActivityRepo;
pub use blocks::BlockRepo;
pub use tasks::TaskRepo;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Logical tables. Each maps to one redb table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Block targets keyed by name.
    Targets,
    /// Completion records keyed by `YYYY-MM-DD 0x1F name`.
    Completions,
    /// Tasks keyed by big-endian id.
    Tasks,
    /// Activity entries keyed by big-endian id.
    Activity,
    /// Sequence counters and other bookkeeping.
    Meta,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Targets,
        Table::Completions,
        Table::Tasks,
        Table::Activity,
        Table::Meta,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Targets => "targets",
            Self::Completions => "completions",
            Self::Tasks => "tasks",
            Self::Activity => "activity",
            Self::Meta => "meta",
        }
    }
}

/// An ordered `(key, value)` pair returned by scans.
pub type Entry = (Vec<u8>, Vec<u8>);

/// Byte-level storage backend.
///
/// Every method is one atomic operation. Scans return entries in ascending
/// key order.
pub trait Backend: Send + Sync {
    /// Short name for logs (`memory`, `redb`).
    fn kind(&self) -> &'static str;

    /// Insert or replace a value.
    fn put(&self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Read a value. `Ok(None)` if the key is absent.
    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Entries with `start <= key < end` (`end: None` scans to the end).
    fn scan_range(&self, table: Table, start: &[u8], end: Option<&[u8]>)
    -> StoreResult<Vec<Entry>>;

    /// Allocate the next value of the named counter (starting at 1) and
    /// store `encode(id)` under its big-endian key, in one transaction.
    fn append(
        &self,
        table: Table,
        sequence: &str,
        encode: &dyn Fn(u64) -> StoreResult<Vec<u8>>,
    ) -> StoreResult<u64>;

    /// Every entry of a table.
    fn scan_all(&self, table: Table) -> StoreResult<Vec<Entry>> {
        self.scan_range(table, &[], None)
    }
}

// ---------------------------------------------------------------------------
// Codec helpers
// ---------------------------------------------------------------------------

pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization {
        message: format!("encode failed: {e}"),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
        message: format!("decode failed: {e}"),
    })
}

pub(crate) fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Parse a big-endian u64 stored as a key or counter.
pub(crate) fn read_u64(table: Table, bytes: &[u8]) -> StoreResult<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| StoreError::Corrupt {
        table: table.name().into(),
        message: format!("expected 8 bytes, found {}", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(raw))
}

/// Meta-table key for a named counter.
pub(crate) fn sequence_key(sequence: &str) -> Vec<u8> {
    format!("seq:{sequence}").into_bytes()
}

// ---------------------------------------------------------------------------
// Store handle
// ---------------------------------------------------------------------------

/// Shared handle over a backend, handing out typed repositories.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    /// A store that lives only as long as the process.
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(mem::MemStore::new()))
    }

    /// Open (or create) the redb store file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self::from_backend(Arc::new(durable::DurableStore::open(
            path,
        )?)))
    }

    pub fn from_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    pub fn blocks(&self) -> BlockRepo<'_> {
        BlockRepo::new(self.backend.as_ref())
    }

    pub fn tasks(&self) -> TaskRepo<'_> {
        TaskRepo::new(self.backend.as_ref())
    }

    pub fn activity(&self) -> ActivityRepo<'_> {
        ActivityRepo::new(self.backend.as_ref())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_keys_sort_numerically() {
        let mut keys = vec![id_key(256), id_key(2), id_key(17)];
        keys.sort();
        let ids: Vec<u64> = keys
            .iter()
            .map(|k| read_u64(Table::Tasks, k).unwrap())
            .collect();
        assert_eq!(ids, vec![2, 17, 256]);
    }

    #[test]
    fn short_counter_is_corrupt() {
        let err = read_u64(Table::Meta, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn memory_store_reports_kind() {
        let store = Store::memory();
        assert_eq!(store.kind(), "memory");
        assert!(format!("{store:?}").contains("memory"));
    }
}
