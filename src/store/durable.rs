//! ACID-durable backend on a single redb file.
//!
//! Each [`Table`] is its own redb table of raw byte keys and values. All
//! tables are created when the file is opened so read transactions never hit
//! a missing table.

use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::store::{Backend, Entry, StoreResult, Table, read_u64, sequence_key};

type RawTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

fn definition(table: Table) -> RawTable {
    TableDefinition::new(table.name())
}

fn redb_err<E: Display>(op: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{op} failed: {e}"),
    }
}

/// ACID-durable store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots.
pub struct DurableStore {
    db: Arc<Database>,
}

impl DurableStore {
    /// Open or create the store file, creating parent directories as needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io { source: e })?;
        }
        let db = Database::create(path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", path.display()),
        })?;

        let txn = db.begin_write().map_err(redb_err("begin_write"))?;
        for table in Table::ALL {
            txn.open_table(definition(table))
                .map_err(redb_err("open_table"))?;
        }
        txn.commit().map_err(redb_err("commit"))?;

        tracing::info!(path = %path.display(), "opened durable store");
        Ok(Self { db: Arc::new(db) })
    }
}

impl Backend for DurableStore {
    fn kind(&self) -> &'static str {
        "redb"
    }

    fn put(&self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        {
            let mut t = txn
                .open_table(definition(table))
                .map_err(redb_err("open_table"))?;
            t.insert(key, value).map_err(redb_err("insert"))?;
        }
        txn.commit().map_err(redb_err("commit"))?;
        Ok(())
    }

    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let t = txn
            .open_table(definition(table))
            .map_err(redb_err("open_table"))?;
        let result = t.get(key).map_err(redb_err("get"))?;
        Ok(result.map(|guard| guard.value().to_vec()))
    }

    fn scan_range(
        &self,
        table: Table,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> StoreResult<Vec<Entry>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let t = txn
            .open_table(definition(table))
            .map_err(redb_err("open_table"))?;
        let iter = match end {
            Some(end) => t.range::<&[u8]>(start..end),
            None => t.range::<&[u8]>(start..),
        }
        .map_err(redb_err("range"))?;

        let mut out = Vec::new();
        for item in iter {
            let (k, v) = item.map_err(redb_err("range"))?;
            out.push((k.value().to_vec(), v.value().to_vec()));
        }
        Ok(out)
    }

    fn append(
        &self,
        table: Table,
        sequence: &str,
        encode: &dyn Fn(u64) -> StoreResult<Vec<u8>>,
    ) -> StoreResult<u64> {
        let counter = sequence_key(sequence);
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        let id = {
            let mut meta = txn
                .open_table(definition(Table::Meta))
                .map_err(redb_err("open_table"))?;
            let last = match meta.get(counter.as_slice()).map_err(redb_err("get"))? {
                Some(guard) => read_u64(Table::Meta, guard.value())?,
                None => 0,
            };
            let id = last + 1;
            meta.insert(counter.as_slice(), id.to_be_bytes().as_slice())
                .map_err(redb_err("insert"))?;
            id
        };
        {
            let value = encode(id)?;
            let mut t = txn
                .open_table(definition(table))
                .map_err(redb_err("open_table"))?;
            t.insert(id.to_be_bytes().as_slice(), value.as_slice())
                .map_err(redb_err("insert"))?;
        }
        txn.commit().map_err(redb_err("commit"))?;
        Ok(id)
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> DurableStore {
        DurableStore::open(&dir.path().join("ue.redb")).unwrap()
    }

    #[test]
    fn put_get_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store.put(Table::Targets, b"Gym", b"v").unwrap();
        assert_eq!(store.get(Table::Targets, b"Gym").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get(Table::Tasks, b"Gym").unwrap(), None);

        store.put(Table::Targets, b"Gym", b"w").unwrap();
        assert_eq!(store.get(Table::Targets, b"Gym").unwrap(), Some(b"w".to_vec()));
    }

    #[test]
    fn range_scan_is_ordered_and_half_open() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        for key in ["c", "a", "d", "b"] {
            store.put(Table::Completions, key.as_bytes(), b"").unwrap();
        }
        let keys: Vec<Vec<u8>> = store
            .scan_range(Table::Completions, b"b", Some(b"d"))
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(store.scan_all(Table::Completions).unwrap().len(), 4);
    }

    #[test]
    fn append_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            assert_eq!(store.append(Table::Tasks, "task", &|_| Ok(vec![1])).unwrap(), 1);
            assert_eq!(store.append(Table::Tasks, "task", &|_| Ok(vec![2])).unwrap(), 2);
        }
        let store = open(&dir);
        assert_eq!(store.append(Table::Tasks, "task", &|_| Ok(vec![3])).unwrap(), 3);
        assert_eq!(store.get(Table::Tasks, &2u64.to_be_bytes()).unwrap(), Some(vec![2]));
    }

    #[test]
    fn failed_encode_allocates_nothing() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let err = store.append(Table::Activity, "activity", &|_| {
            Err(StoreError::Serialization {
                message: "nope".into(),
            })
        });
        assert!(err.is_err());
        assert_eq!(
            store.append(Table::Activity, "activity", &|_| Ok(vec![])).unwrap(),
            1
        );
    }
}
