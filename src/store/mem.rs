//! In-memory backend on DashMap.
//!
//! Used by tests and `--memory` runs. All data is lost on process exit.

use dashmap::DashMap;

use crate::store::{Backend, Entry, StoreResult, Table, read_u64, sequence_key};

/// Concurrent in-memory store using a sharded hashmap per table.
#[derive(Debug)]
pub struct MemStore {
    data: DashMap<(Table, Vec<u8>), Vec<u8>>,
}

impl MemStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Number of entries across all tables.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn put(&self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.data.insert((table, key.to_vec()), value.to_vec());
        Ok(())
    }

    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .data
            .get(&(table, key.to_vec()))
            .map(|v| v.value().clone()))
    }

    fn scan_range(
        &self,
        table: Table,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> StoreResult<Vec<Entry>> {
        // Snapshot, not a consistent view under concurrent writes.
        let mut out: Vec<Entry> = self
            .data
            .iter()
            .filter(|entry| {
                let (t, key) = entry.key();
                *t == table
                    && key.as_slice() >= start
                    && end.is_none_or(|end| key.as_slice() < end)
            })
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn append(
        &self,
        table: Table,
        sequence: &str,
        encode: &dyn Fn(u64) -> StoreResult<Vec<u8>>,
    ) -> StoreResult<u64> {
        let mut counter = self
            .data
            .entry((Table::Meta, sequence_key(sequence)))
            .or_insert_with(|| 0u64.to_be_bytes().to_vec());
        let id = read_u64(Table::Meta, counter.value())? + 1;
        let value = encode(id)?;
        *counter.value_mut() = id.to_be_bytes().to_vec();
        drop(counter);
        self.data.insert((table, id.to_be_bytes().to_vec()), value);
        Ok(id)
    }
}
