//! In-memory remote store.
//!
//! Honors the same conflict-key upsert semantics as the HTTP client and
//! records every upsert batch in arrival order, so tests can assert on push
//! ordering and batch counts. Also used as a stand-in backend for offline
//! development.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::error::{RemoteError, RemoteResult};
use crate::store::{RemoteStore, RowFilter};

/// One batched upsert, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertBatch {
    pub table: String,
    pub rows: usize,
    pub on_conflict: String,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Value>>,
    batches: Vec<UpsertBatch>,
    fetches: Vec<String>,
    failing: HashSet<String>,
    session_ended: bool,
}

/// In-memory implementation of [`RemoteStore`].
#[derive(Default)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload rows into a table, as if written by another device.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.inner
            .lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Current contents of a table.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .lock()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every upsert batch received so far, in arrival order.
    pub fn upsert_batches(&self) -> Vec<UpsertBatch> {
        self.inner.lock().batches.clone()
    }

    /// Number of upsert batches received for one table.
    pub fn upsert_count(&self, table: &str) -> usize {
        self.inner
            .lock()
            .batches
            .iter()
            .filter(|batch| batch.table == table)
            .count()
    }

    /// Every fetched source so far, in arrival order.
    pub fn fetches(&self) -> Vec<String> {
        self.inner.lock().fetches.clone()
    }

    /// Number of fetches received for one source.
    pub fn fetch_count(&self, source: &str) -> usize {
        self.inner
            .lock()
            .fetches
            .iter()
            .filter(|fetched| fetched.as_str() == source)
            .count()
    }

    /// Make every call touching `table` fail until cleared.
    pub fn fail_table(&self, table: &str) {
        self.inner.lock().failing.insert(table.to_string());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failing.clear();
    }

    pub fn session_ended(&self) -> bool {
        self.inner.lock().session_ended
    }
}

fn matches_filters(row: &Value, filters: &[RowFilter]) -> bool {
    filters
        .iter()
        .all(|filter| row.get(&filter.column) == Some(&filter.value))
}

fn same_conflict_key(a: &Value, b: &Value, key_fields: &[&str]) -> bool {
    key_fields.iter().all(|field| a.get(field) == b.get(field))
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self, source: &str, filters: &[RowFilter]) -> RemoteResult<Vec<Value>> {
        let mut inner = self.inner.lock();
        inner.fetches.push(source.to_string());
        if inner.failing.contains(source) {
            return Err(RemoteError::Api {
                status: 503,
                message: format!("{source} unavailable"),
            });
        }
        Ok(inner
            .tables
            .get(source)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filters(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> RemoteResult<()> {
        let mut inner = self.inner.lock();
        if inner.failing.contains(table) {
            return Err(RemoteError::Api {
                status: 503,
                message: format!("{table} unavailable"),
            });
        }
        inner.batches.push(UpsertBatch {
            table: table.to_string(),
            rows: rows.len(),
            on_conflict: on_conflict.to_string(),
        });

        let key_fields: Vec<&str> = on_conflict.split(',').collect();
        let stored = inner.tables.entry(table.to_string()).or_default();
        for row in rows {
            match stored
                .iter_mut()
                .find(|existing| same_conflict_key(existing, row, &key_fields))
            {
                Some(existing) => *existing = row.clone(),
                None => stored.push(row.clone()),
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[RowFilter]) -> RemoteResult<()> {
        let mut inner = self.inner.lock();
        if inner.failing.contains(table) {
            return Err(RemoteError::Api {
                status: 503,
                message: format!("{table} unavailable"),
            });
        }
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.retain(|row| !matches_filters(row, filters));
        }
        Ok(())
    }

    async fn end_session(&self) -> RemoteResult<()> {
        self.inner.lock().session_ended = true;
        Ok(())
    }
}
