//! Remote store seam.
//!
//! The sync engine talks to the remote relational store only through
//! [`RemoteStore`], so the HTTP client and the in-memory test double are
//! interchangeable.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteResult;

/// Equality filter on one declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub value: Value,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Access to the remote relational store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read all rows of `source`, optionally narrowed by equality filters.
    async fn fetch(&self, source: &str, filters: &[RowFilter]) -> RemoteResult<Vec<Value>>;

    /// Upsert `rows` into `table` in one batched call. `on_conflict` is the
    /// comma-joined primary-key column list the remote resolves against; it
    /// must match the local key ordering.
    async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> RemoteResult<()>;

    /// Delete every row matching all `filters`.
    async fn delete(&self, table: &str, filters: &[RowFilter]) -> RemoteResult<()>;

    /// Terminate the authenticated remote session.
    async fn end_session(&self) -> RemoteResult<()>;
}
