//! Error types for the sync engine

use liftsync_remote::RemoteError;
use liftsync_store::{PendingTable, StoreError};
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Local cache failure
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// Remote store failure
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Unpushed rows block a destructive operation; nothing was cleared
    #[error("{}", pending_summary(.0))]
    PendingRows(Vec<PendingTable>),
}

/// User-facing summary naming every table that still holds unpushed rows.
fn pending_summary(pending: &[PendingTable]) -> String {
    let total: usize = pending.iter().map(|p| p.count).sum();
    let tables = pending
        .iter()
        .map(|p| format!("{} ({})", p.table, p.count))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{total} unsynced row(s) would be lost: {tables}")
}

/// Result type for sync engine operations
pub type EngineResult<T> = Result<T, EngineError>;
