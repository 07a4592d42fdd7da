//! Push reconciliation.
//!
//! Makes the remote store eventually consistent with every locally dirty
//! row. Parent tables push one at a time in declared order; relation and
//! log tables push concurrently afterwards, so the remote store never sees
//! a child row before its parent.

use chrono::Utc;
use futures::future::join_all;
use liftsync_store::{PUSH_PHASE_ONE, PUSH_PHASE_TWO, Table};
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;
use crate::error::{EngineError, EngineResult};

impl SyncEngine {
    /// Push every dirty row to the remote store in dependency order.
    ///
    /// No-op while offline. A remote failure ends the attempt without
    /// touching any further table; tables already flipped stay synced, so
    /// each pass preserves forward progress. Safe to invoke again while a
    /// previous pass is in flight: upserts are idempotent and flipping an
    /// already-synced flag changes nothing, so overlap costs at most
    /// redundant network calls.
    pub async fn reconcile(&self) -> EngineResult<()> {
        if !self.connectivity.is_online() {
            debug!("offline; skipping reconciliation");
            return Ok(());
        }

        // Phase 1: parents, strictly ordered. Each table fully completes,
        // flag update included, before the next starts.
        for &table in PUSH_PHASE_ONE {
            match self.push_table(table).await {
                Ok(_) => {}
                Err(EngineError::Remote(e)) => {
                    warn!(table = table.name(), error = %e, "push failed; ending reconciliation attempt");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        // Phase 2: relation and log tables, concurrently. They only depend
        // on phase 1 having completed.
        let pushes = PUSH_PHASE_TWO
            .iter()
            .map(|&table| async move { (table, self.push_table(table).await) });
        let mut failed = false;
        for (table, result) in join_all(pushes).await {
            match result {
                Ok(_) => {}
                Err(EngineError::Remote(e)) => {
                    warn!(table = table.name(), error = %e, "push failed");
                    failed = true;
                }
                Err(e) => return Err(e),
            }
        }

        if !failed {
            *self.last_reconcile_at.write() = Some(Utc::now());
        }
        Ok(())
    }

    /// Push one table's dirty rows in a single batched upsert, then flip
    /// exactly those rows to synced. Flags are only touched after the whole
    /// batch is accepted; a failed upsert leaves every row dirty for the
    /// next pass.
    async fn push_table(&self, table: Table) -> EngineResult<usize> {
        let spec = table.spec();
        let dirty = self.store.dirty_rows(table)?;
        if dirty.is_empty() {
            return Ok(0);
        }

        let mut keys = Vec::with_capacity(dirty.len());
        let mut payload = Vec::with_capacity(dirty.len());
        for mut row in dirty {
            keys.push(spec.key.extract(spec.name, &row)?);
            if let Some(obj) = row.as_object_mut() {
                // The remote schema has no is_synced column
                obj.remove("is_synced");
            }
            payload.push(row);
        }

        self.remote
            .upsert(spec.remote_source, &payload, &spec.key.conflict_target())
            .await?;
        let flipped = self.store.mark_synced(table, &keys)?;
        info!(table = spec.name, pushed = payload.len(), flipped, "pushed dirty rows");
        Ok(payload.len())
    }
}
