//! Session hydration.
//!
//! Pulls the full table catalog from the remote store into the local cache
//! once per authenticated session, before the host considers the
//! application interactive. Fetches run concurrently; a failed fetch only
//! costs that one table its fresh data.

use futures::future::join_all;
use liftsync_remote::RowFilter;
use liftsync_store::{ALL_TABLES, HydrationClass, Table};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;
use crate::error::EngineResult;

impl SyncEngine {
    /// Populate the local cache from the remote store.
    ///
    /// Runs at most once per session; later calls return immediately until
    /// the hydration lock is reset by sign-out or a purge. Fetch failures
    /// are logged and skipped, so partial hydration still unblocks the
    /// host; only local storage failures propagate.
    pub async fn hydrate(&self, user_id: &str) -> EngineResult<()> {
        if !self.session.begin_hydration() {
            debug!("hydration already ran this session");
            return Ok(());
        }

        info!(user_id, "hydrating local cache");
        let results = join_all(
            ALL_TABLES
                .iter()
                .map(|&table| self.hydrate_table(table, user_id)),
        )
        .await;

        let mut tables = 0usize;
        let mut rows = 0usize;
        for result in results {
            let written = result?;
            if written > 0 {
                tables += 1;
                rows += written;
            }
        }
        info!(tables, rows, "hydration complete");
        Ok(())
    }

    async fn hydrate_table(&self, table: Table, user_id: &str) -> EngineResult<usize> {
        let spec = table.spec();
        let filters = match spec.hydration {
            HydrationClass::UserOwned => vec![RowFilter::eq("user_id", user_id)],
            HydrationClass::Static | HydrationClass::Snapshot | HydrationClass::Relational => {
                Vec::new()
            }
        };

        let rows = match self.remote.fetch(spec.remote_source, &filters).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(table = spec.name, error = %e, "hydration fetch failed; keeping local data");
                return Ok(0);
            }
        };
        if rows.is_empty() {
            return Ok(0);
        }

        // The wire payload has no is_synced column; rows sourced from the
        // remote store are synced by definition.
        let stamped: Vec<Value> = rows
            .into_iter()
            .map(|mut row| {
                if let Some(obj) = row.as_object_mut() {
                    obj.insert("is_synced".to_string(), Value::from(1));
                }
                row
            })
            .collect();

        let written = self.store.bulk_put(table, &stamped)?;
        debug!(table = spec.name, rows = written, "hydrated table");
        Ok(written)
    }
}
