//! Guarded cache purge.
//!
//! A purge is irreversible, so it only proceeds when every writable table
//! has zero unpushed rows. The count and the wipe run inside one store
//! transaction; no write can land in between.

use liftsync_store::PurgeOutcome;
use tracing::{info, warn};

use crate::engine::SyncEngine;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;

impl SyncEngine {
    /// Clear every local table, refusing while unpushed rows remain.
    ///
    /// Attempts a reconciliation first to shrink the dirty set; its outcome
    /// is advisory only - the transactional dirty check decides. On refusal
    /// the error names each pending table and its row count and the store
    /// is left untouched. On success the hydration lock resets and
    /// [`EngineEvent::CacheCleared`] tells the host to re-initialize.
    pub async fn safe_purge(&self) -> EngineResult<()> {
        if let Err(e) = self.reconcile().await {
            warn!(error = %e, "pre-purge reconciliation failed");
        }

        match self.store.purge_if_clean()? {
            PurgeOutcome::Pending(pending) => {
                warn!(?pending, "purge refused; unsynced rows remain");
                Err(EngineError::PendingRows(pending))
            }
            PurgeOutcome::Cleared => {
                self.session.reset_lock();
                let _ = self.events.send(EngineEvent::CacheCleared);
                info!("local cache purged");
                Ok(())
            }
        }
    }
}
