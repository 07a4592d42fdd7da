//! Core engine facade.
//!
//! Owns the local store, the remote seam, the connectivity flag, and the
//! session hydration lock. The host application drives everything through
//! this type: `hydrate` at session start, `reconcile` on foreground and
//! reconnect, `safe_purge`/`sign_out` for destructive operations, and the
//! store accessor for plain table CRUD.

use chrono::{DateTime, Utc};
use liftsync_remote::{RemoteStore, RowFilter};
use liftsync_store::{Key, LocalStore, PurgeOutcome, Table};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::connectivity::Connectivity;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::session::Session;

/// Offline-first sync engine over one authenticated identity's cache.
pub struct SyncEngine {
    pub(crate) store: Arc<LocalStore>,
    pub(crate) remote: Arc<dyn RemoteStore>,
    pub(crate) connectivity: Connectivity,
    pub(crate) session: Session,
    pub(crate) events: broadcast::Sender<EngineEvent>,
    pub(crate) last_reconcile_at: RwLock<Option<DateTime<Utc>>>,
}

impl SyncEngine {
    pub fn new(store: Arc<LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        let (events, _rx) = broadcast::channel(16);
        Self {
            store,
            remote,
            connectivity: Connectivity::default(),
            session: Session::new(),
            events,
            last_reconcile_at: RwLock::new(None),
        }
    }

    /// Generic table CRUD for the host application.
    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    /// Connectivity flag; the host feeds the platform signal here.
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Subscribe to engine notifications.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Whether this session has already hydrated.
    pub fn is_hydrated(&self) -> bool {
        self.session.is_hydrated()
    }

    /// When the last fully successful reconciliation finished.
    pub fn last_reconcile_at(&self) -> Option<DateTime<Utc>> {
        *self.last_reconcile_at.read()
    }

    /// Mint a primary key for a row created on this device. Rows written
    /// while offline need ids that cannot collide with any other device.
    pub fn new_row_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Delete a row locally and, when online, propagate the delete to the
    /// remote store. An offline delete stays local; the remote copy (if
    /// any) survives until the next hydration.
    pub async fn delete_row(&self, table: Table, key: &Key) -> EngineResult<()> {
        let spec = table.spec();
        self.store.delete(table, key)?;

        if spec.writable && self.connectivity.is_online() {
            let filters: Vec<RowFilter> = spec
                .key
                .fields()
                .iter()
                .zip(key.values())
                .map(|(field, value)| RowFilter::eq(*field, value.clone()))
                .collect();
            if let Err(e) = self.remote.delete(spec.remote_source, &filters).await {
                warn!(table = spec.name, error = %e, "remote delete failed; remote copy remains");
            }
        }
        Ok(())
    }

    /// End the session: best-effort push, then wipe local state - refusing
    /// if unpushed rows remain, unless `force` explicitly discards them.
    pub async fn sign_out(&self, force: bool) -> EngineResult<()> {
        if let Err(e) = self.reconcile().await {
            warn!(error = %e, "pre-sign-out reconciliation failed");
        }

        if force {
            self.store.clear_all()?;
        } else {
            match self.store.purge_if_clean()? {
                PurgeOutcome::Cleared => {}
                PurgeOutcome::Pending(pending) => {
                    warn!(?pending, "sign-out refused; unsynced rows remain");
                    return Err(EngineError::PendingRows(pending));
                }
            }
        }

        if let Err(e) = self.remote.end_session().await {
            warn!(error = %e, "remote session termination failed");
        }
        self.session.reset_lock();
        let _ = self.events.send(EngineEvent::SignedOut);
        info!(force, "signed out; local cache cleared");
        Ok(())
    }

    /// Watch the connectivity flag and run one reconciliation per
    /// offline-to-online transition.
    pub fn spawn_reconnect_watcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut rx = self.connectivity.subscribe();
        tokio::spawn(async move {
            let mut was_online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online && !was_online {
                    info!("connectivity restored; reconciling");
                    if let Err(e) = engine.reconcile().await {
                        warn!(error = %e, "reconnect reconciliation failed");
                    }
                }
                was_online = online;
            }
        })
    }
}
