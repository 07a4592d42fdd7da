//! Offline-first sync engine for the liftsync data layer.
//!
//! Wires the local table cache to the remote relational store: one
//! hydration pull per authenticated session, push-only reconciliation of
//! dirty rows in dependency order, and a guarded purge that refuses to
//! discard anything that has not been pushed.

pub mod connectivity;
pub mod engine;
pub mod error;
pub mod events;
mod hydration;
mod purge;
mod reconcile;
pub mod session;

pub use connectivity::Connectivity;
pub use engine::SyncEngine;
pub use error::{EngineError, EngineResult};
pub use events::EngineEvent;
pub use session::Session;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "liftsync_engine=info,liftsync_store=info,liftsync_remote=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
