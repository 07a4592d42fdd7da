//! Durable local table cache for the liftsync offline-first data layer.
//!
//! Mirrors a fixed catalog of remote tables in a per-user SQLite file. Each
//! writable row carries an `is_synced` flag (0 = locally modified, unpushed;
//! 1 = matches or was sourced from the remote store); the sync engine reads
//! and flips that flag through the dirty-state surface exposed here.

pub mod catalog;
pub mod error;
pub mod key;
pub mod store;

pub use catalog::{
    ALL_TABLES, HydrationClass, PUSH_PHASE_ONE, PUSH_PHASE_TWO, Table, TableSpec, WRITABLE_TABLES,
};
pub use error::{StoreError, StoreResult};
pub use key::{Key, KeySpec};
pub use store::{LocalStore, PendingTable, PurgeOutcome, StoreTx};
