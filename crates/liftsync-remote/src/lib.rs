//! Remote relational store access for the liftsync data layer.
//!
//! Exposes the [`RemoteStore`] trait the sync engine pushes through, a
//! PostgREST-style HTTP implementation, and an in-memory implementation for
//! tests and offline development.

pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use error::{RemoteError, RemoteResult};
pub use http::{HttpRemote, RemoteConfig};
pub use memory::{MemoryRemote, UpsertBatch};
pub use store::{RemoteStore, RowFilter};
