//! Error types for the local table cache

use thiserror::Error;

/// Errors that can occur in local cache operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(String),

    /// Row payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row is not a JSON object
    #[error("Table {table}: row must be a JSON object")]
    NotObject { table: &'static str },

    /// Row is missing a declared primary-key field
    #[error("Table {table}: row is missing key field '{field}'")]
    MissingKeyField {
        table: &'static str,
        field: &'static str,
    },

    /// Key value count does not match the table's key shape
    #[error("Table {table}: expected {expected} key value(s), got {got}")]
    KeyArity {
        table: &'static str,
        expected: usize,
        got: usize,
    },

    /// Field value cannot be stored in a key or index column
    #[error("Table {table}: field '{field}' is not an indexable scalar")]
    NotIndexable { table: &'static str, field: String },

    /// Queried fields do not name the primary key or a declared index
    #[error("Table {table}: no declared index on ({fields})")]
    UnknownIndex { table: &'static str, fields: String },

    /// File system error while opening a store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Result type for local cache operations
pub type StoreResult<T> = Result<T, StoreError>;
