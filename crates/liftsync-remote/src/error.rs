//! Error types for remote store access

use thiserror::Error;

/// Errors that can occur talking to the remote store
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (connect, DNS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote store rejected the request
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

/// Result type for remote store operations
pub type RemoteResult<T> = Result<T, RemoteError>;
