//! Engine-to-host notifications.

/// Signals the engine broadcasts to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Every local table was cleared. The host must re-initialize; the next
    /// session start hydrates from the remote store again.
    CacheCleared,
    /// The session ended and local state was wiped.
    SignedOut,
}
