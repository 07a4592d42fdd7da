//! Session-scoped hydration state.
//!
//! The hydration lock is owned by the engine and reset at sign-out or after
//! a purge, so a fresh session always re-hydrates. It is deliberately not a
//! process-wide flag: two engines (two identities) hold two independent
//! locks.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the current authenticated session has already hydrated.
#[derive(Debug, Default)]
pub struct Session {
    hydrated: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the one hydration slot for this session. Returns false when a
    /// hydration pass already ran (or is running).
    pub fn begin_hydration(&self) -> bool {
        self.hydrated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated.load(Ordering::SeqCst)
    }

    /// Release the slot so the next session hydrates again.
    pub fn reset_lock(&self) {
        self.hydrated.store(false, Ordering::SeqCst);
    }
}
