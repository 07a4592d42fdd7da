//! Online/offline signal.
//!
//! The host environment feeds its connectivity state here; the engine reads
//! it to gate reconciliation and watches it to sync once per reconnect.

use tokio::sync::watch;

/// Shared connectivity flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Host entry point for the platform online/offline signal. Repeated
    /// reports of the same state do not wake subscribers.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_transitions() {
        let connectivity = Connectivity::new(true);
        assert!(connectivity.is_online());
        connectivity.set_online(false);
        assert!(!connectivity.is_online());
    }

    #[tokio::test]
    async fn subscribers_see_reconnect() {
        let connectivity = Connectivity::new(false);
        let mut rx = connectivity.subscribe();

        connectivity.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn duplicate_state_does_not_wake_subscribers() {
        let connectivity = Connectivity::new(true);
        let mut rx = connectivity.subscribe();

        connectivity.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
