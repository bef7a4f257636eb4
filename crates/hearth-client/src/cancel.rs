//! Cancellation signal shared between an import and whoever may abort it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Signal {
    fired: AtomicBool,
    notify: Notify,
}

/// Cloneable one-shot signal; once fired it stays fired
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    signal: Arc<Signal>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.signal.fired.swap(true, Ordering::SeqCst) {
            log::debug!(target: "hearth::upload", "cancellation requested");
        }
        self.signal.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.fired.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel is not missed
            let notified = self.signal.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let cancel = Cancellation::new();
        let waiter = cancel.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!cancel.is_cancelled());
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_resolves_immediately() {
        let cancel = Cancellation::new();
        cancel.cancel();
        cancel.cancel();
        tokio::time::timeout(Duration::from_millis(100), cancel.cancelled()).await.unwrap();
    }
}
