//! One-shot cancellable delays
//!
//! Every retry and poll reschedule is a fresh one-shot delay. A shared
//! `CancelToken` invalidates whichever delay is pending.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::error::TransferError;

#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Invalidate the pending delay and every later one
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait `delay`, or return `Cancelled` as soon as the token fires
    pub async fn sleep(&self, delay: Duration) -> Result<(), TransferError> {
        let mut rx = self.tx.subscribe();
        if *rx.borrow_and_update() {
            return Err(TransferError::Cancelled);
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = rx.wait_for(|cancelled| *cancelled) => Err(TransferError::Cancelled),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_elapses() {
        let token = CancelToken::new();
        let start = tokio::time::Instant::now();

        token.sleep(Duration::from_secs(3)).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(!token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_sleep() {
        let token = CancelToken::new();
        let sleeper = token.clone();

        let task = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(TransferError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_after_cancel_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();

        let start = tokio::time::Instant::now();
        let result = token.sleep(Duration::from_secs(60)).await;

        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
