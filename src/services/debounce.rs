//! Debounced value propagation.
//!
//! Every update restarts a quiet-period timer; only a value that survives
//! the full period unchallenged is published. Intermediate values within
//! a window are never queued.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Delays propagation of a rapidly-changing value by a fixed quiet period.
pub struct Debouncer<T: Clone + Send + Sync + 'static> {
    delay: Duration,
    tx: watch::Sender<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Create a debouncer seeded with `initial` and a receiver for the
    /// published values.
    pub fn new(initial: T, delay: Duration) -> (Self, watch::Receiver<T>) {
        let (tx, rx) = watch::channel(initial);
        (
            Self {
                delay,
                tx,
                pending: Mutex::new(None),
            },
            rx,
        )
    }

    /// Feed a new value, discarding any timer still pending. Must run
    /// inside a tokio runtime.
    pub fn update(&self, value: T) {
        let tx = self.tx.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            // Receivers may already be gone on teardown; nothing to do then.
            let _ = tx.send(value);
        });

        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel any pending publication.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        // Nothing may publish after the consumer is gone.
        self.cancel();
    }
}
