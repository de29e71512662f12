// src/engine/queue.rs

//! Bounded run queue between the dispatcher and the worker pool.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::dag::Job;

/// Sending half, owned by the controller and lent to the dispatcher.
pub type RunQueueSender = mpsc::Sender<Arc<Job>>;

/// Create a run queue holding at most `capacity` jobs.
///
/// `capacity` is clamped to at least 1.
pub fn run_queue(capacity: usize) -> (RunQueueSender, RunQueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, RunQueueReceiver::new(rx))
}

/// Receiving half, shared by every worker.
///
/// `mpsc` has a single consumer, so workers take turns holding the receiver
/// while they wait for the next job.
#[derive(Debug, Clone)]
pub struct RunQueueReceiver {
    inner: Arc<Mutex<mpsc::Receiver<Arc<Job>>>>,
}

impl RunQueueReceiver {
    fn new(rx: mpsc::Receiver<Arc<Job>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Wait for the next job.
    ///
    /// Returns `None` once `cancel` fires or every sender is gone and the
    /// queue is drained. Cancellation wins over a job that is already
    /// waiting, so nothing new starts after the signal.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<Arc<Job>> {
        let mut rx = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            rx = self.inner.lock() => rx,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = rx.recv() => job,
        }
    }
}
