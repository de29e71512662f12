// src/engine/dispatcher.rs

//! Moves `Ready` jobs onto the run queue.

use std::sync::Arc;

use tokio::sync::mpsc::Permit;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dag::{Job, JobRegistry};
use crate::engine::queue::RunQueueSender;
use crate::errors::{JobMatrixError, Result};
use crate::types::JobState;

/// Owns the `Ready -> Queued` transition.
///
/// For each job a queue slot is reserved first, without holding any lock.
/// Only then is the job locked, re-checked, marked `Queued` and placed into
/// the reserved slot. Placing into a reserved slot cannot fail, so a job is
/// never `Queued` without being on the queue.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    registry: &'a JobRegistry,
    queue: &'a RunQueueSender,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a JobRegistry, queue: &'a RunQueueSender) -> Self {
        Self { registry, queue }
    }

    /// Dispatch every `Ready` job in matrix order, waiting for queue space
    /// as needed.
    ///
    /// Returns how many jobs were queued. If `cancel` fires while waiting for
    /// space, dispatching stops and the remaining jobs stay `Ready`.
    pub async fn dispatch_ready_jobs(&self, cancel: &CancellationToken) -> Result<usize> {
        let mut dispatched = 0;

        for job in self.registry.filter_by_state(JobState::Ready) {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(job = %job.name(), "cancelled while waiting for queue space");
                    break;
                }
                permit = self.queue.reserve() => {
                    permit.map_err(|_| JobMatrixError::QueueClosed)?
                }
            };

            if enqueue(&job, permit)? {
                dispatched += 1;
            }
        }

        Ok(dispatched)
    }
}

/// Mark `job` as `Queued` and hand it to the reserved slot, as one step under
/// the job's lock. Returns `false` (releasing the slot) if the job is no
/// longer `Ready`.
fn enqueue(job: &Arc<Job>, permit: Permit<'_, Arc<Job>>) -> Result<bool> {
    let mut guard = job.lock();
    if guard.state() != JobState::Ready {
        return Ok(false);
    }

    guard.transition(JobState::Queued)?;
    permit.send(Arc::clone(job));
    debug!(job = %job.name(), "job queued for execution");

    Ok(true)
}
