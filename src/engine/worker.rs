// src/engine/worker.rs

//! Fixed-size pool of workers executing queued jobs.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::dag::Job;
use crate::engine::queue::RunQueueReceiver;
use crate::errors::{JobError, Result};
use crate::exec::WorkflowRunner;
use crate::types::JobState;

/// Handle to the running workers.
#[derive(Debug)]
pub struct WorkerPool {
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Spawn `size` workers pulling from `queue`.
    ///
    /// Workers stop taking new jobs once `cancel` fires or the queue is
    /// closed and drained. A job already executing always runs to completion.
    pub fn spawn<R>(
        size: usize,
        queue: RunQueueReceiver,
        runner: Arc<R>,
        cancel: CancellationToken,
    ) -> Self
    where
        R: WorkflowRunner + 'static,
    {
        let mut workers = JoinSet::new();

        for id in 0..size.max(1) {
            let queue = queue.clone();
            let runner = Arc::clone(&runner);
            let cancel = cancel.clone();
            workers.spawn(
                worker_loop(queue, runner, cancel).instrument(info_span!("worker", id)),
            );
        }

        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to exit.
    pub async fn join(mut self) {
        while let Some(res) = self.workers.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

async fn worker_loop<R>(queue: RunQueueReceiver, runner: Arc<R>, cancel: CancellationToken)
where
    R: WorkflowRunner + 'static,
{
    debug!("worker started");

    while let Some(job) = queue.next(&cancel).await {
        let span = info_span!("job", job = %job.name());
        if let Err(e) = execute_job(&job, &runner).instrument(span).await {
            warn!(job = %job.name(), error = %e, "could not execute job");
        }
    }

    debug!("worker stopped");
}

/// Run one `Queued` job to a terminal state.
///
/// The job's lock is taken for the `Queued -> Started` transition and again
/// to record the outcome, but never while the backend runs. The backend call
/// executes on its own task so that a panicking runner still leaves the job
/// `Failed` rather than stuck in `Started`.
///
/// Returns the terminal state, or an error if the job was not `Queued`.
pub async fn execute_job<R>(job: &Arc<Job>, runner: &Arc<R>) -> Result<JobState>
where
    R: WorkflowRunner + 'static,
{
    job.lock().transition(JobState::Started)?;
    info!(workflow = %job.workflow(), "job started");

    let call = {
        let job = Arc::clone(job);
        let runner = Arc::clone(runner);
        async move { runner.run(job.workflow(), job.inputs()).await }
    };

    let outcome = match tokio::spawn(call.in_current_span()).await {
        Ok(outcome) => outcome,
        Err(e) => Err(anyhow!("workflow call aborted: {e}")),
    };

    let mut guard = job.lock();
    match outcome {
        Ok(()) => {
            guard.transition(JobState::Succeeded)?;
            info!("job succeeded");
            Ok(JobState::Succeeded)
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(error = %message, "job failed");
            guard.fail(JobState::Failed, JobError::Execution(message))?;
            Ok(JobState::Failed)
        }
    }
}
