// src/engine/controller.rs

use std::fmt;
use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dag::{JobRegistry, Reconciler};
use crate::engine::RunOptions;
use crate::engine::dispatcher::Dispatcher;
use crate::engine::queue::{RunQueueSender, run_queue};
use crate::engine::report::RunReport;
use crate::engine::worker::WorkerPool;
use crate::errors::Result;
use crate::exec::WorkflowRunner;
use crate::types::JobState;

/// Drives one run of the matrix to completion.
///
/// Owns the run queue (capacity = worker count), the worker pool and the
/// reconcile cadence. Every tick it reconciles, stops if every job is
/// terminal, and otherwise dispatches whatever became `Ready`.
pub struct RunController<R: WorkflowRunner + 'static> {
    registry: Arc<JobRegistry>,
    runner: Arc<R>,
    options: RunOptions,
}

impl<R: WorkflowRunner + 'static> fmt::Debug for RunController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunController")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: WorkflowRunner + 'static> RunController<R> {
    pub fn new(registry: Arc<JobRegistry>, runner: Arc<R>, options: RunOptions) -> Self {
        Self {
            registry,
            runner,
            options,
        }
    }

    /// Run until every job is terminal or `cancel` fires.
    ///
    /// On cancellation no new job is started, but jobs already executing are
    /// awaited before the report is built.
    pub async fn run(self, cancel: CancellationToken) -> Result<RunReport> {
        let concurrency = self.options.concurrency.max(1);
        info!(
            jobs = self.registry.len(),
            concurrency,
            interval = ?self.options.reconcile_interval,
            "run started"
        );

        let (queue_tx, queue_rx) = run_queue(concurrency);
        let worker_cancel = cancel.child_token();
        let workers = WorkerPool::spawn(
            concurrency,
            queue_rx,
            Arc::clone(&self.runner),
            worker_cancel.clone(),
        );

        let outcome = self.reconcile_loop(&queue_tx, &cancel).await;

        // Closing the queue lets idle workers exit; on error they are told to
        // stop as well. In-flight jobs finish either way.
        drop(queue_tx);
        if outcome.is_err() {
            worker_cancel.cancel();
        }
        workers.join().await;

        let cancelled = outcome?;
        let report = RunReport::from_registry(&self.registry, cancelled);

        info!(
            cancelled,
            succeeded = report.count(JobState::Succeeded),
            failed = report.count(JobState::Failed),
            dependency_failed = report.count(JobState::DependencyFailed),
            bad_dependency = report.count(JobState::BadDependency),
            unfinished = report.unfinished(),
            "run finished"
        );

        Ok(report)
    }

    /// Returns `true` if the loop stopped because of cancellation.
    async fn reconcile_loop(
        &self,
        queue: &RunQueueSender,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let mut ticker = interval(self.options.reconcile_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stall_reported = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("cancellation requested; no new jobs will start");
                    return Ok(true);
                }
                _ = ticker.tick() => {}
            }

            let step = Reconciler::new(&self.registry).reconcile();
            if !step.is_empty() {
                debug!(
                    ready = ?step.newly_ready,
                    dependency_failed = ?step.newly_dependency_failed,
                    bad_dependency = ?step.newly_bad_dependency,
                    "reconciliation pass advanced jobs"
                );
            }

            if self.registry.all_terminal() {
                return Ok(false);
            }

            let dispatched = Dispatcher::new(&self.registry, queue)
                .dispatch_ready_jobs(cancel)
                .await?;
            if dispatched > 0 {
                debug!(dispatched, "dispatched ready jobs");
            }

            if !stall_reported && step.is_empty() && dispatched == 0 && self.is_stalled() {
                warn!(
                    counts = ?self.registry.count_by_state(),
                    "no job can make progress; waiting for cancellation"
                );
                stall_reported = true;
            }
        }
    }

    /// Nothing is runnable or running, yet some job is still not terminal.
    /// Only reachable with a dependency cycle in an unvalidated matrix.
    fn is_stalled(&self) -> bool {
        let counts = self.registry.count_by_state();
        let active = [JobState::Ready, JobState::Queued, JobState::Started]
            .iter()
            .any(|state| counts.contains_key(state));

        !active && counts.contains_key(&JobState::NotStarted)
    }
}
