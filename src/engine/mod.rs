// src/engine/mod.rs

//! Run engine for jobmatrix.
//!
//! This module ties together:
//! - the bounded run queue between dispatcher and workers ([`queue`])
//! - the `Ready -> Queued` hand-off ([`dispatcher`])
//! - the worker pool that executes jobs ([`worker`])
//! - the controller that owns the reconcile cadence, the pool lifetime and
//!   cancellation ([`controller`])
//! - the aggregate outcome of a run ([`report`])

use std::time::Duration;

use crate::config::RunSection;

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Number of workers, which is also the run queue capacity.
    pub concurrency: usize,
    /// Delay between reconciliation passes.
    pub reconcile_interval: Duration,
}

impl RunOptions {
    pub fn from_config(run: &RunSection) -> Self {
        Self {
            concurrency: run.concurrency,
            reconcile_interval: Duration::from_millis(run.reconcile_interval_ms),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&RunSection::default())
    }
}

pub mod controller;
pub mod dispatcher;
pub mod queue;
pub mod report;
pub mod worker;

pub use controller::RunController;
pub use dispatcher::Dispatcher;
pub use queue::{RunQueueReceiver, RunQueueSender, run_queue};
pub use report::{RunReport, aggregate_error};
pub use worker::{WorkerPool, execute_job};
