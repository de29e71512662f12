// src/dag/job.rs

//! A single node of the job matrix.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use crate::errors::{JobError, JobMatrixError, Result};
use crate::types::JobState;

/// Canonical job name type.
pub type JobName = String;

/// Opaque parameters handed to the execution backend.
pub type Inputs = BTreeMap<String, toml::Value>;

/// Mutable part of a job, only reachable through [`Job::lock`].
#[derive(Debug, Default)]
struct JobStatus {
    state: JobState,
    last_error: Option<JobError>,
}

/// A job in the dependency graph.
///
/// The static description (`name`, `dependency_names`, `workflow`, `inputs`)
/// never changes during a run. `state` and `last_error` live behind a per-job
/// mutex. The state is mirrored into an atomic so that peers can read it
/// without taking this job's lock; every write goes through [`JobGuard`],
/// which keeps the mirror in sync while the lock is held.
#[derive(Debug)]
pub struct Job {
    name: JobName,
    dependency_names: Vec<JobName>,
    workflow: String,
    inputs: Inputs,
    observed: AtomicU8,
    status: Mutex<JobStatus>,
}

impl Job {
    pub fn new(
        name: impl Into<JobName>,
        dependency_names: Vec<JobName>,
        workflow: impl Into<String>,
        inputs: Inputs,
    ) -> Self {
        Self::with_state(name, dependency_names, workflow, inputs, JobState::NotStarted)
    }

    /// Build a job that starts the run in `state` instead of `NotStarted`.
    pub fn with_state(
        name: impl Into<JobName>,
        dependency_names: Vec<JobName>,
        workflow: impl Into<String>,
        inputs: Inputs,
        state: JobState,
    ) -> Self {
        Self {
            name: name.into(),
            dependency_names,
            workflow: workflow.into(),
            inputs,
            observed: AtomicU8::new(state.as_u8()),
            status: Mutex::new(JobStatus {
                state,
                last_error: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependency_names(&self) -> &[JobName] {
        &self.dependency_names
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Lock-free read of the current state.
    ///
    /// The value may be stale by the time the caller acts on it. Decisions
    /// that must not race go through [`Job::lock`] and re-check there.
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.observed.load(Ordering::Acquire))
    }

    /// Snapshot of the captured error, if any.
    pub fn last_error(&self) -> Option<JobError> {
        self.lock().last_error().cloned()
    }

    /// Take the job's exclusive lock.
    ///
    /// The guard must never be held across an `.await`.
    pub fn lock(&self) -> JobGuard<'_> {
        // A poisoned lock only means another holder panicked mid-update; the
        // status itself is always a valid value.
        let status = self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        JobGuard { job: self, status }
    }
}

/// Exclusive access to a job's mutable fields.
pub struct JobGuard<'a> {
    job: &'a Job,
    status: MutexGuard<'a, JobStatus>,
}

impl JobGuard<'_> {
    pub fn state(&self) -> JobState {
        self.status.state
    }

    pub fn last_error(&self) -> Option<&JobError> {
        self.status.last_error.as_ref()
    }

    /// Apply a legal state transition.
    pub fn transition(&mut self, next: JobState) -> Result<()> {
        let current = self.status.state;
        if !current.can_transition_to(next) {
            return Err(JobMatrixError::IllegalTransition {
                job: self.job.name.clone(),
                from: current,
                to: next,
            });
        }

        trace!(job = %self.job.name, from = %current, to = %next, "job transition");
        self.status.state = next;
        self.job.observed.store(next.as_u8(), Ordering::Release);
        Ok(())
    }

    /// Transition into a failure state and record its cause.
    pub fn fail(&mut self, next: JobState, cause: JobError) -> Result<()> {
        self.transition(next)?;
        self.status.last_error = Some(cause);
        Ok(())
    }
}
