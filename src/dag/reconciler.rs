// src/dag/reconciler.rs

//! Dependency resolution for jobs that have not started yet.

use tracing::{debug, info, warn};

use crate::dag::job::{Job, JobGuard, JobName};
use crate::dag::reconcile_step::ReconcileStep;
use crate::dag::registry::JobRegistry;
use crate::errors::JobError;
use crate::types::JobState;

/// Outcome of evaluating one job's dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    /// Some dependency has not reached a terminal state yet.
    Unresolved,
    /// Every dependency succeeded.
    Ready,
    /// This dependency failed, directly or transitively.
    DependencyFailed(JobName),
    /// This dependency does not exist in the registry.
    BadDependency(JobName),
}

/// Advances `NotStarted` jobs whose dependencies have resolved.
///
/// Owns exactly the transitions out of `NotStarted`. A job's own lock is held
/// only while its dependencies are evaluated; dependencies themselves are read
/// through [`Job::state`] and never locked. A stale read can only delay a job
/// to the next pass, since dependency states only ever move forward.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    registry: &'a JobRegistry,
}

impl<'a> Reconciler<'a> {
    pub fn new(registry: &'a JobRegistry) -> Self {
        Self { registry }
    }

    /// Run one reconciliation pass over every job, in matrix order.
    ///
    /// Jobs resolved earlier in the pass are visible to jobs later in the
    /// same pass, so a failure propagates down a chain listed in order in a
    /// single call.
    pub fn reconcile(&self) -> ReconcileStep {
        let mut step = ReconcileStep::default();

        for job in self.registry.iter() {
            // Cheap check first so running jobs are never locked here.
            if job.state() != JobState::NotStarted {
                continue;
            }

            let mut guard = job.lock();
            if guard.state() != JobState::NotStarted {
                continue;
            }

            match self.resolve(job) {
                Resolution::Unresolved => {}
                Resolution::Ready => {
                    if apply(job, &mut guard, JobState::Ready, None) {
                        debug!(job = %job.name(), "dependencies satisfied; job is Ready");
                        step.newly_ready.push(job.name().to_string());
                    }
                }
                Resolution::DependencyFailed(dependency) => {
                    info!(
                        job = %job.name(),
                        dependency = %dependency,
                        "dependency did not succeed; skipping job"
                    );
                    let cause = JobError::DependencyFailed { dependency };
                    if apply(job, &mut guard, JobState::DependencyFailed, Some(cause)) {
                        step.newly_dependency_failed.push(job.name().to_string());
                    }
                }
                Resolution::BadDependency(dependency) => {
                    warn!(
                        job = %job.name(),
                        dependency = %dependency,
                        "job depends on a job that is not in the matrix"
                    );
                    let cause = JobError::BadDependency { dependency };
                    if apply(job, &mut guard, JobState::BadDependency, Some(cause)) {
                        step.newly_bad_dependency.push(job.name().to_string());
                    }
                }
            }
        }

        step
    }

    /// Evaluate dependencies in listed order; the first disqualifying one wins.
    fn resolve(&self, job: &Job) -> Resolution {
        for dep_name in job.dependency_names() {
            let Some(dep) = self.registry.find_by_name(dep_name) else {
                return Resolution::BadDependency(dep_name.clone());
            };

            match dep.state() {
                JobState::Succeeded => continue,
                JobState::Failed | JobState::DependencyFailed | JobState::BadDependency => {
                    return Resolution::DependencyFailed(dep_name.clone());
                }
                JobState::NotStarted | JobState::Ready | JobState::Queued | JobState::Started => {
                    return Resolution::Unresolved;
                }
            }
        }

        Resolution::Ready
    }
}

/// Apply a reconciler-owned transition, logging instead of propagating the
/// (unreachable after the locked re-check) illegal-transition error.
fn apply(job: &Job, guard: &mut JobGuard<'_>, next: JobState, cause: Option<JobError>) -> bool {
    let res = match cause {
        Some(cause) => guard.fail(next, cause),
        None => guard.transition(next),
    };

    match res {
        Ok(()) => true,
        Err(e) => {
            warn!(job = %job.name(), error = %e, "reconciler transition rejected");
            false
        }
    }
}
