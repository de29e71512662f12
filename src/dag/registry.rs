// src/dag/registry.rs

//! Fixed collection of every job in a run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::model::MatrixFile;
use crate::dag::job::Job;
use crate::errors::{JobFailure, JobMatrixError, Result};
use crate::types::JobState;

/// In-memory registry of all jobs for one run.
///
/// Membership never changes after construction, so every query here is a
/// plain read over the job list; no registry-wide lock exists. Per-job
/// state is read through [`Job::state`], which never blocks on a job lock.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: Vec<Arc<Job>>,
    index: HashMap<String, usize>,
}

impl JobRegistry {
    /// Build a registry from already constructed jobs, keeping their order
    /// as the matrix order.
    pub fn from_jobs(jobs: impl IntoIterator<Item = Job>) -> Result<Self> {
        let mut list = Vec::new();
        let mut index = HashMap::new();

        for job in jobs {
            if index.insert(job.name().to_string(), list.len()).is_some() {
                return Err(JobMatrixError::DuplicateJob(job.name().to_string()));
            }
            list.push(Arc::new(job));
        }

        Ok(Self { jobs: list, index })
    }

    /// Build a registry from a validated [`MatrixFile`].
    pub fn from_config(cfg: &MatrixFile) -> Result<Self> {
        Self::from_jobs(cfg.job.iter().map(|job| {
            Job::with_state(
                job.name.clone(),
                job.depends_on.clone(),
                job.workflow.clone(),
                job.inputs.clone(),
                job.state,
            )
        }))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// All jobs in matrix order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Job>> {
        self.jobs.iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Job>> {
        self.index.get(name).map(|&i| &self.jobs[i])
    }

    /// Jobs currently in `state`, in matrix order.
    pub fn filter_by_state(&self, state: JobState) -> Vec<Arc<Job>> {
        self.jobs
            .iter()
            .filter(|job| job.state() == state)
            .cloned()
            .collect()
    }

    /// Number of jobs per state. States with no jobs are omitted.
    pub fn count_by_state(&self) -> BTreeMap<JobState, usize> {
        let mut counts = BTreeMap::new();
        for job in &self.jobs {
            *counts.entry(job.state()).or_insert(0) += 1;
        }
        counts
    }

    pub fn all_terminal(&self) -> bool {
        self.jobs.iter().all(|job| job.state().is_terminal())
    }

    /// Every captured job error, in matrix order.
    pub fn errors(&self) -> Vec<JobFailure> {
        self.jobs
            .iter()
            .filter_map(|job| {
                job.last_error().map(|cause| JobFailure {
                    job: job.name().to_string(),
                    cause,
                })
            })
            .collect()
    }
}
