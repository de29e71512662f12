// src/errors.rs

//! Crate-wide error types.
//!
//! - [`JobMatrixError`] is what fallible library calls return.
//! - [`JobError`] is the cause captured on a single failed job.
//! - [`MatrixError`] combines every captured job error at the end of a run.

use std::fmt;

use thiserror::Error;

use crate::types::JobState;

#[derive(Error, Debug)]
pub enum JobMatrixError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Duplicate job name: {0}")]
    DuplicateJob(String),

    #[error("Cycle detected in job matrix: {0}")]
    DagCycle(String),

    #[error("Illegal transition for job '{job}': {from} -> {to}")]
    IllegalTransition {
        job: String,
        from: JobState,
        to: JobState,
    },

    #[error("Run queue closed while dispatching")]
    QueueClosed,

    #[error("Run cancelled with {unfinished} job(s) unfinished")]
    Cancelled { unfinished: usize },

    #[error(transparent)]
    JobsFailed(#[from] MatrixError),
}

pub type Result<T> = std::result::Result<T, JobMatrixError>;

/// Why a single job ended in a failure state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The execution backend reported an error.
    #[error("{0}")]
    Execution(String),

    #[error("dependency '{dependency}' did not succeed")]
    DependencyFailed { dependency: String },

    #[error("dependency '{dependency}' does not exist")]
    BadDependency { dependency: String },
}

/// One job's contribution to a [`MatrixError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub job: String,
    pub cause: JobError,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error running job with name {}: {}", self.job, self.cause)
    }
}

/// Aggregate of every job error captured during a run, in matrix order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct MatrixError {
    failures: Vec<JobFailure>,
}

impl MatrixError {
    /// Returns `None` when there is nothing to report.
    pub fn from_failures(failures: Vec<JobFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[JobFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {} occurred:", self.failures.len(), noun)?;
        for failure in &self.failures {
            write!(f, "\n\t* {failure}")?;
        }
        Ok(())
    }
}
