// src/engine/report.rs

//! Final outcome of a run.

use std::collections::BTreeMap;

use crate::dag::JobRegistry;
use crate::errors::{JobMatrixError, MatrixError, Result};
use crate::types::JobState;

/// Combine every captured job error into one value, or `None` if no job
/// recorded an error.
pub fn aggregate_error(registry: &JobRegistry) -> Option<MatrixError> {
    MatrixError::from_failures(registry.errors())
}

/// What a finished (or cancelled) run left behind.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Jobs per final state; states with no jobs are omitted.
    pub counts: BTreeMap<JobState, usize>,
    /// Whether the run stopped because of the cancellation signal.
    pub cancelled: bool,
    /// Every job-level failure, if any.
    pub error: Option<MatrixError>,
}

impl RunReport {
    pub fn from_registry(registry: &JobRegistry, cancelled: bool) -> Self {
        Self {
            counts: registry.count_by_state(),
            cancelled,
            error: aggregate_error(registry),
        }
    }

    pub fn count(&self, state: JobState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    /// Jobs that never reached a terminal state.
    pub fn unfinished(&self) -> usize {
        self.counts
            .iter()
            .filter(|(state, _)| !state.is_terminal())
            .map(|(_, n)| n)
            .sum()
    }

    /// True when every job finished and none recorded an error.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.unfinished() == 0
    }

    /// Job failures take precedence over cancellation.
    pub fn into_result(self) -> Result<()> {
        if let Some(err) = self.error {
            return Err(JobMatrixError::JobsFailed(err));
        }

        let unfinished = self.unfinished();
        if unfinished > 0 {
            return Err(JobMatrixError::Cancelled { unfinished });
        }

        Ok(())
    }
}
