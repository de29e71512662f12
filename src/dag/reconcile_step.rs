// src/dag/reconcile_step.rs

//! Result type for a single reconciliation pass.

use crate::dag::job::JobName;

/// What one reconciliation pass changed.
///
/// Useful for tests that want to run a pass by hand and make assertions
/// about which jobs moved, and for the controller's per-pass logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStep {
    /// Jobs moved from `NotStarted` to `Ready`.
    pub newly_ready: Vec<JobName>,
    /// Jobs moved to `DependencyFailed`.
    pub newly_dependency_failed: Vec<JobName>,
    /// Jobs moved to `BadDependency`.
    pub newly_bad_dependency: Vec<JobName>,
}

impl ReconcileStep {
    /// Whether the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.newly_ready.is_empty()
            && self.newly_dependency_failed.is_empty()
            && self.newly_bad_dependency.is_empty()
    }
}
