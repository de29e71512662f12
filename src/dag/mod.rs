// src/dag/mod.rs

//! Job graph and dependency resolution.
//!
//! - [`job`] holds a single job: its static description plus the
//!   lock-guarded mutable state.
//! - [`registry`] is the fixed, ordered collection of jobs for a run.
//! - [`reconciler`] advances `NotStarted` jobs once their dependencies
//!   resolve.
//! - [`reconcile_step`] defines the result type of one reconciliation pass.

pub mod job;
pub mod reconcile_step;
pub mod reconciler;
pub mod registry;

pub use job::{Inputs, Job, JobGuard, JobName};
pub use reconcile_step::ReconcileStep;
pub use reconciler::Reconciler;
pub use registry::JobRegistry;
