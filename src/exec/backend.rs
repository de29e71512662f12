// src/exec/backend.rs

//! Pluggable execution backend abstraction.
//!
//! Workers talk to a `WorkflowRunner` instead of spawning processes
//! themselves. This makes it easy to swap in a fake runner in tests while
//! keeping the production implementation in [`command`](super::command).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dag::Inputs;

/// Boxed future returned by [`WorkflowRunner::run`].
pub type WorkflowRun<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Performs one unit of work given a workflow name and its inputs.
///
/// A worker awaits the returned future to completion before it takes the
/// next job, and the call is never cancelled mid-flight. Any `Err` is a hard
/// failure of that job; nothing is retried.
pub trait WorkflowRunner: Send + Sync {
    fn run<'a>(&'a self, workflow: &'a str, inputs: &'a Inputs) -> WorkflowRun<'a>;
}

impl<R: WorkflowRunner + ?Sized> WorkflowRunner for Arc<R> {
    fn run<'a>(&'a self, workflow: &'a str, inputs: &'a Inputs) -> WorkflowRun<'a> {
        (**self).run(workflow, inputs)
    }
}
