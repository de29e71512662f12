// src/exec/mod.rs

//! Execution backends.
//!
//! - [`backend`] defines the `WorkflowRunner` trait the worker pool calls
//!   for each job, so tests can substitute a fake implementation.
//! - [`command`] provides `CommandRunner`, which runs each workflow as a
//!   shell command using `tokio::process::Command`.

pub mod backend;
pub mod command;

pub use backend::{WorkflowRun, WorkflowRunner};
pub use command::CommandRunner;
