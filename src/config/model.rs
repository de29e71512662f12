// src/config/model.rs

use serde::Deserialize;

use crate::dag::Inputs;
use crate::types::JobState;

/// Top-level matrix file as read from TOML, before validation.
///
/// ```toml
/// [run]
/// concurrency = 2
/// reconcile_interval_ms = 1000
///
/// [[job]]
/// name = "build-a"
/// workflow = "make a"
///
/// [[job]]
/// name = "test-a"
/// workflow = "make test-a"
/// depends_on = ["build-a"]
/// [job.inputs]
/// target = "x86_64"
/// ```
///
/// The order of the `[[job]]` tables is the matrix order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMatrixFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// Validated matrix. Only obtainable through `TryFrom<RawMatrixFile>`
/// (see `config::validate`) or [`MatrixFile::new_unchecked`].
#[derive(Debug, Clone)]
pub struct MatrixFile {
    pub run: RunSection,
    pub job: Vec<JobConfig>,
}

impl MatrixFile {
    /// Construct without validation. Callers are responsible for upholding
    /// the invariants checked in `config::validate`.
    pub fn new_unchecked(run: RunSection, job: Vec<JobConfig>) -> Self {
        Self { run, job }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Number of workers, which is also the run queue capacity.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Delay between reconciliation passes, in milliseconds.
    #[serde(default = "default_reconcile_interval_ms")]
    pub reconcile_interval_ms: u64,
}

fn default_concurrency() -> usize {
    1
}

fn default_reconcile_interval_ms() -> u64 {
    1000
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            reconcile_interval_ms: default_reconcile_interval_ms(),
        }
    }
}

/// One `[[job]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,

    /// Passed to the execution backend as-is. For the default command
    /// backend this is the shell command to run.
    pub workflow: String,

    /// Names of the jobs this one waits on, in evaluation order.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Passed to the execution backend alongside `workflow`.
    #[serde(default)]
    pub inputs: Inputs,

    /// Initial state, e.g. `"Succeeded"` to treat a job as already done
    /// when resuming a partially finished matrix.
    #[serde(default)]
    pub state: JobState,
}
