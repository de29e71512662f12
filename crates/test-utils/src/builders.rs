#![allow(dead_code)]

use jobmatrix::config::{JobConfig, MatrixFile, RawMatrixFile, RunSection};
use jobmatrix::dag::{Inputs, Job, JobRegistry};
use jobmatrix::types::JobState;

/// Builder for `MatrixFile` to simplify test setup.
pub struct MatrixBuilder {
    config: RawMatrixFile,
}

impl MatrixBuilder {
    pub fn new() -> Self {
        Self {
            config: RawMatrixFile {
                run: RunSection {
                    concurrency: 1,
                    // Keep tests fast; production defaults to one second.
                    reconcile_interval_ms: 5,
                },
                job: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.config.job.push(job);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.run.concurrency = n;
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.config.run.reconcile_interval_ms = ms;
        self
    }

    pub fn raw(self) -> RawMatrixFile {
        self.config
    }

    pub fn build(self) -> MatrixFile {
        MatrixFile::try_from(self.config).expect("Failed to build valid matrix from builder")
    }
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`. The workflow defaults to the job name, which is
/// what the fake runner records.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                workflow: name.to_string(),
                depends_on: vec![],
                inputs: Inputs::new(),
                state: JobState::NotStarted,
            },
        }
    }

    pub fn workflow(mut self, workflow: &str) -> Self {
        self.job.workflow = workflow.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.depends_on.push(dep.to_string());
        self
    }

    pub fn input(mut self, name: &str, value: impl Into<toml::Value>) -> Self {
        self.job.inputs.insert(name.to_string(), value.into());
        self
    }

    pub fn state(mut self, state: JobState) -> Self {
        self.job.state = state;
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// Shorthand for a job with the given dependencies whose workflow is its name.
pub fn job(name: &str, deps: &[&str], state: JobState) -> Job {
    Job::with_state(
        name,
        deps.iter().map(|d| d.to_string()).collect(),
        name,
        Inputs::new(),
        state,
    )
}

/// Registry from `(name, deps, state)` triples, in the given order.
pub fn registry(jobs: &[(&str, &[&str], JobState)]) -> JobRegistry {
    JobRegistry::from_jobs(jobs.iter().map(|(name, deps, state)| job(name, deps, *state)))
        .expect("duplicate job names in test registry")
}
