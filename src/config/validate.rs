// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{MatrixFile, RawMatrixFile};
use crate::errors::{JobMatrixError, Result};
use crate::types::JobState;

impl TryFrom<RawMatrixFile> for MatrixFile {
    type Error = crate::errors::JobMatrixError;

    fn try_from(raw: RawMatrixFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(MatrixFile::new_unchecked(raw.run, raw.job))
    }
}

fn validate_raw_config(cfg: &RawMatrixFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_run_section(cfg)?;
    validate_job_names(cfg)?;
    validate_initial_states(cfg)?;
    validate_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawMatrixFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(JobMatrixError::ConfigError(
            "matrix must contain at least one [[job]] table".to_string(),
        ));
    }
    Ok(())
}

fn validate_run_section(cfg: &RawMatrixFile) -> Result<()> {
    if cfg.run.concurrency == 0 {
        return Err(JobMatrixError::ConfigError(
            "[run].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.run.reconcile_interval_ms == 0 {
        return Err(JobMatrixError::ConfigError(
            "[run].reconcile_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_job_names(cfg: &RawMatrixFile) -> Result<()> {
    let mut seen = HashSet::new();

    for (i, job) in cfg.job.iter().enumerate() {
        if job.name.trim().is_empty() {
            return Err(JobMatrixError::ConfigError(format!(
                "job #{} has an empty name",
                i + 1
            )));
        }
        if !seen.insert(job.name.as_str()) {
            return Err(JobMatrixError::DuplicateJob(job.name.clone()));
        }
    }

    Ok(())
}

/// Jobs may be seeded as already resolved, but never as in flight: nothing
/// would ever pick up a job that claims to be on the queue already.
fn validate_initial_states(cfg: &RawMatrixFile) -> Result<()> {
    for job in cfg.job.iter() {
        if matches!(job.state, JobState::Queued | JobState::Started) {
            return Err(JobMatrixError::ConfigError(format!(
                "job '{}' cannot start the run in state {}",
                job.name, job.state
            )));
        }
    }
    Ok(())
}

/// Unknown names are not an error here: they surface as `BadDependency`
/// when the run reconciles that job.
fn validate_dependencies(cfg: &RawMatrixFile) -> Result<()> {
    let names: HashSet<&str> = cfg.job.iter().map(|j| j.name.as_str()).collect();

    for job in cfg.job.iter() {
        for dep in job.depends_on.iter() {
            if dep == &job.name {
                return Err(JobMatrixError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `depends_on`",
                    job.name
                )));
            }
            if !names.contains(dep.as_str()) {
                warn!(
                    job = %job.name,
                    dependency = %dep,
                    "job depends on an unknown job; it will be marked BadDependency"
                );
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawMatrixFile) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for job in cfg.job.iter() {
        graph.add_node(job.name.as_str());
    }

    for job in cfg.job.iter() {
        for dep in job.depends_on.iter() {
            if graph.contains_node(dep.as_str()) {
                graph.add_edge(dep.as_str(), job.name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(JobMatrixError::DagCycle(format!(
            "cycle detected in job matrix involving job '{}'",
            cycle.node_id()
        ))),
    }
}
