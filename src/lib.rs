// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::MatrixFile;
use crate::dag::JobRegistry;
use crate::engine::{RunController, RunOptions, RunReport};
use crate::exec::{CommandRunner, WorkflowRunner};

pub use crate::types::JobState;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - matrix loading and CLI overrides
/// - registry / controller / worker pool
/// - the shell command backend
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)?;
    apply_overrides(&mut cfg, &args);

    if args.dry_run {
        print_dry_run(&args.config, &cfg);
        return Ok(());
    }

    let cancel = CancellationToken::new();

    // Ctrl-C → stop starting new jobs.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("received Ctrl+C; cancelling run");
            cancel.cancel();
        });
    }

    let report = run_matrix(&cfg, CommandRunner::new(), cancel).await?;
    report.into_result()?;
    Ok(())
}

/// Run a validated matrix with the given backend until every job is
/// terminal or `cancel` fires.
pub async fn run_matrix<R>(
    cfg: &MatrixFile,
    runner: R,
    cancel: CancellationToken,
) -> errors::Result<RunReport>
where
    R: WorkflowRunner + 'static,
{
    let registry = Arc::new(JobRegistry::from_config(cfg)?);
    let options = RunOptions::from_config(&cfg.run);
    RunController::new(registry, Arc::new(runner), options)
        .run(cancel)
        .await
}

/// CLI flags win over the matrix file.
fn apply_overrides(cfg: &mut MatrixFile, args: &CliArgs) {
    if let Some(concurrency) = args.concurrency {
        debug!(concurrency, "overriding [run].concurrency from CLI");
        cfg.run.concurrency = usize::from(concurrency);
    }
    if let Some(interval_ms) = args.interval_ms {
        debug!(interval_ms, "overriding [run].reconcile_interval_ms from CLI");
        cfg.run.reconcile_interval_ms = interval_ms;
    }
}

/// Simple dry-run output: print run settings and every job.
fn print_dry_run(path: &Path, cfg: &MatrixFile) {
    println!("jobmatrix dry-run ({})", path.display());
    println!("  run.concurrency = {}", cfg.run.concurrency);
    println!("  run.reconcile_interval_ms = {}", cfg.run.reconcile_interval_ms);
    println!();

    println!("jobs ({}):", cfg.job.len());
    for job in cfg.job.iter() {
        println!("  - {}", job.name);
        println!("      workflow: {}", job.workflow);
        if !job.depends_on.is_empty() {
            println!("      depends_on: {:?}", job.depends_on);
        }
        for (name, value) in job.inputs.iter() {
            println!("      input {name} = {value}");
        }
        if job.state != JobState::NotStarted {
            println!("      state: {}", job.state);
        }
    }

    debug!("dry-run complete (no execution)");
}
