// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `jobmatrix`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobmatrix",
    version,
    about = "Run a matrix of jobs in dependency order with a bounded worker pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the matrix file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Number of concurrent workers; overrides `[run].concurrency`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Milliseconds between reconciliation passes; overrides
    /// `[run].reconcile_interval_ms`.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBMATRIX_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the matrix, but don't execute any job.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
