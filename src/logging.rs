// src/logging.rs

//! Logging setup for `jobmatrix` using `tracing` + `tracing-subscriber`.
//!
//! Filter priority:
//! 1. `--log-level` CLI flag, applied to every target
//! 2. `JOBMATRIX_LOG`, any `EnvFilter` directive (e.g. `debug` or
//!    `jobmatrix::engine=trace,info`)
//! 3. `info`
//!
//! Logs go to STDERR so workflow output on stdout stays clean.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV: &str = "JOBMATRIX_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Resolve the filter from the CLI flag and the raw env value. An env value
/// that does not parse falls back to `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::new(lvl.as_directive());
    }

    env_value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace"));
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn env_directives_are_honoured() {
        let filter = build_filter(None, Some("jobmatrix::engine=trace"));
        assert_eq!(filter.to_string(), "jobmatrix::engine=trace");
    }

    #[test]
    fn blank_or_missing_env_defaults_to_info() {
        assert_eq!(build_filter(None, None).to_string(), "info");
        assert_eq!(build_filter(None, Some("  ")).to_string(), "info");
    }
}
