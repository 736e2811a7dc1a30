// src/logging.rs

//! Logging setup for `provisioner` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `PROVISIONER_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Streamed command output is logged on the `provisioner::output` target.
//! Its level follows the main level unless `PROVISIONER_OUTPUT_LOG` sets
//! it separately (e.g. `PROVISIONER_OUTPUT_LOG=warn` hides child output).
//!
//! Logs, including streamed command output, go to STDERR.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Target used for every line of child output.
pub const OUTPUT_TARGET: &str = "provisioner::output";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("PROVISIONER_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let output_level = std::env::var("PROVISIONER_OUTPUT_LOG")
        .ok()
        .and_then(|s| parse_level_str(&s))
        .unwrap_or(level);
    let filter = EnvFilter::try_new(filter_directives(level, output_level))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {e}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

fn filter_directives(level: tracing::Level, output_level: tracing::Level) -> String {
    format!(
        "{},{}={}",
        level.as_str().to_lowercase(),
        OUTPUT_TARGET,
        output_level.as_str().to_lowercase()
    )
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
