//! Logging setup for hosts embedding the account policy.
//!
//! The policy itself only emits `tracing` events under the `account_policy`
//! target; installing a subscriber is left to the host. These helpers cover
//! the common cases and refuse to replace a subscriber that is already set.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{PolicyError, Result};

/// Parse a log level name; unknown names fall back to `INFO`.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` directives, with the configured level applied to the policy's
/// own events.
fn build_filter(level: &str) -> EnvFilter {
    let level = parse_level(level).as_str().to_lowercase();
    let directive = format!("account_policy={level}");
    match directive.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Open the log file for appending, creating parent directories as needed.
///
/// Account events from earlier runs are kept.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn already_installed(e: TryInitError) -> PolicyError {
    PolicyError::Config(format!("logging already initialized: {e}"))
}

/// Install a global subscriber writing to stdout and the configured log file.
///
/// An empty `file` means console only. Fails if a global subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.is_empty() {
        return init_console_only(&config.level);
    }

    let log_file = Arc::new(open_log_file(Path::new(&config.file))?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .try_init()
        .map_err(already_installed)?;

    tracing::debug!(file = %config.file, level = %config.level, "Logging initialized");
    Ok(())
}

/// Install a console-only subscriber (for development and tests).
pub fn init_console_only(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(build_filter(level))
        .try_init()
        .map_err(already_installed)
}
