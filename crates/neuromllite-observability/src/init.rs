// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Installs a console layer and, when a log directory is given, a JSON file
//! layer (`neuromllite.log`) fed through a non-blocking writer.

use anyhow::{Context, Result};
use neuromllite_config::LoggingConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::LogFormat;

/// Logging initialization result
///
/// Keep it alive for as long as logs should be written; dropping it flushes
/// the file writer.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_file: Option<PathBuf>,
    installed: bool,
}

impl LoggingGuard {
    /// Path of the log file, if file logging was requested
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// False when another global subscriber was already installed
    pub fn installed(&self) -> bool {
        self.installed
    }
}

/// Initialize logging with console output and optional file output
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags for filtering
/// * `base_level` - Level for everything without a debug flag (e.g. `"info"`)
/// * `format` - Console format
/// * `log_dir` - Directory for `neuromllite.log`; `None` disables file logging
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    base_level: &str,
    format: LogFormat,
    log_dir: Option<&Path>,
) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string_with_base(base_level);
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers = Vec::new();

    let console_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(env_filter.clone())
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(env_filter.clone())
            .boxed(),
    };
    layers.push(console_layer);

    let mut file_guard = None;
    let mut log_file = None;
    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let file_appender = tracing_appender::rolling::never(dir, "neuromllite.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guard = Some(guard);
        log_file = Some(dir.join("neuromllite.log"));

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(env_filter)
            .boxed();
        layers.push(file_layer);
    }

    // Tests and embedding applications may have installed a subscriber already
    let installed = Registry::default().with(layers).try_init().is_ok();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file,
        installed,
    })
}

/// Initialize console logging at `info` with the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, "info", LogFormat::Text, None)
}

/// Initialize logging from the `[logging]` section of `neuromllite.toml`
pub fn init_logging_from_config(
    debug_flags: &CrateDebugFlags,
    config: &LoggingConfig,
) -> Result<LoggingGuard> {
    init_logging(debug_flags, &config.level, LogFormat::Text, config.log_dir.as_deref())
}
