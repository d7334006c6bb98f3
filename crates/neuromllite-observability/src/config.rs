// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How chatty network generation and the export handlers are.
///
/// `Verbose` messages are emitted at `info` level; otherwise the same
/// messages go to `debug` and only show up when the crate's debug flag is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Verbosity::Quiet)
    }

    /// Map a plain on/off flag (as stored in configuration files)
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Quiet => write!(f, "quiet"),
            Verbosity::Normal => write!(f, "normal"),
            Verbosity::Verbose => write!(f, "verbose"),
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quiet" | "0" => Ok(Verbosity::Quiet),
            "normal" | "1" => Ok(Verbosity::Normal),
            "verbose" | "2" | "true" => Ok(Verbosity::Verbose),
            other => Err(format!("Unknown verbosity '{}'", other)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log levels accepted by [`crate::init_logging`] and configuration validation
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check that a level name is one `EnvFilter` understands
pub fn is_valid_log_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("verbose".parse::<Verbosity>().unwrap(), Verbosity::Verbose);
        assert_eq!("Quiet".parse::<Verbosity>().unwrap(), Verbosity::Quiet);
        assert!("loud".parse::<Verbosity>().is_err());
    }

    #[test]
    fn test_verbosity_from_flag() {
        assert!(Verbosity::from_flag(true).is_verbose());
        assert_eq!(Verbosity::from_flag(false), Verbosity::Normal);
    }

    #[test]
    fn test_log_level_names() {
        assert!(is_valid_log_level("INFO"));
        assert!(!is_valid_log_level("WARNING"));
    }
}
