// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so the user sees them all at once.

use crate::{ConfigError, ConfigResult, NeuroMLliteConfig};

/// Largest JSON indent accepted
pub const MAX_JSON_INDENT: usize = 16;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} = {} is outside valid range ({}-{})", field, value, min, max),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &NeuroMLliteConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    if config.export.json_indent > MAX_JSON_INDENT {
        errors.push(ConfigValidationError::OutOfRange {
            field: "export.json_indent".to_string(),
            value: config.export.json_indent as i64,
            min: 0,
            max: MAX_JSON_INDENT as i64,
        });
    }

    if !(1..=10).contains(&config.export.graphviz_level) {
        errors.push(ConfigValidationError::OutOfRange {
            field: "export.graphviz_level".to_string(),
            value: config.export.graphviz_level as i64,
            min: 1,
            max: 10,
        });
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.export.output_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "export.output_dir".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&NeuroMLliteConfig::default()).is_ok());
    }

    #[test]
    fn test_all_problems_are_reported() {
        let mut config = NeuroMLliteConfig::default();
        config.export.json_indent = 40;
        config.export.graphviz_level = 0;
        config.logging.level = "WARNING".to_string();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("export.json_indent"));
        assert!(err.contains("export.graphviz_level"));
        assert!(err.contains("logging.level"));
    }
}
