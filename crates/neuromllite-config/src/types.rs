// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `neuromllite.toml`. Every section and
//! field is optional in the file; missing values take the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuroMLliteConfig {
    pub generator: GeneratorConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Network generation (traversal) settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed for layouts, connectivity and input selection
    pub seed: u64,
    pub include_connections: bool,
    pub include_inputs: bool,
    /// Pass population properties to handlers even without a spatial layout
    pub always_include_props: bool,
    pub verbose: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 1234,
            include_connections: true,
            include_inputs: true,
            always_include_props: false,
            verbose: false,
        }
    }
}

/// Settings for serialized output and export handlers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    /// Spaces per indentation level in JSON output (0 = compact)
    pub json_indent: usize,
    /// Detail level of the GraphViz export (1-10)
    pub graphviz_level: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            json_indent: 4,
            graphviz_level: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NeuroMLliteConfig = toml::from_str("[generator]\nseed = 42\n").unwrap();
        assert_eq!(config.generator.seed, 42);
        assert!(config.generator.include_connections);
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = NeuroMLliteConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: NeuroMLliteConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
