// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-neuromllite-network` to enable debug output
//! for a single crate, or `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Per-crate debug flags
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}` pattern.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
                continue;
            }

            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }

        flags
    }

    /// Parse a comma-separated list as used by `NEUROMLLITE_DEBUG`
    pub fn from_list(list: &str) -> Self {
        let mut flags = CrateDebugFlags::default();
        if list.trim() == "all" {
            flags.enable_all();
            return flags;
        }
        for crate_name in list.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }
        flags
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags
    ///
    /// Format: `"neuromllite-network=debug,info"`, or just the base level if
    /// no crate is enabled.
    pub fn to_filter_string_with_base(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(base_level.to_lowercase());
        filters.join(",")
    }

    pub fn to_filter_string(&self) -> String {
        self.to_filter_string_with_base("info")
    }
}

/// Parse debug flags from the process arguments and `NEUROMLLITE_DEBUG`
///
/// Environment variable format: comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var("NEUROMLLITE_DEBUG") {
        flags
            .enabled_crates
            .extend(CrateDebugFlags::from_list(&env_var).enabled_crates);
    }

    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  NEUROMLLITE_DEBUG={{crate-name}}[,{{crate-name}}]
  NEUROMLLITE_DEBUG=all
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuromllite-network".to_string()]);
        assert!(flags.is_enabled("neuromllite-network"));
        assert!(!flags.is_enabled("neuromllite-base"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_from_list() {
        let flags = CrateDebugFlags::from_list("neuromllite-base, neuromllite-config,");
        assert!(flags.is_enabled("neuromllite-base"));
        assert!(flags.is_enabled("neuromllite-config"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuromllite-base".to_string()]);
        assert_eq!(flags.to_filter_string(), "neuromllite-base=debug,info");
        assert_eq!(CrateDebugFlags::default().to_filter_string_with_base("WARN"), "warn");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuromllite-base".to_string()]);
        assert_eq!(flags.log_level("neuromllite-base"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("neuromllite-network"), tracing::Level::INFO);
    }
}
