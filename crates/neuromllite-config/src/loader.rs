// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! 3-tier loading:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeuroMLliteConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "neuromllite.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `NEUROMLLITE_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEUROMLLITE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEUROMLLITE_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NEUROMLLITE_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns an error if the file cannot be found or read, or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeuroMLliteConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeuroMLliteConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Like [`load_config`], but falls back to defaults when no file exists
///
/// Unreadable or malformed files are still errors.
pub fn load_config_or_default(
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeuroMLliteConfig> {
    match find_config_file() {
        Ok(path) => load_config(Some(&path), cli_args),
        Err(ConfigError::FileNotFound(_)) => {
            let mut config = NeuroMLliteConfig::default();
            apply_environment_overrides(&mut config);
            if let Some(cli) = cli_args {
                apply_cli_overrides(&mut config, cli)?;
            }
            Ok(config)
        }
        Err(e) => Err(e),
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROMLLITE_SEED` -> `generator.seed`
/// - `NEUROMLLITE_VERBOSE` -> `generator.verbose`
/// - `NEUROMLLITE_OUTPUT_DIR` -> `export.output_dir`
/// - `NEUROMLLITE_JSON_INDENT` -> `export.json_indent`
/// - `NEUROMLLITE_GRAPHVIZ_LEVEL` -> `export.graphviz_level`
/// - `NEUROMLLITE_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut NeuroMLliteConfig) {
    if let Ok(value) = env::var("NEUROMLLITE_SEED") {
        if let Ok(seed) = value.parse::<u64>() {
            config.generator.seed = seed;
        }
    }
    if let Ok(value) = env::var("NEUROMLLITE_VERBOSE") {
        config.generator.verbose = parse_flag(&value);
    }
    if let Ok(value) = env::var("NEUROMLLITE_OUTPUT_DIR") {
        config.export.output_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("NEUROMLLITE_JSON_INDENT") {
        if let Ok(indent) = value.parse::<usize>() {
            config.export.json_indent = indent;
        }
    }
    if let Ok(value) = env::var("NEUROMLLITE_GRAPHVIZ_LEVEL") {
        if let Ok(level) = value.parse::<u8>() {
            config.export.graphviz_level = level;
        }
    }
    if let Ok(value) = env::var("NEUROMLLITE_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `seed`, `verbose`, `include_connections`, `include_inputs`,
/// `output_dir`, `json_indent`, `graphviz_level`, `log_level`.
/// Unlike environment overrides, unparsable CLI values are reported.
pub fn apply_cli_overrides(
    config: &mut NeuroMLliteConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
        value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
    }

    if let Some(value) = cli_args.get("seed") {
        config.generator.seed = parse("seed", value)?;
    }
    if let Some(value) = cli_args.get("verbose") {
        config.generator.verbose = parse_flag(value);
    }
    if let Some(value) = cli_args.get("include_connections") {
        config.generator.include_connections = parse_flag(value);
    }
    if let Some(value) = cli_args.get("include_inputs") {
        config.generator.include_inputs = parse_flag(value);
    }
    if let Some(value) = cli_args.get("output_dir") {
        config.export.output_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("json_indent") {
        config.export.json_indent = parse("json_indent", value)?;
    }
    if let Some(value) = cli_args.get("graphviz_level") {
        config.export.graphviz_level = parse("graphviz_level", value)?;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("NEUROMLLITE_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NEUROMLLITE_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_reported() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("NEUROMLLITE_CONFIG_PATH", "/definitely/not/here.toml");
        let result = find_config_file();
        env::remove_var("NEUROMLLITE_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("NEUROMLLITE_SEED");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[generator]").unwrap();
        writeln!(file, "seed = 7").unwrap();
        writeln!(file, "[export]").unwrap();
        writeln!(file, "json_indent = 2").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();
        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.export.json_indent, 2);
        assert_eq!(config.export.graphviz_level, 10);
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("NEUROMLLITE_SEED", "99");
        env::set_var("NEUROMLLITE_VERBOSE", "yes");
        env::set_var("NEUROMLLITE_JSON_INDENT", "not-a-number");

        let mut config = NeuroMLliteConfig::default();
        apply_environment_overrides(&mut config);

        env::remove_var("NEUROMLLITE_SEED");
        env::remove_var("NEUROMLLITE_VERBOSE");
        env::remove_var("NEUROMLLITE_JSON_INDENT");

        assert_eq!(config.generator.seed, 99);
        assert!(config.generator.verbose);
        assert_eq!(config.export.json_indent, 4);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NeuroMLliteConfig::default();
        let mut cli = HashMap::new();
        cli.insert("graphviz_level".to_string(), "3".to_string());
        cli.insert("include_inputs".to_string(), "false".to_string());
        cli.insert("output_dir".to_string(), "out".to_string());

        apply_cli_overrides(&mut config, &cli).unwrap();
        assert_eq!(config.export.graphviz_level, 3);
        assert!(!config.generator.include_inputs);
        assert_eq!(config.export.output_dir, PathBuf::from("out"));

        cli.insert("seed".to_string(), "minus one".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[generator\nseed = ").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }
}
