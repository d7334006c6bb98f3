// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Loading network and simulation descriptions from disk

use std::fs;
use std::path::{Path, PathBuf};

use neuromllite_base::{
    load_json_file, load_yaml_file, to_json, to_yaml, ModelError, SchemaType, StructuredFormat,
};
use neuromllite_config::ExportConfig;
use tracing::info;

use crate::schemas::{Network, Simulation, NETWORK_SCHEMA, SIMULATION_SCHEMA};
use crate::types::NetworkResult;

pub fn load_network_json(path: impl AsRef<Path>) -> NetworkResult<Network> {
    let path = path.as_ref();
    let network = Network::from_object(load_json_file(path, &NETWORK_SCHEMA)?)?;
    info!(target: "neuromllite-network", "Loaded network '{}' from {}", network.id_or_empty(), path.display());
    Ok(network)
}

pub fn load_network_yaml(path: impl AsRef<Path>) -> NetworkResult<Network> {
    let path = path.as_ref();
    let network = Network::from_object(load_yaml_file(path, &NETWORK_SCHEMA)?)?;
    info!(target: "neuromllite-network", "Loaded network '{}' from {}", network.id_or_empty(), path.display());
    Ok(network)
}

/// Load a network, choosing the format from the file extension
pub fn load_network(path: impl AsRef<Path>) -> NetworkResult<Network> {
    let path = path.as_ref();
    match StructuredFormat::from_path(path) {
        Some(StructuredFormat::Json) => load_network_json(path),
        Some(StructuredFormat::Yaml) => load_network_yaml(path),
        None => Err(ModelError::InvalidDocument(format!(
            "cannot tell the format of {} (expected .json, .yaml or .yml)",
            path.display()
        ))
        .into()),
    }
}

pub fn load_simulation_json(path: impl AsRef<Path>) -> NetworkResult<Simulation> {
    let path = path.as_ref();
    let simulation = Simulation::from_object(load_json_file(path, &SIMULATION_SCHEMA)?)?;
    info!(target: "neuromllite-network", "Loaded simulation '{}' from {}", simulation.id_or_empty(), path.display());
    Ok(simulation)
}

/// Write `<output_dir>/<id>.json` (indented per `json_indent`) or `<id>.yaml`
pub fn save_network(
    network: &Network,
    format: StructuredFormat,
    config: &ExportConfig,
) -> NetworkResult<PathBuf> {
    let text = match format {
        StructuredFormat::Json => to_json(network, config.json_indent)?,
        StructuredFormat::Yaml => to_yaml(network)?,
    };
    fs::create_dir_all(&config.output_dir)?;
    let path = config
        .output_dir
        .join(format!("{}.{}", network.id_or_empty(), format.extension()));
    fs::write(&path, text)?;
    info!(target: "neuromllite-network", "Saved network '{}' to {}", network.id_or_empty(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkError;
    use neuromllite_base::to_json_file;

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let network = Network::new("net0").with("temperature", 32).unwrap();

        let json = to_json_file(&network, Some(&dir.path().join("net0.json")), 4).unwrap();
        assert_eq!(load_network(&json).unwrap(), network);

        let yaml_path = dir.path().join("net0.yaml");
        std::fs::write(&yaml_path, network.to_yaml().unwrap()).unwrap();
        assert_eq!(load_network(&yaml_path).unwrap(), network);

        let err = load_network(dir.path().join("net0.txt")).unwrap_err();
        assert!(matches!(err, NetworkError::Model(ModelError::InvalidDocument(_))));
    }

    #[test]
    fn test_save_uses_export_section() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().join("out"),
            json_indent: 2,
            ..ExportConfig::default()
        };
        let network = Network::new("net0").with("notes", "n").unwrap();

        let path = save_network(&network, StructuredFormat::Json, &config).unwrap();
        assert_eq!(path, dir.path().join("out/net0.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"net0\": {\n    \"notes\": \"n\"\n  }\n}");
        assert_eq!(load_network(&path).unwrap(), network);

        let path = save_network(&network, StructuredFormat::Yaml, &config).unwrap();
        assert_eq!(load_network(path).unwrap(), network);
    }

    #[test]
    fn test_load_simulation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        std::fs::write(
            &path,
            r#"{"Sim0": {"network": "net0.json", "duration": 1000, "dt": 0.025, "seed": 42}}"#,
        )
        .unwrap();
        let sim = load_simulation_json(&path).unwrap();
        assert_eq!(sim.id(), Some("Sim0"));
        assert_eq!(sim.get_f64("duration"), Some(1000.0));
        assert_eq!(sim.get_i64("seed"), Some(42));
    }
}
