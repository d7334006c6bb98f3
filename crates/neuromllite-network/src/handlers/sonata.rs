// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
SONATA-style node export.

Writes into the output directory:

- `<network>_nodes.csv`: one row per placed cell (population, node_id,
  node_type_id, node_group_id, node_group_index, x, y, z). Opened on
  `handle_network`, appended on each `finalise_population`.
- `<network>_node_types.csv`: space delimited, one node type per
  population, ids starting at 100.
- `config.json` and `circuit_config.json` manifests.

The node table is flushed and closed on `finalise_document`. If traversal
aborts first, dropping the handler closes it.
*/

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use neuromllite_config::ExportConfig;
use neuromllite_observability::Verbosity;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::NetworkHandler;
use crate::types::{NetworkError, NetworkResult};

const DEFAULT_NODE_GROUP_ID: u32 = 0;
const FIRST_NODE_TYPE_ID: u32 = 100;

#[derive(Debug, Serialize)]
struct NodeRow<'a> {
    population: &'a str,
    node_id: usize,
    node_type_id: u32,
    node_group_id: u32,
    node_group_index: usize,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Clone, Serialize)]
struct NodeType {
    node_type_id: u32,
    pop_name: String,
    model_name: String,
    location: String,
    model_template: String,
    model_type: String,
    dynamics_params: String,
}

/// Exports node positions and node types in a SONATA-like layout
pub struct SonataHandler {
    output_dir: PathBuf,
    verbosity: Verbosity,
    network_id: Option<String>,
    config: Value,
    circuit: Value,
    nodes: Option<csv::Writer<File>>,
    node_types: Vec<NodeType>,
    pop_type_ids: HashMap<String, u32>,
    positions: HashMap<String, Vec<(usize, [f64; 3])>>,
    written: Vec<PathBuf>,
}

impl SonataHandler {
    pub fn new(output_dir: impl Into<PathBuf>, verbosity: Verbosity) -> Self {
        report!(verbosity, "Initiating Sonata handler");
        Self {
            output_dir: output_dir.into(),
            verbosity,
            network_id: None,
            config: Value::Null,
            circuit: Value::Null,
            nodes: None,
            node_types: Vec::new(),
            pop_type_ids: HashMap::new(),
            positions: HashMap::new(),
            written: Vec::new(),
        }
    }

    /// Output directory from the `[export]` section
    pub fn from_config(config: &ExportConfig, verbosity: Verbosity) -> Self {
        Self::new(config.output_dir.clone(), verbosity)
    }

    /// Files written by `finalise_document`
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    /// Whether the node table is currently open
    pub fn is_open(&self) -> bool {
        self.nodes.is_some()
    }

    fn network_id(&self) -> NetworkResult<&str> {
        self.network_id
            .as_deref()
            .ok_or_else(|| NetworkError::Handler("Sonata export received no network".to_string()))
    }

    fn set_circuit_file(&mut self, key: &str, file_name: &str) {
        if let Some(entry) = self.circuit.pointer_mut("/networks/nodes/0") {
            entry[key] = Value::from(format!("$NETWORK_DIR/{}", file_name));
        }
    }

    fn write_node_types(&self, path: &Path) -> NetworkResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(true)
            .from_path(path)?;
        for node_type in &self.node_types {
            writer.serialize(node_type)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl NetworkHandler for SonataHandler {
    fn handle_document_start(&mut self, id: &str, _notes: Option<&str>) -> NetworkResult<()> {
        report!(self.verbosity, "Parsing for Sonata export: {}", id);
        self.config = json!({
            "network": "./circuit_config.json",
            "simulation": "./simulation_config.json",
        });
        self.circuit = json!({
            "manifest": {
                "$NETWORK_DIR": "./",
                "$COMPONENT_DIR": "./",
            },
            "networks": {
                "nodes": [{}],
            },
        });
        Ok(())
    }

    fn handle_network(
        &mut self,
        id: &str,
        notes: Option<&str>,
        temperature: Option<f64>,
    ) -> NetworkResult<()> {
        report!(self.verbosity, "Network: {}", id);
        if let Some(temperature) = temperature {
            report!(self.verbosity, "  Temperature: {}", temperature);
        }
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            report!(self.verbosity, "  Notes: {}", notes);
        }

        fs::create_dir_all(&self.output_dir)?;
        let file_name = format!("{}_nodes.csv", id);
        self.nodes = Some(csv::Writer::from_path(self.output_dir.join(&file_name))?);
        self.network_id = Some(id.to_string());
        self.set_circuit_file("nodes_file", &file_name);
        Ok(())
    }

    fn handle_population(
        &mut self,
        id: &str,
        component: &str,
        size: Option<usize>,
        _properties: &Map<String, Value>,
    ) -> NetworkResult<()> {
        report!(
            self.verbosity,
            "Population: {}, component: {}, size: {:?}",
            id,
            component,
            size
        );
        let node_type_id = FIRST_NODE_TYPE_ID + self.pop_type_ids.len() as u32;
        self.pop_type_ids.insert(id.to_string(), node_type_id);
        self.node_types.push(NodeType {
            node_type_id,
            pop_name: id.to_string(),
            model_name: component.to_string(),
            location: "???".to_string(),
            model_template: component.to_string(),
            model_type: component.to_string(),
            dynamics_params: "None".to_string(),
        });
        Ok(())
    }

    fn handle_location(
        &mut self,
        id: usize,
        population: &str,
        _component: &str,
        x: f64,
        y: f64,
        z: f64,
    ) -> NetworkResult<()> {
        self.positions
            .entry(population.to_string())
            .or_default()
            .push((id, [x, y, z]));
        Ok(())
    }

    fn finalise_population(&mut self, population: &str) -> NetworkResult<()> {
        let Some(cells) = self.positions.remove(population) else {
            return Ok(());
        };
        let node_type_id = *self.pop_type_ids.get(population).ok_or_else(|| {
            NetworkError::Handler(format!("locations for unknown population '{}'", population))
        })?;
        let writer = self
            .nodes
            .as_mut()
            .ok_or_else(|| NetworkError::Handler("node table is not open".to_string()))?;
        for (index, [x, y, z]) in cells {
            writer.serialize(NodeRow {
                population,
                node_id: index,
                node_type_id,
                node_group_id: DEFAULT_NODE_GROUP_ID,
                node_group_index: index,
                x,
                y,
                z,
            })?;
        }
        Ok(())
    }

    fn finalise_document(&mut self) -> NetworkResult<()> {
        let network_id = self.network_id()?.to_string();
        if let Some(mut writer) = self.nodes.take() {
            writer.flush()?;
            self.written.push(self.output_dir.join(format!("{}_nodes.csv", network_id)));
        }

        let node_type_file = format!("{}_node_types.csv", network_id);
        let node_type_path = self.output_dir.join(&node_type_file);
        self.write_node_types(&node_type_path)?;
        self.set_circuit_file("node_types_file", &node_type_file);
        self.written.push(node_type_path);

        for (file_name, manifest) in [("config.json", &self.config), ("circuit_config.json", &self.circuit)] {
            let path = self.output_dir.join(file_name);
            fs::write(&path, serde_json::to_string_pretty(manifest)?)?;
            self.written.push(path);
        }
        report!(
            self.verbosity,
            "Writing Sonata files for {} to {}",
            network_id,
            self.output_dir.display()
        );
        Ok(())
    }
}

impl Drop for SonataHandler {
    fn drop(&mut self) {
        if let Some(mut writer) = self.nodes.take() {
            warn!(
                target: "neuromllite-network",
                "Closing unfinished node table for '{}'",
                self.network_id.as_deref().unwrap_or("?")
            );
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_ids_start_at_100() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = SonataHandler::new(dir.path(), Verbosity::Quiet);
        handler.handle_document_start("net", None).unwrap();
        handler.handle_network("net", None, None).unwrap();
        assert!(handler.is_open());
        handler.handle_population("a", "iaf", Some(1), &Map::new()).unwrap();
        handler.handle_population("b", "hh", Some(1), &Map::new()).unwrap();
        assert_eq!(handler.pop_type_ids["a"], 100);
        assert_eq!(handler.pop_type_ids["b"], 101);
    }

    #[test]
    fn test_export_section_sets_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().join("sonata"),
            ..ExportConfig::default()
        };
        let mut handler = SonataHandler::from_config(&config, Verbosity::Quiet);
        handler.handle_document_start("net", None).unwrap();
        handler.handle_network("net", None, None).unwrap();
        handler.finalise_document().unwrap();
        assert!(dir.path().join("sonata/net_nodes.csv").exists());
        assert!(dir.path().join("sonata/circuit_config.json").exists());
    }

    #[test]
    fn test_finalise_without_network_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = SonataHandler::new(dir.path(), Verbosity::Quiet);
        handler.handle_document_start("net", None).unwrap();
        assert!(matches!(handler.finalise_document(), Err(NetworkError::Handler(_))));
    }

    #[test]
    fn test_drop_closes_open_table() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut handler = SonataHandler::new(dir.path(), Verbosity::Quiet);
            handler.handle_document_start("net", None).unwrap();
            handler.handle_network("net", None, None).unwrap();
            handler.handle_population("a", "iaf", Some(1), &Map::new()).unwrap();
            handler.handle_location(0, "a", "iaf", 1.0, 2.0, 3.0).unwrap();
            handler.finalise_population("a").unwrap();
        }
        let text = fs::read_to_string(dir.path().join("net_nodes.csv")).unwrap();
        assert_eq!(
            text,
            "population,node_id,node_type_id,node_group_id,node_group_index,x,y,z\na,0,100,0,0,1.0,2.0,3.0\n"
        );
    }
}
