// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
GraphViz (DOT) export.

Populations become filled nodes, grouped into `cluster_<region>` subgraphs
when their properties name a region. Each projection becomes one edge whose
pen width is scaled between the smallest and largest projection weight in the
network. The diagram is written to `<output_dir>/<network>.gv` when the
document is finalised.

Detail levels: `1` nodes only, `2` adds edges, `3` adds cell counts to node
labels, `4` and above label edges with weight, probability and connection
count.
*/

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use neuromllite_config::ExportConfig;
use neuromllite_observability::Verbosity;
use serde_json::{Map, Value};

use super::{Connection, NetworkHandler, ProjectionEvent, ProjectionType};
use crate::schemas::Network;
use crate::types::{NetworkError, NetworkResult};

const DEFAULT_COLOR: &str = "#444444";
const LIGHT_FONT: &str = "#ffffff";
const DARK_FONT: &str = "#000000";

/// Weight and shape of one projection edge, collected until the document ends
#[derive(Debug, Clone)]
struct EdgeInfo {
    id: String,
    presynaptic: String,
    postsynaptic: String,
    weight: f64,
    arrowhead: &'static str,
    probability: Option<f64>,
    connections: usize,
}

/// Writes a `.gv` diagram of populations and projections
pub struct GraphVizHandler<'n> {
    level: u8,
    network: Option<&'n Network>,
    output_dir: PathBuf,
    verbosity: Verbosity,
    graph_name: Option<String>,
    statements: Vec<String>,
    pop_colors: HashMap<String, String>,
    edges: Vec<EdgeInfo>,
    min_weight: f64,
    max_weight: f64,
    written: Option<PathBuf>,
}

impl<'n> GraphVizHandler<'n> {
    /// `network` is consulted for projection weights and synapse reversal
    /// potentials; without it every edge is drawn with weight 1.
    pub fn new(
        level: u8,
        network: Option<&'n Network>,
        output_dir: impl Into<PathBuf>,
        verbosity: Verbosity,
    ) -> Self {
        report!(verbosity, "Initiating GraphViz handler");
        Self {
            level,
            network,
            output_dir: output_dir.into(),
            verbosity,
            graph_name: None,
            statements: Vec::new(),
            pop_colors: HashMap::new(),
            edges: Vec::new(),
            min_weight: f64::INFINITY,
            max_weight: f64::NEG_INFINITY,
            written: None,
        }
    }

    /// Detail level and output directory from the `[export]` section
    pub fn from_config(
        config: &ExportConfig,
        network: Option<&'n Network>,
        verbosity: Verbosity,
    ) -> Self {
        Self::new(config.graphviz_level, network, config.output_dir.clone(), verbosity)
    }

    /// Path of the written diagram, once the document has been finalised
    pub fn output_path(&self) -> Option<&Path> {
        self.written.as_deref()
    }

    /// The DOT text built so far
    pub fn render(&self) -> String {
        let name = self.graph_name.as_deref().unwrap_or("network");
        let mut out = format!("digraph {} {{\n", quote(name));
        for statement in &self.statements {
            out.push('\t');
            out.push_str(statement);
            out.push('\n');
        }
        for statement in self.edge_statements() {
            out.push('\t');
            out.push_str(&statement);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    fn edge_statements(&self) -> Vec<String> {
        if self.level < 2 {
            return Vec::new();
        }
        let mut out = Vec::new();
        for edge in &self.edges {
            let lweight = if self.max_weight == self.min_weight {
                1.0
            } else {
                let fweight = (edge.weight - self.min_weight) / (self.max_weight - self.min_weight);
                0.5 + fweight * 2.0
            };
            let color = self
                .pop_colors
                .get(&edge.presynaptic)
                .map(String::as_str)
                .unwrap_or(DEFAULT_COLOR);
            out.push(format!(
                "edge [arrowhead={} arrowsize={} color=\"{}\" fontcolor=\"{}\" penwidth={}]",
                edge.arrowhead,
                number(lweight.min(1.0)),
                color,
                color,
                number(lweight)
            ));

            let endpoints = format!("{} -> {}", quote(&edge.presynaptic), quote(&edge.postsynaptic));
            if self.level >= 4 {
                let mut label = String::from("<");
                if edge.weight != 1.0 {
                    label.push_str(&format!("weight: {}<br/>", number(edge.weight)));
                }
                if let Some(p) = edge.probability {
                    label.push_str(&format!("p: {}<br/>", number(p)));
                }
                if edge.connections > 0 {
                    label.push_str(&format!("{} conns", edge.connections));
                }
                label.push('>');
                out.push(format!("{} [label={}]", endpoints, label));
            } else {
                out.push(endpoints);
            }
        }
        out
    }

    /// Projection weight scaled by connection probability, and the arrowhead
    fn projection_weight(&self, projection: &ProjectionEvent<'_>) -> NetworkResult<(f64, &'static str, Option<f64>)> {
        let mut arrowhead = "normal";
        let mut weight = 1.0;
        let mut probability = None;
        let Some(network) = self.network else {
            return Ok((weight, arrowhead, probability));
        };
        let parameters = network.parameters();

        if let Some(synapse) = projection.synapse.and_then(|s| network.get_child(s, "synapses")) {
            let e_rev = synapse
                .get_dict("parameters")
                .and_then(|p| p.get("e_rev"))
                .and_then(Value::as_f64);
            if e_rev.is_some_and(|e| e < -50.0) {
                arrowhead = "dot";
            }
        }

        if let Some(proj) = network.get_child(projection.id, "projections") {
            if let Some(expr) = proj.get_expression("weight") {
                let value = expr.evaluate_f64(&parameters)?;
                if value < 0.0 {
                    arrowhead = "dot";
                }
                weight = value.abs();
            }
            if let Some(rc) = proj.get_object("random_connectivity") {
                if let Some(expr) = rc.get_expression("probability") {
                    let p = expr.evaluate_f64(&parameters)?;
                    weight *= p;
                    probability = Some(p);
                }
            }
        }
        Ok((weight, arrowhead, probability))
    }
}

/// Hex fill colour and font colour for a `"r g b"` triple in 0..1
fn parse_color(population: &str, value: &Value) -> NetworkResult<(String, &'static str)> {
    let invalid = || {
        NetworkError::invalid(
            population,
            "color",
            format!("expected three numbers between 0 and 1, got {}", value),
        )
    };
    let text = value.as_str().ok_or_else(invalid)?;
    let rgb = text
        .split_whitespace()
        .map(|part| part.parse::<f64>().map_err(|_| invalid()))
        .collect::<NetworkResult<Vec<f64>>>()?;
    if rgb.len() < 3 {
        return Err(invalid());
    }
    let mut color = String::from("#");
    for component in &rgb {
        let byte = (component * 255.0).trunc().clamp(0.0, 255.0) as u8;
        color.push_str(&format!("{:02x}", byte));
    }
    let luminance = rgb[0] * 0.299 + rgb[1] * 0.587 + rgb[2] * 0.114;
    let font = if luminance > 0.4 { DARK_FONT } else { LIGHT_FONT };
    Ok((color, font))
}

/// DOT identifier, quoted unless it is a plain name
fn quote(id: &str) -> String {
    let plain = id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        id.to_string()
    } else {
        format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Text safe inside an HTML-like `<...>` label
fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Whole numbers without a fraction, everything else in shortest form
fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl NetworkHandler for GraphVizHandler<'_> {
    fn handle_document_start(&mut self, id: &str, _notes: Option<&str>) -> NetworkResult<()> {
        report!(self.verbosity, "Document: {}", id);
        Ok(())
    }

    fn handle_network(
        &mut self,
        id: &str,
        _notes: Option<&str>,
        _temperature: Option<f64>,
    ) -> NetworkResult<()> {
        report!(self.verbosity, "Network: {}", id);
        self.graph_name = Some(id.to_string());
        Ok(())
    }

    fn handle_population(
        &mut self,
        id: &str,
        component: &str,
        size: Option<usize>,
        properties: &Map<String, Value>,
    ) -> NetworkResult<()> {
        let props = serde_json::to_string(properties)?;
        report!(
            self.verbosity,
            "Population: {}, component: {}, size: {:?}, properties: {}",
            id,
            component,
            size,
            props
        );
        let (color, font) = match properties.get("color") {
            Some(value) => parse_color(id, value)?,
            None => (DEFAULT_COLOR.to_string(), LIGHT_FONT),
        };

        let label = match size {
            Some(size) if self.level >= 3 => format!(
                "<{}<br/><i>{} cell{}</i>>",
                html_escape(id),
                size,
                if size == 1 { "" } else { "s" }
            ),
            _ => quote(id),
        };
        let node_attrs = format!("node [color=\"{}\" fontcolor=\"{}\" style=filled]", color, font);
        let node = format!("{} [label={}]", quote(id), label);

        match properties.get("region") {
            Some(region) => {
                let region = region.as_str().map(str::to_string).unwrap_or_else(|| region.to_string());
                self.statements.push(format!(
                    "subgraph {} {{ color=\"{}\" fontcolor=\"{}\" label={} {} {} }}",
                    quote(&format!("cluster_{}", region)),
                    DEFAULT_COLOR,
                    DEFAULT_COLOR,
                    quote(&region),
                    node_attrs,
                    node
                ));
            }
            None => {
                self.statements.push(node_attrs);
                self.statements.push(node);
            }
        }
        self.pop_colors.insert(id.to_string(), color);
        Ok(())
    }

    fn handle_projection(&mut self, projection: &ProjectionEvent<'_>) -> NetworkResult<()> {
        let (weight, arrowhead, probability) = self.projection_weight(projection)?;
        self.max_weight = self.max_weight.max(weight);
        self.min_weight = self.min_weight.min(weight);
        self.edges.push(EdgeInfo {
            id: projection.id.to_string(),
            presynaptic: projection.presynaptic.to_string(),
            postsynaptic: projection.postsynaptic.to_string(),
            weight,
            arrowhead,
            probability,
            connections: 0,
        });
        Ok(())
    }

    fn handle_connection(&mut self, connection: &Connection<'_>) -> NetworkResult<()> {
        if let Some(edge) = self.edges.iter_mut().rev().find(|e| e.id == connection.projection) {
            edge.connections += 1;
        }
        Ok(())
    }

    fn finalise_projection(
        &mut self,
        id: &str,
        presynaptic: &str,
        postsynaptic: &str,
        _synapse: Option<&str>,
        _projection_type: ProjectionType,
    ) -> NetworkResult<()> {
        report!(
            self.verbosity,
            "Projection finalising: {} from {} to {} completed",
            id,
            presynaptic,
            postsynaptic
        );
        Ok(())
    }

    fn finalise_document(&mut self) -> NetworkResult<()> {
        let name = self.graph_name.clone().unwrap_or_else(|| "network".to_string());
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.gv", name));
        fs::write(&path, self.render())?;
        report!(self.verbosity, "Writing file...: {}", path.display());
        self.written = Some(path);
        Ok(())
    }
}
