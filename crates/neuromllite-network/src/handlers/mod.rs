// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Network event handlers.

[`generate_network`](crate::generate_network) walks a network and reports
what it builds to a [`NetworkHandler`], in this order:

1. `handle_document_start`, `handle_network`
2. per population: `handle_population`, then `handle_location` per cell
3. per projection: `handle_projection`, `handle_connection` per connection,
   `finalise_projection`
4. per input: `handle_input_list`, `handle_single_input` per input,
   `finalise_input_source`
5. `finalise_population` per population, then `finalise_document`

Every callback has a no-op default, so a handler only implements the events
it cares about. Callbacks get ids, indices and numbers only; whatever a
handler accumulates lives in the handler. An `Err` from any callback stops
the traversal and is returned to the caller unchanged.
*/

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::types::NetworkResult;

/// Log a handler message: `info` when verbose, `debug` when normal, dropped when quiet
macro_rules! report {
    ($verbosity:expr, $($arg:tt)+) => {
        match $verbosity {
            ::neuromllite_observability::Verbosity::Verbose => {
                ::tracing::info!(target: "neuromllite-network", $($arg)+)
            }
            ::neuromllite_observability::Verbosity::Normal => {
                ::tracing::debug!(target: "neuromllite-network", $($arg)+)
            }
            ::neuromllite_observability::Verbosity::Quiet => {}
        }
    };
}
pub(crate) use report;

mod default;
mod graphviz;
mod sonata;

pub use default::DefaultNetworkHandler;
pub use graphviz::GraphVizHandler;
pub use sonata::SonataHandler;

/// Kind of projection announced to handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    /// Chemical synapses, event based
    #[default]
    Projection,
    /// Graded transmission through a presynaptic component
    ContinuousProjection,
    /// Gap junctions
    ElectricalProjection,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::Projection => "projection",
            ProjectionType::ContinuousProjection => "continuousProjection",
            ProjectionType::ElectricalProjection => "electricalProjection",
        }
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projection" => Ok(ProjectionType::Projection),
            "continuousProjection" => Ok(ProjectionType::ContinuousProjection),
            "electricalProjection" => Ok(ProjectionType::ElectricalProjection),
            other => Err(format!(
                "unknown projection type '{}' (expected projection, continuousProjection or electricalProjection)",
                other
            )),
        }
    }
}

/// A projection about to have its connections generated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionEvent<'a> {
    pub id: &'a str,
    pub presynaptic: &'a str,
    pub postsynaptic: &'a str,
    pub synapse: Option<&'a str>,
    pub pre_synapse: Option<&'a str>,
    pub has_weights: bool,
    pub has_delays: bool,
    pub projection_type: ProjectionType,
}

/// One generated connection between two cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection<'a> {
    pub projection: &'a str,
    /// Index of the connection within its projection
    pub id: usize,
    pub presynaptic: &'a str,
    pub postsynaptic: &'a str,
    pub synapse: Option<&'a str>,
    pub pre_cell: usize,
    pub post_cell: usize,
    pub pre_segment: usize,
    pub pre_fraction: f64,
    pub post_segment: usize,
    pub post_fraction: f64,
    pub delay: f64,
    pub weight: f64,
}

/// Receiver of network generation events
///
/// `component` arguments are empty when the entity does not name one.
#[allow(unused_variables)]
pub trait NetworkHandler {
    fn handle_document_start(&mut self, id: &str, notes: Option<&str>) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_network(
        &mut self,
        id: &str,
        notes: Option<&str>,
        temperature: Option<f64>,
    ) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_population(
        &mut self,
        id: &str,
        component: &str,
        size: Option<usize>,
        properties: &Map<String, Value>,
    ) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_location(
        &mut self,
        id: usize,
        population: &str,
        component: &str,
        x: f64,
        y: f64,
        z: f64,
    ) -> NetworkResult<()> {
        Ok(())
    }

    fn finalise_population(&mut self, population: &str) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_projection(&mut self, projection: &ProjectionEvent<'_>) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_connection(&mut self, connection: &Connection<'_>) -> NetworkResult<()> {
        Ok(())
    }

    fn finalise_projection(
        &mut self,
        id: &str,
        presynaptic: &str,
        postsynaptic: &str,
        synapse: Option<&str>,
        projection_type: ProjectionType,
    ) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_input_list(
        &mut self,
        id: &str,
        population: &str,
        component: &str,
        size: Option<usize>,
    ) -> NetworkResult<()> {
        Ok(())
    }

    fn handle_single_input(
        &mut self,
        input_list: &str,
        id: usize,
        cell: usize,
        segment: usize,
        fraction: f64,
        weight: f64,
    ) -> NetworkResult<()> {
        Ok(())
    }

    fn finalise_input_source(&mut self, id: &str) -> NetworkResult<()> {
        Ok(())
    }

    fn finalise_document(&mut self) -> NetworkResult<()> {
        Ok(())
    }
}
