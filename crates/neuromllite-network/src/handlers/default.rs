// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handler that logs every event it receives

use neuromllite_observability::Verbosity;
use serde_json::{Map, Value};
use tracing::error;

use super::{Connection, NetworkHandler, ProjectionEvent, ProjectionType};
use crate::types::NetworkResult;

/// Reports the generated network through `tracing`
#[derive(Debug, Clone, Default)]
pub struct DefaultNetworkHandler {
    verbosity: Verbosity,
}

impl DefaultNetworkHandler {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

impl NetworkHandler for DefaultNetworkHandler {
    fn handle_document_start(&mut self, id: &str, notes: Option<&str>) -> NetworkResult<()> {
        report!(self.verbosity, "Document: {} started...", id);
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            report!(self.verbosity, "  Notes: {}", notes);
        }
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
        Ok(())
    }

    fn handle_population(
        &mut self,
        id: &str,
        component: &str,
        size: Option<usize>,
        properties: &Map<String, Value>,
    ) -> NetworkResult<()> {
        let size_info = match size {
            Some(size) => format!(" size: {} cells", size),
            None => " as yet unspecified size".to_string(),
        };
        let props_info = if properties.is_empty() {
            String::new()
        } else {
            format!("; {}", Value::Object(properties.clone()))
        };
        report!(
            self.verbosity,
            "Population: {}, component: {}{}{}",
            id,
            component,
            size_info,
            props_info
        );
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
        report!(
            self.verbosity,
            "  Location {} of population: {}, component: {}: ({}, {}, {})",
            id,
            population,
            component,
            x,
            y,
            z
        );
        Ok(())
    }

    fn handle_projection(&mut self, projection: &ProjectionEvent<'_>) -> NetworkResult<()> {
        let pre_info = projection
            .pre_synapse
            .map(|pre| format!(" (pre comp: {})", pre))
            .unwrap_or_default();
        report!(
            self.verbosity,
            "Projection: {} ({}) from {} to {} with syn: {}{}",
            projection.id,
            projection.projection_type,
            projection.presynaptic,
            projection.postsynaptic,
            projection.synapse.unwrap_or("None"),
            pre_info
        );
        Ok(())
    }

    fn handle_connection(&mut self, c: &Connection<'_>) -> NetworkResult<()> {
        report!(
            self.verbosity,
            "  Connection {} of: {}: cell {} in {} -> cell {} in {}, syn: {}, weight: {}",
            c.id,
            c.projection,
            c.pre_cell,
            c.presynaptic,
            c.post_cell,
            c.postsynaptic,
            c.synapse.unwrap_or("None"),
            c.weight
        );
        if c.pre_segment != 0 || c.post_segment != 0 || c.pre_fraction != 0.5 || c.post_fraction != 0.5 {
            report!(
                self.verbosity,
                "Src cell: {}, seg: {}, fract: {} -> Tgt cell {}, seg: {}, fract: {}; weight {}, delay: {} ms",
                c.pre_cell,
                c.pre_segment,
                c.pre_fraction,
                c.post_cell,
                c.post_segment,
                c.post_fraction,
                c.weight,
                c.delay
            );
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
            "Projection: {} from {} to {} completed",
            id,
            presynaptic,
            postsynaptic
        );
        Ok(())
    }

    fn handle_input_list(
        &mut self,
        id: &str,
        population: &str,
        component: &str,
        size: Option<usize>,
    ) -> NetworkResult<()> {
        let Some(size) = size else {
            error!(
                target: "neuromllite-network",
                "Input list {} on population {} has no size; cannot create input source",
                id,
                population
            );
            return Ok(());
        };
        report!(
            self.verbosity,
            "Input Source: {}, on population: {} size: {} cells with component: {}",
            id,
            population,
            size,
            component
        );
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
        report!(
            self.verbosity,
            "  Input: {}[{}], cellId: {}, seg: {}, fract: {:.6}, weight: {:.6}",
            input_list,
            id,
            cell,
            segment,
            fraction,
            weight
        );
        Ok(())
    }

    fn finalise_input_source(&mut self, id: &str) -> NetworkResult<()> {
        report!(self.verbosity, "Input : {} completed", id);
        Ok(())
    }

    fn finalise_document(&mut self) -> NetworkResult<()> {
        report!(self.verbosity, "Document ended...");
        Ok(())
    }
}
