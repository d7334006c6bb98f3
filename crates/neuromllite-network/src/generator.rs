// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Network generation.

[`generate_network`] expands a [`Network`] description into concrete cells,
connections and inputs, and reports them to a [`NetworkHandler`] in the
order documented in [`crate::handlers`]. All randomness (layouts,
connectivity, input selection) comes from one seeded `StdRng`, so the same
network and seed always produce the same events.

Populations and regions are resolved through lookup tables built once per
call; an unresolved population or region reference is a
[`NetworkError::Reference`]. Cell, synapse and input source ids may name
components defined outside the network and are passed through as given.
*/

use std::collections::HashMap;

use neuromllite_base::{EvaluableExpression, Parameters, SchemaObject};
use neuromllite_config::GeneratorConfig;
use neuromllite_observability::Verbosity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tracing::info;

use crate::handlers::{report, Connection, NetworkHandler, ProjectionEvent, ProjectionType};
use crate::schemas::Network;
use crate::types::{NetworkError, NetworkResult};

/// Seed used when neither the options nor the network provide one
pub const DEFAULT_SEED: u64 = 1234;

/// Controls for one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    /// Overrides the network's own `seed`
    pub seed: Option<u64>,
    /// Used when neither `seed` nor the network set one
    pub default_seed: u64,
    pub include_connections: bool,
    pub include_inputs: bool,
    /// Pass population properties even when the population has no layout
    pub always_include_props: bool,
    pub verbosity: Verbosity,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            seed: None,
            default_seed: DEFAULT_SEED,
            include_connections: true,
            include_inputs: true,
            always_include_props: false,
            verbosity: Verbosity::Normal,
        }
    }
}

impl From<&GeneratorConfig> for GeneratorOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            seed: None,
            default_seed: config.seed,
            include_connections: config.include_connections,
            include_inputs: config.include_inputs,
            always_include_props: config.always_include_props,
            verbosity: Verbosity::from_flag(config.verbose),
        }
    }
}

/// Counts of what a generation run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub populations: usize,
    pub cells: usize,
    pub projections: usize,
    pub connections: usize,
    pub input_lists: usize,
    pub inputs: usize,
}

/// A population resolved for traversal
struct PopulationInfo<'a> {
    obj: &'a SchemaObject,
    id: &'a str,
    component: &'a str,
    size: usize,
}

/// Walk `network`, reporting every generated element to `handler`
///
/// Stops at the first error, whether raised by resolution, evaluation or
/// the handler itself.
pub fn generate_network(
    network: &Network,
    handler: &mut dyn NetworkHandler,
    options: &GeneratorOptions,
) -> NetworkResult<GenerationSummary> {
    let net_id = network.id_or_empty();
    let parameters = network.parameters();
    let seed = options
        .seed
        .or_else(|| network.get_i64("seed").map(|s| s as u64))
        .unwrap_or(options.default_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut summary = GenerationSummary::default();

    info!(target: "neuromllite-network", "Generating network '{}' (seed {})", net_id, seed);

    let regions: HashMap<&str, &SchemaObject> = network
        .regions()
        .iter()
        .map(|r| (r.id_or_empty(), r))
        .collect();

    let mut populations: Vec<PopulationInfo<'_>> = Vec::with_capacity(network.populations().len());
    let mut total_cells: usize = 0;
    for pop in network.populations() {
        let id = pop.id_or_empty();
        let size = pop
            .get_expression("size")
            .or_else(|| {
                pop.get_object("random_layout")
                    .and_then(|layout| layout.get_expression("size"))
            })
            .ok_or_else(|| NetworkError::missing("Population", id, "size"))?
            .evaluate(&parameters)?
            .as_count()
            .ok_or_else(|| NetworkError::invalid(id, "size", "must evaluate to a non-negative whole number"))?;
        total_cells = total_cells
            .checked_add(size)
            .ok_or_else(|| NetworkError::invalid(id, "size", "total number of cells is too large"))?;
        populations.push(PopulationInfo {
            obj: pop,
            id,
            component: pop.get_str("component").unwrap_or(""),
            size,
        });
    }
    let lookup: HashMap<&str, usize> = populations
        .iter()
        .enumerate()
        .map(|(index, p)| (p.id, index))
        .collect();

    let notes = network.get_str("notes");
    handler.handle_document_start(net_id, notes)?;
    handler.handle_network(net_id, notes, network.get_f64("temperature"))?;

    for pop in &populations {
        let (locations, properties) = place_population(pop, &regions, &mut rng, options)?;
        handler.handle_population(pop.id, pop.component, Some(pop.size), &properties)?;
        for (index, [x, y, z]) in locations.into_iter().enumerate() {
            handler.handle_location(index, pop.id, pop.component, x, y, z)?;
        }
        summary.populations += 1;
        summary.cells += pop.size;
    }

    for proj in network.projections() {
        let id = proj.id_or_empty();
        let pre = proj
            .get_str("presynaptic")
            .ok_or_else(|| NetworkError::missing("Projection", id, "presynaptic"))?;
        let pre = resolve_population(&populations, &lookup, pre, id)?;
        let post = proj
            .get_str("postsynaptic")
            .ok_or_else(|| NetworkError::missing("Projection", id, "postsynaptic"))?;
        let post = resolve_population(&populations, &lookup, post, id)?;
        let synapse = proj.get_str("synapse");
        let pre_synapse = proj.get_str("pre_synapse");
        let projection_type = match proj.get_str("type") {
            Some(kind) => kind
                .parse::<ProjectionType>()
                .map_err(|reason| NetworkError::invalid(id, "type", reason))?,
            None if pre_synapse.is_some() => ProjectionType::ContinuousProjection,
            None => ProjectionType::Projection,
        };

        handler.handle_projection(&ProjectionEvent {
            id,
            presynaptic: pre.id,
            postsynaptic: post.id,
            synapse,
            pre_synapse,
            has_weights: proj.is_set("weight"),
            has_delays: proj.is_set("delay"),
            projection_type,
        })?;

        if options.include_connections {
            let weight = evaluate_or(proj.get_expression("weight"), 1.0, &parameters)?;
            let delay = evaluate_or(proj.get_expression("delay"), 0.0, &parameters)?;
            let mut connect = |index: usize, pre_cell: usize, post_cell: usize| {
                handler.handle_connection(&Connection {
                    projection: id,
                    id: index,
                    presynaptic: pre.id,
                    postsynaptic: post.id,
                    synapse,
                    pre_cell,
                    post_cell,
                    pre_segment: 0,
                    pre_fraction: 0.5,
                    post_segment: 0,
                    post_fraction: 0.5,
                    delay,
                    weight,
                })
            };

            let mut count = 0;
            if let Some(rc) = proj.get_object("random_connectivity") {
                let probability = rc
                    .get_expression("probability")
                    .ok_or_else(|| NetworkError::missing("RandomConnectivity", id, "probability"))?
                    .evaluate_f64(&parameters)?;
                for pre_cell in 0..pre.size {
                    for post_cell in 0..post.size {
                        if rng.gen::<f64>() < probability {
                            connect(count, pre_cell, post_cell)?;
                            count += 1;
                        }
                    }
                }
            } else if proj.is_set("one_to_one_connector") {
                for cell in 0..pre.size.min(post.size) {
                    connect(count, cell, cell)?;
                    count += 1;
                }
            }
            report!(options.verbosity, "Projection {}: {} connections", id, count);
            summary.connections += count;
        }

        handler.finalise_projection(id, pre.id, post.id, synapse, projection_type)?;
        summary.projections += 1;
    }

    if options.include_inputs {
        for input in network.inputs() {
            let id = input.id_or_empty();
            let target = input
                .get_str("population")
                .ok_or_else(|| NetworkError::missing("Input", id, "population"))?;
            let pop = resolve_population(&populations, &lookup, target, id)?;
            let source = input
                .get_str("input_source")
                .ok_or_else(|| NetworkError::missing("Input", id, "input_source"))?;
            let percentage = input.get_f64("percentage").unwrap_or(100.0);
            let number_per_cell = match input.get_expression("number_per_cell") {
                Some(expr) => expr.evaluate(&parameters)?.as_count().ok_or_else(|| {
                    NetworkError::invalid(id, "number_per_cell", "must evaluate to a non-negative whole number")
                })?,
                None => 1,
            };
            let weight = evaluate_or(input.get_expression("weight"), 1.0, &parameters)?;

            handler.handle_input_list(id, pop.id, source, Some(pop.size))?;
            let mut input_count = 0;
            for cell in 0..pop.size {
                if rng.gen::<f64>() * 100.0 < percentage {
                    for _ in 0..number_per_cell {
                        handler.handle_single_input(id, input_count, cell, 0, 0.5, weight)?;
                        input_count += 1;
                    }
                }
            }
            handler.finalise_input_source(id)?;
            summary.input_lists += 1;
            summary.inputs += input_count;
        }
    }

    for pop in &populations {
        handler.finalise_population(pop.id)?;
    }
    handler.finalise_document()?;

    info!(
        target: "neuromllite-network",
        "Generated '{}': {} populations, {} cells, {} projections, {} connections, {} inputs",
        net_id,
        summary.populations,
        summary.cells,
        summary.projections,
        summary.connections,
        summary.inputs
    );
    Ok(summary)
}

fn resolve_population<'p, 'a>(
    populations: &'p [PopulationInfo<'a>],
    lookup: &HashMap<&str, usize>,
    name: &str,
    owner: &str,
) -> NetworkResult<&'p PopulationInfo<'a>> {
    lookup
        .get(name)
        .map(|&index| &populations[index])
        .ok_or_else(|| NetworkError::reference("population", name, owner))
}

fn evaluate_or(
    expression: Option<&EvaluableExpression>,
    default: f64,
    parameters: &Parameters,
) -> NetworkResult<f64> {
    match expression {
        Some(expr) => Ok(expr.evaluate_f64(parameters)?),
        None => Ok(default),
    }
}

fn corner(region: &SchemaObject) -> [f64; 3] {
    [
        region.get_f64("x").unwrap_or(0.0),
        region.get_f64("y").unwrap_or(0.0),
        region.get_f64("z").unwrap_or(0.0),
    ]
}

fn find_region<'a>(
    regions: &HashMap<&str, &'a SchemaObject>,
    layout: &SchemaObject,
    population: &str,
) -> NetworkResult<&'a SchemaObject> {
    let name = layout
        .get_str("region")
        .ok_or_else(|| NetworkError::missing(layout.type_name(), population, "region"))?;
    regions
        .get(name)
        .copied()
        .ok_or_else(|| NetworkError::reference("region", name, population))
}

/// Cell positions and the properties to report for one population
fn place_population(
    pop: &PopulationInfo<'_>,
    regions: &HashMap<&str, &SchemaObject>,
    rng: &mut StdRng,
    options: &GeneratorOptions,
) -> NetworkResult<(Vec<[f64; 3]>, Map<String, Value>)> {
    let mut properties = pop.obj.get_dict("properties").cloned().unwrap_or_default();

    if let Some(layout) = pop.obj.get_object("random_layout") {
        let region = find_region(regions, layout, pop.id)?;
        let [x0, y0, z0] = corner(region);
        let width = region.get_f64("width").unwrap_or(0.0);
        let height = region.get_f64("height").unwrap_or(0.0);
        let depth = region.get_f64("depth").unwrap_or(0.0);
        let locations = (0..pop.size)
            .map(|_| {
                let x = x0 + rng.gen::<f64>() * width;
                let y = y0 + rng.gen::<f64>() * height;
                let z = z0 + rng.gen::<f64>() * depth;
                [x, y, z]
            })
            .collect();
        properties.insert("region".to_string(), Value::from(region.id_or_empty()));
        return Ok((locations, properties));
    }

    if let Some(layout) = pop.obj.get_object("relative_layout") {
        let region = find_region(regions, layout, pop.id)?;
        let [x0, y0, z0] = corner(region);
        let point = [
            x0 + layout.get_f64("x").unwrap_or(0.0),
            y0 + layout.get_f64("y").unwrap_or(0.0),
            z0 + layout.get_f64("z").unwrap_or(0.0),
        ];
        return Ok((vec![point; pop.size], properties));
    }

    if let Some(layout) = pop.obj.get_object("single_location") {
        let location = layout
            .get_object("location")
            .ok_or_else(|| NetworkError::missing("SingleLocation", pop.id, "location"))?;
        return Ok((vec![corner(location); pop.size], properties));
    }

    if !options.always_include_props {
        properties.clear();
    }
    Ok((Vec::new(), properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromllite_base::SchemaType;
    use crate::schemas::{Location, Population, RandomLayout, RectangularRegion, SingleLocation};

    #[derive(Default)]
    struct Locations(Vec<(String, usize, [f64; 3])>);

    impl NetworkHandler for Locations {
        fn handle_location(
            &mut self,
            id: usize,
            population: &str,
            _component: &str,
            x: f64,
            y: f64,
            z: f64,
        ) -> NetworkResult<()> {
            self.0.push((population.to_string(), id, [x, y, z]));
            Ok(())
        }
    }

    fn placed_network() -> Network {
        let mut net = Network::new("placed");
        net.add_region(
            RectangularRegion::new("box")
                .with("x", 10)
                .unwrap()
                .with("y", 0)
                .unwrap()
                .with("z", 0)
                .unwrap()
                .with("width", 100)
                .unwrap()
                .with("height", 50)
                .unwrap()
                .with("depth", 20)
                .unwrap(),
        )
        .unwrap();
        net.add_population(
            Population::new("scattered")
                .with("size", 20)
                .unwrap()
                .with("random_layout", RandomLayout::in_region("box").unwrap())
                .unwrap(),
        )
        .unwrap();
        net.add_population(
            Population::new("point")
                .with("size", 2)
                .unwrap()
                .with(
                    "single_location",
                    SingleLocation::new()
                        .with("location", Location::at(1.0, 2.0, 3.0).unwrap())
                        .unwrap(),
                )
                .unwrap(),
        )
        .unwrap();
        net
    }

    #[test]
    fn test_random_layout_stays_inside_region() {
        let net = placed_network();
        let mut handler = Locations::default();
        generate_network(&net, &mut handler, &GeneratorOptions::default()).unwrap();

        let scattered: Vec<_> = handler.0.iter().filter(|(p, _, _)| p == "scattered").collect();
        assert_eq!(scattered.len(), 20);
        for (_, _, [x, y, z]) in scattered {
            assert!((10.0..110.0).contains(x));
            assert!((0.0..50.0).contains(y));
            assert!((0.0..20.0).contains(z));
        }
        let point: Vec<_> = handler.0.iter().filter(|(p, _, _)| p == "point").collect();
        assert_eq!(point.len(), 2);
        assert_eq!(point[1].1, 1);
        assert_eq!(point[1].2, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_region_is_a_reference_error() {
        let mut net = Network::new("n");
        net.add_population(
            Population::new("p")
                .with("size", 1)
                .unwrap()
                .with("random_layout", RandomLayout::in_region("nowhere").unwrap())
                .unwrap(),
        )
        .unwrap();
        let err = generate_network(&net, &mut Locations::default(), &GeneratorOptions::default())
            .unwrap_err();
        assert!(matches!(err, NetworkError::Reference { ref kind, .. } if kind == "region"));
    }

    #[test]
    fn test_population_size_rules() {
        let mut net = Network::new("n");
        net.add_population(Population::new("p")).unwrap();
        let err = generate_network(&net, &mut Locations::default(), &GeneratorOptions::default())
            .unwrap_err();
        assert!(matches!(err, NetworkError::MissingField { .. }));

        let mut net = Network::new("n");
        net.add_population(Population::new("p").with("size", "2.5").unwrap()).unwrap();
        let err = generate_network(&net, &mut Locations::default(), &GeneratorOptions::default())
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidValue { .. }));
    }

    #[test]
    fn test_random_layout_size_is_used_without_population_size() {
        let text = r#"{"net": {
            "regions": {"r1": {"x": 0, "y": 0, "z": 0, "width": 10, "height": 10, "depth": 10}},
            "populations": {"pop0": {"component": "hh", "random_layout": {"size": 5, "region": "r1"}}}
        }}"#;
        let net = Network::from_json(text).unwrap();
        let mut handler = Locations::default();
        let summary = generate_network(&net, &mut handler, &GeneratorOptions::default()).unwrap();
        assert_eq!(summary.cells, 5);
        assert_eq!(handler.0.len(), 5);

        // the population's own size wins
        let mut net = net;
        net.children_mut("populations")
            .unwrap()
            .get_mut("pop0")
            .unwrap()
            .set_field("size", 2)
            .unwrap();
        let summary = generate_network(&net, &mut Locations::default(), &GeneratorOptions::default()).unwrap();
        assert_eq!(summary.cells, 2);
    }

    #[test]
    fn test_oversized_populations_are_rejected() {
        let mut net = Network::new("n");
        net.add_population(Population::new("a").with("size", "1e19").unwrap()).unwrap();
        net.add_population(Population::new("b").with("size", "1e19").unwrap()).unwrap();
        let err = generate_network(&net, &mut Locations::default(), &GeneratorOptions::default())
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidValue { ref id, .. } if id == "b"));

        let mut net = Network::new("n");
        net.add_population(Population::new("a").with("size", "1e300").unwrap()).unwrap();
        let err = generate_network(&net, &mut Locations::default(), &GeneratorOptions::default())
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidValue { .. }));
    }

    #[test]
    fn test_options_from_config() {
        let config = GeneratorConfig {
            seed: 7,
            include_connections: false,
            include_inputs: true,
            always_include_props: true,
            verbose: true,
        };
        let options = GeneratorOptions::from(&config);
        assert_eq!(options.default_seed, 7);
        assert_eq!(options.seed, None);
        assert!(!options.include_connections);
        assert!(options.always_include_props);
        assert_eq!(options.verbosity, Verbosity::Verbose);
    }
}
