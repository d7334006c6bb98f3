// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// End-to-end scenarios across the workspace crates
///
/// Build networks through the prelude, persist them, load them back and
/// generate them with handlers.

use neuromllite::prelude::*;
use neuromllite::base::{restore, snapshot, to_json_file, to_yaml_file};
use neuromllite::network::NETWORK_SCHEMA;
use serde_json::{json, Map, Value};

/// Two populations of 5 and 10 cells joined by a p = 0.5 projection
fn scenario_network() -> Network {
    let mut net = Network::new("net0").with("seed", 1234).expect("seed");
    net.add_population(Population::new("pop0").with("size", 5).unwrap()).unwrap();
    net.add_population(Population::new("pop1").with("size", 10).unwrap()).unwrap();
    net.add_projection(
        Projection::new("proj0")
            .with("presynaptic", "pop0")
            .unwrap()
            .with("postsynaptic", "pop1")
            .unwrap()
            .with("synapse", "ampa")
            .unwrap()
            .with("random_connectivity", RandomConnectivity::with_probability(0.5).unwrap())
            .unwrap(),
    )
    .unwrap();
    net
}

/// Regions, components, inputs and layouts, as in a typical two-region model
fn example_network() -> Network {
    let mut net = Network::new("Example2_TestNetwork")
        .with("version", "NeuroMLlite v0.1")
        .unwrap()
        .with(
            "notes",
            "A simple network with 2 populations & projection between them.",
        )
        .unwrap()
        .with("temperature", 6.3)
        .unwrap()
        .with("parameters", json!({"N": 10, "fraction_E": 0.5, "weightInput": "2 * 0.5"}))
        .unwrap();

    for (id, y) in [("region1", 0), ("region2", 200)] {
        net.add_region(
            RectangularRegion::new(id)
                .with("x", 0)
                .unwrap()
                .with("y", y)
                .unwrap()
                .with("z", 0)
                .unwrap()
                .with("width", 1000)
                .unwrap()
                .with("height", 100)
                .unwrap()
                .with("depth", 1000)
                .unwrap(),
        )
        .unwrap();
    }
    net.add_cell(Cell::new("hhcell").with("neuroml2_source_file", "test_files/hhcell.cell.nml").unwrap())
        .unwrap();
    net.add_synapse(Synapse::new("ampa").with("neuroml2_source_file", "test_files/ampa.synapse.nml").unwrap())
        .unwrap();
    net.add_input_source(
        InputSource::new("poissonFiringSyn")
            .with("neuroml2_source_file", "test_files/inputs.nml")
            .unwrap(),
    )
    .unwrap();

    net.add_population(
        Population::new("pop0")
            .with("size", "N * fraction_E")
            .unwrap()
            .with("component", "hhcell")
            .unwrap()
            .with("properties", json!({"color": ".8 0 0"}))
            .unwrap()
            .with("random_layout", RandomLayout::in_region("region1").unwrap())
            .unwrap(),
    )
    .unwrap();
    net.add_population(
        Population::new("pop1")
            .with("size", "N")
            .unwrap()
            .with("component", "hhcell")
            .unwrap()
            .with("random_layout", RandomLayout::in_region("region2").unwrap())
            .unwrap(),
    )
    .unwrap();
    net.add_projection(
        Projection::new("proj0")
            .with("presynaptic", "pop0")
            .unwrap()
            .with("postsynaptic", "pop1")
            .unwrap()
            .with("synapse", "ampa")
            .unwrap()
            .with("delay", 2)
            .unwrap()
            .with("random_connectivity", RandomConnectivity::with_probability(0.5).unwrap())
            .unwrap(),
    )
    .unwrap();
    net.add_input(
        Input::new("stim_pop0")
            .with("input_source", "poissonFiringSyn")
            .unwrap()
            .with("population", "pop0")
            .unwrap()
            .with("percentage", 80)
            .unwrap()
            .with("weight", "weightInput")
            .unwrap(),
    )
    .unwrap();
    net
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_scenario_round_trip() {
    let net = scenario_network();
    let text = net.to_json(4).expect("serialize");
    let back = Network::from_json(&text).expect("deserialize");
    assert_eq!(back, net);

    let sizes: Vec<(&str, f64)> = back
        .populations()
        .iter()
        .map(|p| (p.id_or_empty(), p.get_f64("size").unwrap()))
        .collect();
    assert_eq!(sizes, vec![("pop0", 5.0), ("pop1", 10.0)]);

    let probability = back.projections()[0]
        .get_object("random_connectivity")
        .and_then(|rc| rc.get_expression("probability"))
        .expect("probability")
        .evaluate_f64(&back.parameters())
        .unwrap();
    assert_eq!(probability, 0.5);

    // a second pass produces the same text
    assert_eq!(back.to_json(4).unwrap(), text);
}

#[test]
fn test_example_network_files() {
    let dir = tempfile::tempdir().unwrap();
    let net = example_network();

    let json_path = to_json_file(&net, Some(&dir.path().join("Example2.json")), 4).unwrap();
    let yaml_path = to_yaml_file(&net, Some(&dir.path().join("Example2.yaml"))).unwrap();
    assert_eq!(load_network_json(&json_path).unwrap(), net);
    assert_eq!(load_network_yaml(&yaml_path).unwrap(), net);
    assert_eq!(load_network(&yaml_path).unwrap(), net);

    let text = std::fs::read_to_string(&json_path).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    let body = &doc["Example2_TestNetwork"];
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "notes",
            "version",
            "temperature",
            "parameters",
            "cells",
            "synapses",
            "input_sources",
            "regions",
            "populations",
            "projections",
            "inputs"
        ]
    );
    assert_eq!(body["populations"]["pop0"]["size"], "N * fraction_E");
    assert_eq!(body["populations"]["pop0"]["random_layout"]["region"], "region1");
}

#[test]
fn test_snapshot_and_deep_copy() {
    let net = example_network();
    let restored = restore(&snapshot(&net).unwrap(), &NETWORK_SCHEMA).unwrap();
    assert_eq!(restored, *net);
    assert_eq!(Network::restore(&net.snapshot().unwrap()).unwrap(), net);

    let mut copy = net.clone();
    copy.children_mut("populations")
        .unwrap()
        .get_mut("pop1")
        .unwrap()
        .set_field("size", 3)
        .unwrap();
    assert_ne!(copy, net);
    assert_eq!(net.get_child("pop1", "populations").unwrap().get_str("size"), Some("N"));
}

#[test]
fn test_simulation_file() {
    let dir = tempfile::tempdir().unwrap();
    let sim = Simulation::new("SimExample2")
        .with("network", "Example2_TestNetwork.json")
        .unwrap()
        .with("duration", 1000)
        .unwrap()
        .with("dt", 0.025)
        .unwrap()
        .with("recordTraces", json!({"all": "*"}))
        .unwrap();
    let path = to_json_file(&sim, Some(&dir.path().join("SimExample2.json")), 4).unwrap();
    let back = load_simulation_json(&path).unwrap();
    assert_eq!(back, sim);
    assert_eq!(back.get_f64("duration"), Some(1000.0));
}

// ============================================================================
// Generation
// ============================================================================

/// Only cares about populations and the end of the document
#[derive(Default)]
struct PopulationCounter {
    populations: Vec<(String, Option<usize>)>,
    done: bool,
}

impl NetworkHandler for PopulationCounter {
    fn handle_population(
        &mut self,
        id: &str,
        _component: &str,
        size: Option<usize>,
        _properties: &Map<String, Value>,
    ) -> NetworkResult<()> {
        self.populations.push((id.to_string(), size));
        Ok(())
    }

    fn finalise_document(&mut self) -> NetworkResult<()> {
        self.done = true;
        Ok(())
    }
}

#[test]
fn test_partial_handler_uses_defaults() {
    let net = example_network();
    let mut handler = PopulationCounter::default();
    let summary = generate_network(&net, &mut handler, &GeneratorOptions::default())
        .expect("defaults must not fail");
    assert!(handler.done);
    assert_eq!(
        handler.populations,
        vec![("pop0".to_string(), Some(5)), ("pop1".to_string(), Some(10))]
    );
    assert_eq!(summary.input_lists, 1);
    assert!(summary.inputs <= 5);
}

#[test]
fn test_generation_is_deterministic() {
    let net = scenario_network();
    let run = || {
        let mut handler = DefaultNetworkHandler::new(Verbosity::Quiet);
        generate_network(&net, &mut handler, &GeneratorOptions::default()).unwrap()
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(first.populations, 2);
    assert_eq!(first.projections, 1);
    assert!(first.connections > 0 && first.connections < 50);
}

#[test]
fn test_options_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("neuromllite.toml");
    std::fs::write(&path, "[generator]\nseed = 99\ninclude_inputs = false\n").unwrap();
    let config = neuromllite::config::load_config(Some(&path), None).unwrap();
    let options = GeneratorOptions::from(&config.generator);
    assert_eq!(options.default_seed, 99);

    let net = example_network();
    let summary = generate_network(&net, &mut PopulationCounter::default(), &options).unwrap();
    assert_eq!(summary.input_lists, 0);
}

#[test]
fn test_export_section_drives_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("neuromllite.toml");
    let out = dir.path().join("exports");
    std::fs::write(
        &path,
        format!(
            "[export]\noutput_dir = {:?}\njson_indent = 0\ngraphviz_level = 3\n",
            out.to_string_lossy()
        ),
    )
    .unwrap();
    let config = neuromllite::config::load_config(Some(&path), None).unwrap();
    let net = example_network();

    let saved = save_network(&net, StructuredFormat::Json, &config.export).unwrap();
    assert!(!std::fs::read_to_string(&saved).unwrap().contains('\n'));
    assert_eq!(load_network(&saved).unwrap(), net);

    let options = GeneratorOptions::from(&config.generator);
    let mut diagram = GraphVizHandler::from_config(&config.export, Some(&net), Verbosity::Quiet);
    generate_network(&net, &mut diagram, &options).unwrap();
    let dot = std::fs::read_to_string(out.join("Example2_TestNetwork.gv")).unwrap();
    assert!(dot.contains("<i>5 cells</i>"));
    assert!(!dot.contains("conns"));
}
