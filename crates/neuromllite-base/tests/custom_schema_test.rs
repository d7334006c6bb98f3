// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Save/load tests for a schema declared outside the crate
///
/// Exercises every field kind, both child flavours and all expression
/// literal forms through JSON, YAML and snapshots.

use neuromllite_base::{
    load_json_file, load_yaml_file, schema_type, to_json_file, to_yaml_file, ChildDef,
    EvaluableExpression, FieldDef, FieldKind, FieldValue, ModelError, Schema, SchemaType,
};
use serde_json::json;

static NEW_CELL: Schema = Schema {
    type_name: "NewCell",
    definition: "A cell",
    identified: true,
    fields: &[FieldDef::new("neuroml2_source_file", "File name of NeuroML2 file", FieldKind::Str)],
    children: &[],
};

static NEW_SYNAPSE: Schema = Schema {
    type_name: "NewSynapse",
    definition: "A synapse",
    identified: true,
    fields: &[
        FieldDef::new("neuroml2_source_file", "File name of NeuroML2 file", FieldKind::Str),
        FieldDef::new("tested", "Is it tested?", FieldKind::Bool),
    ],
    children: &[],
};

static NEW_RANDOM_CONNECTIVITY: Schema = Schema {
    type_name: "NewRandomConnectivity",
    definition: "Random connectivity",
    identified: false,
    fields: &[FieldDef::new("probability", "Random probability of connection", FieldKind::Expression)],
    children: &[],
};

static NEW_NETWORK: Schema = Schema {
    type_name: "NewNetwork",
    definition: "...",
    identified: true,
    fields: &[
        FieldDef::new("version", "Information on version", FieldKind::Str),
        FieldDef::new("seed", "Seed for random number generator", FieldKind::Int),
        FieldDef::new("stable", "Testing...", FieldKind::Bool),
        FieldDef::new("parameters", "Dictionary of global parameters", FieldKind::Dict),
        FieldDef::new(
            "random_connectivity",
            "Use random connectivity",
            FieldKind::Object(&NEW_RANDOM_CONNECTIVITY),
        ),
        FieldDef::new("ee0", "TestEE", FieldKind::Expression),
        FieldDef::new("ee1", "TestEE", FieldKind::Expression),
        FieldDef::new("ee2", "TestEE", FieldKind::Expression),
        FieldDef::new("ee3", "TestEE", FieldKind::Expression),
        FieldDef::new("ee4", "TestEE", FieldKind::Expression),
        FieldDef::new("ee5", "TestEE", FieldKind::Expression),
        FieldDef::new("ee6", "TestEE", FieldKind::Expression),
    ],
    children: &[
        ChildDef::new("cells", "The cell definitions...", &NEW_CELL),
        ChildDef::new("synapses", "The synapse definitions...", &NEW_SYNAPSE),
    ],
};

schema_type! {
    struct NewNetwork: NEW_NETWORK, id;
}

schema_type! {
    struct NewCell: NEW_CELL, id;
}

schema_type! {
    struct NewSynapse: NEW_SYNAPSE, id;
}

schema_type! {
    struct NewRandomConnectivity: NEW_RANDOM_CONNECTIVITY;
}

fn build_network() -> NewNetwork {
    let mut net = NewNetwork::new("netid")
        .with("parameters", json!({"size": 3, "name": null}))
        .unwrap()
        .with("version", "NeuroMLlite 0.0")
        .unwrap();

    net.set_field("ee0", "str").unwrap();
    net.set_field("ee1", json!({"a": 2})).unwrap();
    net.set_field("ee2", 1).unwrap();
    net.set_field("ee3", 1.1).unwrap();
    net.set_field("ee4", true).unwrap();
    net.set_field("ee5", json!([1, 2])).unwrap();
    net.set_field("ee6", FieldValue::Null).unwrap();

    let cells = net.children_mut("cells").unwrap();
    cells
        .push(NewCell::new("cellid1").with("neuroml2_source_file", "nnn").unwrap())
        .unwrap();
    cells
        .push(NewCell::new("cellid2").with("neuroml2_source_file", "nnn2").unwrap())
        .unwrap();

    let synapses = net.children_mut("synapses").unwrap();
    synapses
        .push(
            NewSynapse::new("syn0")
                .with("neuroml2_source_file", FieldValue::Null)
                .unwrap()
                .with("tested", true)
                .unwrap(),
        )
        .unwrap();
    synapses
        .push(
            NewSynapse::new("syn1")
                .with("neuroml2_source_file", "xx")
                .unwrap()
                .with("tested", FieldValue::Null)
                .unwrap(),
        )
        .unwrap();

    net.set_field(
        "random_connectivity",
        NewRandomConnectivity::new().with("probability", 0.01).unwrap(),
    )
    .unwrap();
    net.set_field("stable", false).unwrap();
    net
}

#[test]
fn test_unknown_attribute_is_rejected() {
    let net = build_network();
    let err = net.get_field("notcells").unwrap_err();
    assert_eq!(
        err,
        ModelError::SchemaViolation {
            type_name: "NewNetwork".to_string(),
            name: "notcells".to_string()
        }
    );
    assert!(err.to_string().contains("notcells"));
}

#[test]
fn test_save_load_json_and_yaml() {
    let dir = tempfile::tempdir().expect("temp dir");
    let net = build_network();
    let str_orig = net.to_string();

    let json_path = to_json_file(&net, Some(&dir.path().join("netid.json")), 4).unwrap();
    let yaml_path = to_yaml_file(&net, Some(&dir.path().join("netid.yaml"))).unwrap();

    let netj = NewNetwork::from_object(load_json_file(&json_path, &NEW_NETWORK).unwrap()).unwrap();
    let nety = NewNetwork::from_object(load_yaml_file(&yaml_path, &NEW_NETWORK).unwrap()).unwrap();

    assert_eq!(netj.to_string(), str_orig);
    assert_eq!(nety.to_string(), str_orig);
    assert_eq!(netj, net);
    assert_eq!(nety, net);

    for i in 0..7 {
        let name = format!("ee{}", i);
        assert_eq!(net.get_field(&name).unwrap(), netj.get_field(&name).unwrap(), "{}", name);
        assert_eq!(net.get_field(&name).unwrap(), nety.get_field(&name).unwrap(), "{}", name);
    }
}

#[test]
fn test_expression_literals_survive() {
    let net = NewNetwork::from_json(&build_network().to_json(0).unwrap()).unwrap();
    assert_eq!(net.get_expression("ee0"), Some(&EvaluableExpression::from("str")));
    assert_eq!(net.get_expression("ee2"), Some(&EvaluableExpression::Int(1)));
    assert_eq!(net.get_expression("ee3"), Some(&EvaluableExpression::Float(1.1)));
    assert_eq!(net.get_expression("ee4"), Some(&EvaluableExpression::Bool(true)));
    assert_eq!(
        net.get_expression("ee5"),
        Some(&EvaluableExpression::Structured(json!([1, 2])))
    );
    assert_eq!(net.get_field("ee6").unwrap(), Some(FieldValue::Null));
}

#[test]
fn test_save_load_snapshot() {
    let net = build_network();
    let restored = NewNetwork::restore(&net.snapshot().unwrap()).unwrap();
    assert_eq!(restored.to_string(), net.to_string());
    assert_eq!(restored.to_json(4).unwrap(), net.to_json(4).unwrap());
    assert_eq!(restored, net);
}

#[test]
fn test_deep_copy_is_independent() {
    let net = build_network();
    let mut copy = net.clone();
    copy.children_mut("cells").unwrap().remove("cellid1");
    assert_eq!(net.children("cells").unwrap().len(), 2);
    assert_ne!(copy, net);
}
