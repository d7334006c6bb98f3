// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Property tests for the round-trip laws and expression determinism

use neuromllite_base::{
    evaluate, from_structured_text, restore, snapshot, to_structured_text, ChildDef, FieldDef,
    FieldKind, FieldValue, ModelError, Schema, SchemaObject, StructuredFormat,
};
use proptest::prelude::*;
use serde_json::json;

static ITEM: Schema = Schema {
    type_name: "Item",
    definition: "Identified element",
    identified: true,
    fields: &[
        FieldDef::new("label", "Label", FieldKind::Str),
        FieldDef::new("size", "Size", FieldKind::Expression),
    ],
    children: &[],
};

static CONTAINER: Schema = Schema {
    type_name: "Container",
    definition: "Container",
    identified: true,
    fields: &[
        FieldDef::new("count", "Count", FieldKind::Int),
        FieldDef::new("ratio", "Ratio", FieldKind::Float),
        FieldDef::new("flag", "Flag", FieldKind::Bool),
        FieldDef::new("notes", "Notes", FieldKind::Str),
    ],
    children: &[ChildDef::new("items", "Items", &ITEM)],
};

fn label() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.*+-]{0,12}"
}

fn item_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<i32>().prop_map(FieldValue::from),
        (-1.0e6..1.0e6f64).prop_map(FieldValue::from),
        any::<bool>().prop_map(FieldValue::from),
        label().prop_map(FieldValue::from),
        Just(FieldValue::Null),
    ]
}

prop_compose! {
    fn container()(
        count in proptest::option::of(any::<i64>()),
        ratio in proptest::option::of(-1.0e9..1.0e9f64),
        flag in proptest::option::of(any::<bool>()),
        notes in proptest::option::of(label()),
        items in proptest::collection::vec((label(), item_value()), 0..6),
    ) -> SchemaObject {
        let mut obj = SchemaObject::with_id(&CONTAINER, "c0");
        if let Some(count) = count {
            obj.set_field("count", count).unwrap();
        }
        if let Some(ratio) = ratio {
            obj.set_field("ratio", ratio).unwrap();
        }
        if let Some(flag) = flag {
            obj.set_field("flag", flag).unwrap();
        }
        if let Some(notes) = notes {
            obj.set_field("notes", notes).unwrap();
        }
        for (index, (text, size)) in items.into_iter().enumerate() {
            let item = SchemaObject::with_id(&ITEM, format!("item{}", index))
                .with("label", text)
                .unwrap()
                .with("size", size)
                .unwrap();
            obj.add_child("items", item).unwrap();
        }
        obj
    }
}

proptest! {
    #[test]
    fn prop_json_round_trip(obj in container()) {
        let text = to_structured_text(&obj, StructuredFormat::Json, 4).unwrap();
        let back = from_structured_text(&text, StructuredFormat::Json, &CONTAINER).unwrap();
        prop_assert_eq!(&back, &obj);
        prop_assert_eq!(to_structured_text(&back, StructuredFormat::Json, 4).unwrap(), text);
    }

    #[test]
    fn prop_yaml_round_trip(obj in container()) {
        let text = to_structured_text(&obj, StructuredFormat::Yaml, 0).unwrap();
        let back = from_structured_text(&text, StructuredFormat::Yaml, &CONTAINER).unwrap();
        prop_assert_eq!(back, obj);
    }

    #[test]
    fn prop_snapshot_round_trip(obj in container()) {
        let restored = restore(&snapshot(&obj).unwrap(), &CONTAINER).unwrap();
        prop_assert_eq!(restored, obj);
    }

    #[test]
    fn prop_undeclared_names_always_fail(name in "[a-z]{1,10}") {
        prop_assume!(!CONTAINER.allows(&name));
        let mut obj = SchemaObject::with_id(&CONTAINER, "c0");
        let err = obj.set_field(&name, 1).unwrap_err();
        let is_violation = matches!(err, ModelError::SchemaViolation { .. });
        prop_assert!(is_violation);
    }

    #[test]
    fn prop_uncoercible_values_always_fail(value in "[a-z]{1,8}") {
        let mut obj = SchemaObject::with_id(&CONTAINER, "c0");
        let is_mismatch = matches!(
            obj.set_field("flag", value.as_str()),
            Err(ModelError::TypeMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    #[test]
    fn prop_evaluation_is_deterministic(x in -1000i64..1000, y in 1i64..1000) {
        let params = json!({"x": x, "y": y});
        let params = params.as_object().unwrap();
        let first = evaluate("2*x + y % 7 - x / y", params).unwrap();
        let second = evaluate("2*x + y % 7 - x / y", params).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(evaluate("2*x", params).unwrap().as_f64(), (2 * x) as f64);
    }
}
