// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Binary snapshots for in-process transfer.

An object graph is mirrored into plain serde types and encoded with bincode.
Free-form mappings and structured expressions travel as JSON text, since
bincode is not self-describing. Snapshots are not a stable file format.
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::expression::EvaluableExpression;
use crate::object::SchemaObject;
use crate::schema::{FieldKind, Schema};
use crate::value::FieldValue;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotNode {
    type_name: String,
    id: Option<String>,
    fields: Vec<(String, SnapshotValue)>,
    children: Vec<(String, Vec<SnapshotNode>)>,
}

#[derive(Debug, Serialize, Deserialize)]
enum SnapshotValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Dict or raw list, as JSON text
    Json(String),
    Expression(SnapshotExpression),
    Object(Box<SnapshotNode>),
    Objects(Vec<SnapshotNode>),
}

#[derive(Debug, Serialize, Deserialize)]
enum SnapshotExpression {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Structured(String),
}

/// Encode an object graph
pub fn snapshot(obj: &SchemaObject) -> ModelResult<Vec<u8>> {
    let node = to_node(obj)?;
    Ok(bincode::serialize(&node)?)
}

/// Decode a snapshot taken from an object of `schema`
pub fn restore(bytes: &[u8], schema: &'static Schema) -> ModelResult<SchemaObject> {
    let node: SnapshotNode = bincode::deserialize(bytes)?;
    from_node(node, schema)
}

fn to_node(obj: &SchemaObject) -> ModelResult<SnapshotNode> {
    let fields = obj
        .assigned_fields()
        .map(|(name, value)| Ok((name.to_string(), to_snapshot_value(value)?)))
        .collect::<ModelResult<Vec<_>>>()?;

    let children = obj
        .child_lists()
        .iter()
        .filter(|list| !list.is_empty())
        .map(|list| {
            let nodes = list.iter().map(to_node).collect::<ModelResult<Vec<_>>>()?;
            Ok((list.name().to_string(), nodes))
        })
        .collect::<ModelResult<Vec<_>>>()?;

    Ok(SnapshotNode {
        type_name: obj.type_name().to_string(),
        id: obj.id().map(str::to_string),
        fields,
        children,
    })
}

fn to_snapshot_value(value: &FieldValue) -> ModelResult<SnapshotValue> {
    Ok(match value {
        FieldValue::Null => SnapshotValue::Null,
        FieldValue::Bool(b) => SnapshotValue::Bool(*b),
        FieldValue::Int(i) => SnapshotValue::Int(*i),
        FieldValue::Float(f) => SnapshotValue::Float(*f),
        FieldValue::Str(s) => SnapshotValue::Str(s.clone()),
        FieldValue::Dict(map) => SnapshotValue::Json(serde_json::to_string(map)?),
        FieldValue::List(items) => SnapshotValue::Json(serde_json::to_string(items)?),
        FieldValue::Expression(expr) => SnapshotValue::Expression(match expr {
            EvaluableExpression::Int(i) => SnapshotExpression::Int(*i),
            EvaluableExpression::Float(f) => SnapshotExpression::Float(*f),
            EvaluableExpression::Bool(b) => SnapshotExpression::Bool(*b),
            EvaluableExpression::Text(s) => SnapshotExpression::Text(s.clone()),
            EvaluableExpression::Structured(v) => SnapshotExpression::Structured(v.to_string()),
        }),
        FieldValue::Object(obj) => SnapshotValue::Object(Box::new(to_node(obj)?)),
        FieldValue::Objects(objs) => {
            SnapshotValue::Objects(objs.iter().map(to_node).collect::<ModelResult<Vec<_>>>()?)
        }
    })
}

fn from_node(node: SnapshotNode, schema: &'static Schema) -> ModelResult<SchemaObject> {
    if node.type_name != schema.type_name {
        return Err(ModelError::Snapshot(format!(
            "snapshot holds a {}, expected {}",
            node.type_name, schema.type_name
        )));
    }

    let mut obj = match node.id {
        Some(id) => SchemaObject::with_id(schema, id),
        None => SchemaObject::new(schema),
    };

    for (name, value) in node.fields {
        let def = schema
            .field(&name)
            .ok_or_else(|| ModelError::schema_violation(schema.type_name, &name))?;
        let value = from_snapshot_value(value, def.kind)?;
        obj.set_field(&name, value)?;
    }

    for (name, nodes) in node.children {
        let def = schema
            .child(&name)
            .ok_or_else(|| ModelError::schema_violation(schema.type_name, &name))?;
        let list = obj.children_mut(&name)?;
        for child in nodes {
            list.push(from_node(child, def.schema)?)?;
        }
    }

    Ok(obj)
}

fn nested(kind: FieldKind) -> ModelResult<&'static Schema> {
    kind.nested_schema().ok_or_else(|| {
        ModelError::Snapshot(format!("nested object stored in a {} field", kind.describe()))
    })
}

fn from_snapshot_value(value: SnapshotValue, kind: FieldKind) -> ModelResult<FieldValue> {
    Ok(match value {
        SnapshotValue::Null => FieldValue::Null,
        SnapshotValue::Bool(b) => FieldValue::Bool(b),
        SnapshotValue::Int(i) => FieldValue::Int(i),
        SnapshotValue::Float(f) => FieldValue::Float(f),
        SnapshotValue::Str(s) => FieldValue::Str(s),
        SnapshotValue::Json(text) => FieldValue::from(serde_json::from_str::<Value>(&text)?),
        SnapshotValue::Expression(expr) => FieldValue::Expression(match expr {
            SnapshotExpression::Int(i) => EvaluableExpression::Int(i),
            SnapshotExpression::Float(f) => EvaluableExpression::Float(f),
            SnapshotExpression::Bool(b) => EvaluableExpression::Bool(b),
            SnapshotExpression::Text(s) => EvaluableExpression::Text(s),
            SnapshotExpression::Structured(text) => {
                EvaluableExpression::Structured(serde_json::from_str(&text)?)
            }
        }),
        SnapshotValue::Object(node) => FieldValue::from(from_node(*node, nested(kind)?)?),
        SnapshotValue::Objects(nodes) => {
            let schema = nested(kind)?;
            FieldValue::Objects(
                nodes
                    .into_iter()
                    .map(|node| from_node(node, schema))
                    .collect::<ModelResult<Vec<_>>>()?,
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ChildDef, FieldDef};
    use serde_json::json;

    static LEAF: Schema = Schema {
        type_name: "Leaf",
        definition: "Leaf",
        identified: false,
        fields: &[FieldDef::new("v", "Value", FieldKind::Expression)],
        children: &[],
    };

    static ROOT: Schema = Schema {
        type_name: "Root",
        definition: "Root",
        identified: true,
        fields: &[
            FieldDef::new("meta", "Metadata", FieldKind::Dict),
            FieldDef::new("rate", "Rate", FieldKind::Float),
            FieldDef::new("leaf", "Leaf", FieldKind::Object(&LEAF)),
            FieldDef::new("leaves", "Leaves", FieldKind::ObjectList(&LEAF)),
        ],
        children: &[ChildDef::new("items", "Items", &LEAF)],
    };

    #[test]
    fn test_snapshot_restores_equal_object() {
        let mut root = SchemaObject::with_id(&ROOT, "r")
            .with("meta", json!({"b": [1, 2], "a": null}))
            .unwrap()
            .with("rate", FieldValue::Null)
            .unwrap()
            .with("leaf", json!({"v": {"x": 1}}))
            .unwrap()
            .with("leaves", json!([{"v": "a+b"}, {"v": 2.5}]))
            .unwrap();
        root.add_child("items", SchemaObject::new(&LEAF).with("v", true).unwrap())
            .unwrap();

        let bytes = snapshot(&root).unwrap();
        let restored = restore(&bytes, &ROOT).unwrap();
        assert_eq!(restored, root);
        assert_eq!(restored.to_string(), root.to_string());
    }

    #[test]
    fn test_restore_checks_type() {
        let bytes = snapshot(&SchemaObject::new(&LEAF)).unwrap();
        assert!(matches!(restore(&bytes, &ROOT), Err(ModelError::Snapshot(_))));
        assert!(restore(&[1, 2, 3], &ROOT).is_err());
    }
}
