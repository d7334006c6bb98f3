// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Field value holder and coercion to declared field kinds.
*/

use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::expression::EvaluableExpression;
use crate::object::SchemaObject;
use crate::schema::{FieldDef, FieldKind, Schema};
use crate::serialization::object_from_body;

/// A value stored in (or offered to) a schema object field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicitly assigned null, distinct from "never assigned"
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Dict(Map<String, Value>),
    /// Raw sequence; only accepted as input and coerced on assignment
    List(Vec<Value>),
    Expression(EvaluableExpression),
    Object(Box<SchemaObject>),
    Objects(Vec<SchemaObject>),
}

impl FieldValue {
    /// Type name used in mismatch messages
    pub fn type_name(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(_) => "bool".to_string(),
            FieldValue::Int(_) => "int".to_string(),
            FieldValue::Float(_) => "float".to_string(),
            FieldValue::Str(_) => "str".to_string(),
            FieldValue::Dict(_) => "dict".to_string(),
            FieldValue::List(_) => "list".to_string(),
            FieldValue::Expression(_) => "EvaluableExpression".to_string(),
            FieldValue::Object(obj) => obj.type_name().to_string(),
            FieldValue::Objects(objs) => match objs.first() {
                Some(first) => format!("list of {}", first.type_name()),
                None => "list".to_string(),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s.as_str()),
            FieldValue::Expression(EvaluableExpression::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Expression(EvaluableExpression::Int(i)) => Some(*i as f64),
            FieldValue::Expression(EvaluableExpression::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Expression(EvaluableExpression::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Expression(EvaluableExpression::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Map<String, Value>> {
        match self {
            FieldValue::Dict(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            FieldValue::Object(obj) => Some(&**obj),
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&[SchemaObject]> {
        match self {
            FieldValue::Objects(objs) => Some(objs.as_slice()),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&EvaluableExpression> {
        match self {
            FieldValue::Expression(expr) => Some(expr),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Str(v.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Map<String, Value>> for FieldValue {
    fn from(v: Map<String, Value>) -> Self {
        FieldValue::Dict(v)
    }
}

impl From<EvaluableExpression> for FieldValue {
    fn from(v: EvaluableExpression) -> Self {
        FieldValue::Expression(v)
    }
}

impl From<SchemaObject> for FieldValue {
    fn from(v: SchemaObject) -> Self {
        FieldValue::Object(Box::new(v))
    }
}

impl From<Vec<SchemaObject>> for FieldValue {
    fn from(v: Vec<SchemaObject>) -> Self {
        FieldValue::Objects(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

// Structured-text values map onto the closest variant; coercion decides the rest
impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Str(s),
            Value::Array(items) => FieldValue::List(items),
            Value::Object(map) => FieldValue::Dict(map),
        }
    }
}

/// Coerce `value` to the declared kind of `field` on `schema`
pub(crate) fn coerce(schema: &Schema, field: &FieldDef, value: FieldValue) -> ModelResult<FieldValue> {
    let mismatch = |value: &FieldValue| ModelError::TypeMismatch {
        type_name: schema.type_name.to_string(),
        field: field.name.to_string(),
        expected: field.kind.describe(),
        actual: value.type_name(),
    };

    // Null is accepted for every field
    if value.is_null() {
        return Ok(value);
    }

    match (field.kind, value) {
        (FieldKind::Str, v @ FieldValue::Str(_)) => Ok(v),

        (FieldKind::Int, v @ FieldValue::Int(_)) => Ok(v),
        (FieldKind::Int, FieldValue::Str(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(FieldValue::Int(i)),
            Err(_) => Err(mismatch(&FieldValue::Str(s))),
        },

        (FieldKind::Float, v @ FieldValue::Float(_)) => Ok(v),
        (FieldKind::Float, FieldValue::Int(i)) => Ok(FieldValue::Float(i as f64)),
        (FieldKind::Float, FieldValue::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Ok(FieldValue::Float(f)),
            Err(_) => Err(mismatch(&FieldValue::Str(s))),
        },

        (FieldKind::Bool, v @ FieldValue::Bool(_)) => Ok(v),

        (FieldKind::Dict, v @ FieldValue::Dict(_)) => Ok(v),

        (FieldKind::Expression, v @ FieldValue::Expression(_)) => Ok(v),
        (FieldKind::Expression, FieldValue::Int(i)) => Ok(EvaluableExpression::Int(i).into()),
        (FieldKind::Expression, FieldValue::Float(f)) => Ok(EvaluableExpression::Float(f).into()),
        (FieldKind::Expression, FieldValue::Bool(b)) => Ok(EvaluableExpression::Bool(b).into()),
        (FieldKind::Expression, FieldValue::Str(s)) => Ok(EvaluableExpression::Text(s).into()),
        (FieldKind::Expression, FieldValue::Dict(map)) => {
            Ok(EvaluableExpression::Structured(Value::Object(map)).into())
        }
        (FieldKind::Expression, FieldValue::List(items)) => {
            Ok(EvaluableExpression::Structured(Value::Array(items)).into())
        }

        (FieldKind::Object(nested), FieldValue::Object(obj)) => {
            if obj.schema().same_as(nested) {
                Ok(FieldValue::Object(obj))
            } else {
                Err(mismatch(&FieldValue::Object(obj)))
            }
        }
        (FieldKind::Object(nested), FieldValue::Dict(map)) => {
            Ok(FieldValue::Object(Box::new(object_from_body(nested, None, &map)?)))
        }

        (FieldKind::ObjectList(nested), FieldValue::Objects(objs)) => {
            if objs.iter().all(|o| o.schema().same_as(nested)) {
                Ok(FieldValue::Objects(objs))
            } else {
                Err(mismatch(&FieldValue::Objects(objs)))
            }
        }
        (FieldKind::ObjectList(nested), FieldValue::List(items)) => {
            let mut objs = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    Value::Object(map) => objs.push(object_from_body(nested, None, map)?),
                    _ => return Err(mismatch(&FieldValue::List(items.clone()))),
                }
            }
            Ok(FieldValue::Objects(objs))
        }

        (_, other) => Err(mismatch(&other)),
    }
}
