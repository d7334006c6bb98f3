// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
JSON and YAML persistence of schema objects.

## Document shape

An identified object is written as a single-entry mapping from its id to its
body; an anonymous object is written as its body alone. A body lists the
assigned fields in declaration order, then every non-empty child collection
in declaration order:

```json
{
    "net0": {
        "parameters": {"N": 10},
        "populations": {
            "pop0": {"size": 5, "component": "iaf"}
        }
    }
}
```

Collections of identified elements are id-keyed mappings; collections of
anonymous elements are sequences. On input, sequences of bodies carrying an
`id` key are accepted as well. Unknown keys anywhere in the document fail
with [`ModelError::SchemaViolation`].
*/

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::object::SchemaObject;
use crate::schema::Schema;
use crate::value::FieldValue;

/// Supported structured text encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    Json,
    Yaml,
}

impl StructuredFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StructuredFormat::Json => "json",
            StructuredFormat::Yaml => "yaml",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for StructuredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StructuredFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StructuredFormat::Json),
            "yaml" | "yml" => Ok(StructuredFormat::Yaml),
            other => Err(ModelError::InvalidDocument(format!(
                "unknown structured format '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// Object -> Value
// ============================================================================

/// The document form of an object: `{id: body}` or the bare body
pub fn to_value(obj: &SchemaObject) -> ModelResult<Value> {
    let body = Value::Object(body_to_map(obj)?);
    if obj.schema().identified {
        let id = require_id(obj)?;
        let mut doc = Map::new();
        doc.insert(id.to_string(), body);
        Ok(Value::Object(doc))
    } else {
        Ok(body)
    }
}

fn require_id(obj: &SchemaObject) -> ModelResult<&str> {
    obj.id().ok_or_else(|| {
        ModelError::InvalidDocument(format!("{} has no id and cannot be serialized", obj.type_name()))
    })
}

fn body_to_map(obj: &SchemaObject) -> ModelResult<Map<String, Value>> {
    let mut body = Map::new();

    for (name, value) in obj.assigned_fields() {
        body.insert(name.to_string(), field_to_value(value)?);
    }

    for list in obj.child_lists().iter().filter(|list| !list.is_empty()) {
        let collection = if list.element_schema().identified {
            let mut keyed = Map::new();
            for child in list {
                keyed.insert(require_id(child)?.to_string(), Value::Object(body_to_map(child)?));
            }
            Value::Object(keyed)
        } else {
            Value::Array(
                list.iter()
                    .map(|child| body_to_map(child).map(Value::Object))
                    .collect::<ModelResult<Vec<_>>>()?,
            )
        };
        body.insert(list.name().to_string(), collection);
    }

    Ok(body)
}

/// Nested object fields carry their id inside the body
fn nested_to_value(obj: &SchemaObject) -> ModelResult<Value> {
    let mut body = Map::new();
    if let Some(id) = obj.id() {
        body.insert("id".to_string(), Value::String(id.to_string()));
    }
    body.extend(body_to_map(obj)?);
    Ok(Value::Object(body))
}

fn field_to_value(value: &FieldValue) -> ModelResult<Value> {
    Ok(match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(i) => Value::from(*i),
        FieldValue::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        FieldValue::Str(s) => Value::String(s.clone()),
        FieldValue::Dict(map) => Value::Object(map.clone()),
        FieldValue::List(items) => Value::Array(items.clone()),
        FieldValue::Expression(expr) => expr.to_json(),
        FieldValue::Object(obj) => nested_to_value(obj)?,
        FieldValue::Objects(objs) => Value::Array(
            objs.iter()
                .map(nested_to_value)
                .collect::<ModelResult<Vec<_>>>()?,
        ),
    })
}

/// Single-line rendering of a scalar or compound value for `info` output
pub(crate) fn value_to_display(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "null".to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => format!("{:?}", f),
        FieldValue::Str(s) => s.clone(),
        FieldValue::Dict(map) => Value::Object(map.clone()).to_string(),
        FieldValue::List(items) => Value::Array(items.clone()).to_string(),
        FieldValue::Expression(expr) => expr.to_string(),
        other => field_to_value(other)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| other.type_name()),
    }
}

// ============================================================================
// Value -> Object
// ============================================================================

/// Rebuild an object of `schema` from its document form
pub fn from_value(value: &Value, schema: &'static Schema) -> ModelResult<SchemaObject> {
    let map = value.as_object().ok_or_else(|| {
        ModelError::InvalidDocument(format!(
            "expected a mapping describing {}, found {}",
            schema.type_name,
            json_type(value)
        ))
    })?;

    if schema.identified && map.len() == 1 {
        if let Some((key, body)) = map.iter().next() {
            let as_id = match body {
                Value::Object(body) => Some(object_from_body(schema, Some(key), body)),
                Value::Null => Some(object_from_body(schema, Some(key), &Map::new())),
                _ => None,
            };
            match as_id {
                // an id that is also a declared name falls back to the body form
                Some(Err(_)) if schema.allows(key) => {}
                Some(result) => return result,
                None if !schema.allows(key) => {
                    return Err(ModelError::InvalidDocument(format!(
                        "body of {} '{}' must be a mapping, found {}",
                        schema.type_name,
                        key,
                        json_type(body)
                    )))
                }
                None => {}
            }
        }
    }

    object_from_body(schema, None, map)
}

/// Build an object from a body mapping, validating every key
pub(crate) fn object_from_body(
    schema: &'static Schema,
    id: Option<&str>,
    body: &Map<String, Value>,
) -> ModelResult<SchemaObject> {
    let mut obj = match id {
        Some(id) => SchemaObject::with_id(schema, id),
        None => SchemaObject::new(schema),
    };

    for (key, value) in body {
        if key == "id" && schema.identified {
            let id = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(ModelError::InvalidDocument(format!(
                        "id of {} must be a string, found {}",
                        schema.type_name,
                        json_type(other)
                    )))
                }
            };
            obj.set_id(id)?;
            continue;
        }
        obj.set_field(key, FieldValue::from(value.clone()))?;
    }

    Ok(obj)
}

/// Build the elements of a child collection from either accepted form
pub(crate) fn objects_from_collection(
    schema: &'static Schema,
    value: &Value,
) -> ModelResult<Vec<SchemaObject>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(keyed) if schema.identified => keyed
            .iter()
            .map(|(id, body)| match body {
                Value::Object(body) => object_from_body(schema, Some(id), body),
                Value::Null => object_from_body(schema, Some(id), &Map::new()),
                other => Err(ModelError::InvalidDocument(format!(
                    "body of {} '{}' must be a mapping, found {}",
                    schema.type_name,
                    id,
                    json_type(other)
                ))),
            })
            .collect(),
        Value::Array(items) => items.iter().map(|item| from_value(item, schema)).collect(),
        other => Err(ModelError::InvalidDocument(format!(
            "collection of {} must be a {}, found {}",
            schema.type_name,
            if schema.identified { "mapping or sequence" } else { "sequence" },
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

// ============================================================================
// Text encodings
// ============================================================================

/// JSON text; `indent` spaces per level, 0 for compact output
pub fn to_json(obj: &SchemaObject, indent: usize) -> ModelResult<String> {
    let value = to_value(obj)?;
    if indent == 0 {
        return Ok(serde_json::to_string(&value)?);
    }

    let spaces = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&spaces);
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| ModelError::Json(e.to_string()))
}

pub fn to_yaml(obj: &SchemaObject) -> ModelResult<String> {
    Ok(serde_yaml::to_string(&to_value(obj)?)?)
}

/// Encode in the requested format; `indent` applies to JSON only
pub fn to_structured_text(
    obj: &SchemaObject,
    format: StructuredFormat,
    indent: usize,
) -> ModelResult<String> {
    match format {
        StructuredFormat::Json => to_json(obj, indent),
        StructuredFormat::Yaml => to_yaml(obj),
    }
}

/// Parse text and rebuild an object of `schema`
pub fn from_structured_text(
    text: &str,
    format: StructuredFormat,
    schema: &'static Schema,
) -> ModelResult<SchemaObject> {
    let value: Value = match format {
        StructuredFormat::Json => serde_json::from_str(text)?,
        StructuredFormat::Yaml => serde_yaml::from_str(text)?,
    };
    from_value(&value, schema)
}

pub fn from_json(text: &str, schema: &'static Schema) -> ModelResult<SchemaObject> {
    from_structured_text(text, StructuredFormat::Json, schema)
}

pub fn from_yaml(text: &str, schema: &'static Schema) -> ModelResult<SchemaObject> {
    from_structured_text(text, StructuredFormat::Yaml, schema)
}

// ============================================================================
// Files
// ============================================================================

fn default_file_name(obj: &SchemaObject, format: StructuredFormat) -> ModelResult<PathBuf> {
    let id = require_id(obj)?;
    Ok(PathBuf::from(format!("{}.{}", id, format.extension())))
}

fn write_text(path: &Path, text: &str) -> ModelResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

/// Write JSON to `path`, or to `<id>.json` in the working directory
pub fn to_json_file(obj: &SchemaObject, path: Option<&Path>, indent: usize) -> ModelResult<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_file_name(obj, StructuredFormat::Json)?,
    };
    write_text(&path, &to_json(obj, indent)?)?;
    debug!(target: "neuromllite-base", "Wrote {} '{}' to {}", obj.type_name(), obj.id_or_empty(), path.display());
    Ok(path)
}

/// Write YAML to `path`, or to `<id>.yaml` in the working directory
pub fn to_yaml_file(obj: &SchemaObject, path: Option<&Path>) -> ModelResult<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_file_name(obj, StructuredFormat::Yaml)?,
    };
    write_text(&path, &to_yaml(obj)?)?;
    debug!(target: "neuromllite-base", "Wrote {} '{}' to {}", obj.type_name(), obj.id_or_empty(), path.display());
    Ok(path)
}

pub fn load_json_file(path: &Path, schema: &'static Schema) -> ModelResult<SchemaObject> {
    let text = fs::read_to_string(path)?;
    debug!(target: "neuromllite-base", "Loaded {} from {}", schema.type_name, path.display());
    from_json(&text, schema)
}

pub fn load_yaml_file(path: &Path, schema: &'static Schema) -> ModelResult<SchemaObject> {
    let text = fs::read_to_string(path)?;
    debug!(target: "neuromllite-base", "Loaded {} from {}", schema.type_name, path.display());
    from_yaml(&text, schema)
}
