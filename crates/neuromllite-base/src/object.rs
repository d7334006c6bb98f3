// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Schema-constrained objects.

A [`SchemaObject`] is an instance of a [`Schema`]: an optional id, one slot
per declared field and one ordered [`ChildList`] per declared child
collection. All assignment goes through the schema, so an object can never
hold an undeclared name or a value of the wrong kind.

A field slot distinguishes "never assigned" (omitted on serialization) from
"assigned null" (serialized as `null`). Child collections always exist and
start empty; an empty collection is not serialized.
*/

use serde_json::{Map, Value};
use std::fmt::{self, Write as _};
use std::ops::Deref;

use crate::error::{ModelError, ModelResult};
use crate::expression::EvaluableExpression;
use crate::schema::{ChildDef, FieldKind, Schema};
use crate::serialization::{objects_from_collection, value_to_display};
use crate::value::{coerce, FieldValue};

/// Ordered, id-unique collection of child objects sharing one element schema
#[derive(Debug, Clone)]
pub struct ChildList {
    owner: &'static str,
    def: &'static ChildDef,
    items: Vec<SchemaObject>,
}

impl ChildList {
    fn new(owner: &'static str, def: &'static ChildDef) -> Self {
        Self {
            owner,
            def,
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn element_schema(&self) -> &'static Schema {
        self.def.schema
    }

    /// Append a child, checking its schema and id uniqueness
    pub fn push(&mut self, child: impl Into<SchemaObject>) -> ModelResult<()> {
        let child = child.into();
        if !child.schema.same_as(self.def.schema) {
            return Err(ModelError::TypeMismatch {
                type_name: self.owner.to_string(),
                field: self.def.name.to_string(),
                expected: self.def.schema.type_name.to_string(),
                actual: child.type_name().to_string(),
            });
        }

        if self.def.schema.identified {
            let id = child.id().ok_or_else(|| {
                ModelError::InvalidDocument(format!(
                    "{} added to '{}' of '{}' has no id",
                    child.type_name(),
                    self.def.name,
                    self.owner
                ))
            })?;
            if self.contains(id) {
                return Err(ModelError::DuplicateId {
                    type_name: self.owner.to_string(),
                    collection: self.def.name.to_string(),
                    id: id.to_string(),
                });
            }
        }

        self.items.push(child);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&SchemaObject> {
        self.items.iter().find(|c| c.id() == Some(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SchemaObject> {
        self.items.iter_mut().find(|c| c.id() == Some(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove the child with `id`, keeping the order of the rest
    pub fn remove(&mut self, id: &str) -> Option<SchemaObject> {
        let index = self.items.iter().position(|c| c.id() == Some(id))?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|c| c.id())
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SchemaObject> {
        self.items.iter_mut()
    }

    /// Replace the contents, validating each element in order
    pub fn replace(&mut self, children: Vec<SchemaObject>) -> ModelResult<()> {
        let previous = std::mem::take(&mut self.items);
        for child in children {
            if let Err(err) = self.push(child) {
                self.items = previous;
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Deref for ChildList {
    type Target = [SchemaObject];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl PartialEq for ChildList {
    fn eq(&self, other: &Self) -> bool {
        self.def.name == other.def.name && self.items == other.items
    }
}

impl<'a> IntoIterator for &'a ChildList {
    type Item = &'a SchemaObject;
    type IntoIter = std::slice::Iter<'a, SchemaObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Instance of a [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaObject {
    schema: &'static Schema,
    id: Option<String>,
    values: Vec<Option<FieldValue>>,
    children: Vec<ChildList>,
}

impl SchemaObject {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            id: None,
            values: vec![None; schema.fields.len()],
            children: schema
                .children
                .iter()
                .map(|def| ChildList::new(schema.type_name, def))
                .collect(),
        }
    }

    /// New object with an id; the id is ignored for anonymous schemas
    pub fn with_id(schema: &'static Schema, id: impl Into<String>) -> Self {
        let mut obj = Self::new(schema);
        if schema.identified {
            obj.id = Some(id.into());
        }
        obj
    }

    /// Construct from an id and named field values
    ///
    /// Every name must be a declared field or child collection; the first
    /// unknown name or uncoercible value aborts construction.
    pub fn construct<'a, I, V>(schema: &'static Schema, id: Option<&str>, fields: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<FieldValue>,
    {
        let mut obj = match id {
            Some(id) => Self::with_id(schema, id),
            None => Self::new(schema),
        };
        for (name, value) in fields {
            obj.set_field(name, value)?;
        }
        Ok(obj)
    }

    /// Builder-style assignment
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> ModelResult<Self> {
        self.set_field(name, value)?;
        Ok(self)
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn type_name(&self) -> &'static str {
        self.schema.type_name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Id, or an empty string for anonymous objects
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> ModelResult<()> {
        self.set_field("id", FieldValue::Str(id.into()))
    }

    /// Generic read access by name
    ///
    /// Returns `Ok(None)` for a declared field that was never assigned; child
    /// collections are returned as [`FieldValue::Objects`].
    pub fn get_field(&self, name: &str) -> ModelResult<Option<FieldValue>> {
        if self.schema.identified && name == "id" {
            return Ok(self.id.clone().map(FieldValue::Str));
        }
        if let Some(index) = self.schema.field_index(name) {
            return Ok(self.values[index].clone());
        }
        if let Some(index) = self.schema.child_index(name) {
            return Ok(Some(FieldValue::Objects(self.children[index].items.clone())));
        }
        Err(ModelError::schema_violation(self.schema.type_name, name))
    }

    /// Borrow an assigned field value
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .field_index(name)
            .and_then(|index| self.values[index].as_ref())
    }

    /// Generic write access by name, validated against the schema
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> ModelResult<()> {
        let value = value.into();

        if self.schema.identified && name == "id" {
            self.id = match value {
                FieldValue::Str(id) => Some(id),
                FieldValue::Null => None,
                other => {
                    return Err(ModelError::TypeMismatch {
                        type_name: self.schema.type_name.to_string(),
                        field: "id".to_string(),
                        expected: "str".to_string(),
                        actual: other.type_name(),
                    })
                }
            };
            return Ok(());
        }

        if let Some(index) = self.schema.field_index(name) {
            let coerced = coerce(self.schema, &self.schema.fields[index], value)?;
            self.values[index] = Some(coerced);
            return Ok(());
        }

        if let Some(index) = self.schema.child_index(name) {
            let def = &self.schema.children[index];
            let items = match value {
                FieldValue::Objects(items) => items,
                FieldValue::Object(item) => vec![*item],
                FieldValue::Null => Vec::new(),
                FieldValue::List(items) => objects_from_collection(def.schema, &Value::Array(items))?,
                FieldValue::Dict(map) => objects_from_collection(def.schema, &Value::Object(map))?,
                other => {
                    return Err(ModelError::TypeMismatch {
                        type_name: self.schema.type_name.to_string(),
                        field: name.to_string(),
                        expected: format!("list of {}", def.schema.type_name),
                        actual: other.type_name(),
                    })
                }
            };
            return self.children[index].replace(items);
        }

        Err(ModelError::schema_violation(self.schema.type_name, name))
    }

    /// Forget an assigned value, returning it
    pub fn unset_field(&mut self, name: &str) -> ModelResult<Option<FieldValue>> {
        if self.schema.identified && name == "id" {
            return Ok(self.id.take().map(FieldValue::Str));
        }
        if let Some(index) = self.schema.field_index(name) {
            return Ok(self.values[index].take());
        }
        if let Some(index) = self.schema.child_index(name) {
            let items = std::mem::take(&mut self.children[index].items);
            return Ok(Some(FieldValue::Objects(items)));
        }
        Err(ModelError::schema_violation(self.schema.type_name, name))
    }

    /// True if `name` holds an assigned value or a non-empty collection
    pub fn is_set(&self, name: &str) -> bool {
        if self.schema.identified && name == "id" {
            return self.id.is_some();
        }
        if let Some(index) = self.schema.field_index(name) {
            return self.values[index].is_some();
        }
        self.schema
            .child_index(name)
            .map_or(false, |index| !self.children[index].is_empty())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(FieldValue::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(FieldValue::as_bool)
    }

    pub fn get_dict(&self, name: &str) -> Option<&Map<String, Value>> {
        self.field(name).and_then(FieldValue::as_dict)
    }

    pub fn get_object(&self, name: &str) -> Option<&SchemaObject> {
        self.field(name).and_then(FieldValue::as_object)
    }

    pub fn get_objects(&self, name: &str) -> Option<&[SchemaObject]> {
        self.field(name).and_then(FieldValue::as_objects)
    }

    pub fn get_expression(&self, name: &str) -> Option<&EvaluableExpression> {
        self.field(name).and_then(FieldValue::as_expression)
    }

    /// Mutable access to a nested object field, for in-place edits
    pub fn get_object_mut(&mut self, name: &str) -> Option<&mut SchemaObject> {
        let index = self.schema.field_index(name)?;
        match self.values[index].as_mut() {
            Some(FieldValue::Object(obj)) => Some(&mut **obj),
            _ => None,
        }
    }

    pub fn children(&self, collection: &str) -> ModelResult<&ChildList> {
        self.schema
            .child_index(collection)
            .map(|index| &self.children[index])
            .ok_or_else(|| ModelError::schema_violation(self.schema.type_name, collection))
    }

    pub fn children_mut(&mut self, collection: &str) -> ModelResult<&mut ChildList> {
        match self.schema.child_index(collection) {
            Some(index) => Ok(&mut self.children[index]),
            None => Err(ModelError::schema_violation(self.schema.type_name, collection)),
        }
    }

    pub fn add_child(&mut self, collection: &str, child: impl Into<SchemaObject>) -> ModelResult<()> {
        self.children_mut(collection)?.push(child)
    }

    /// Elements of a collection; empty for undeclared names
    pub fn collection(&self, name: &str) -> &[SchemaObject] {
        match self.schema.child_index(name) {
            Some(index) => &self.children[index].items,
            None => &[],
        }
    }

    /// Look up a child by id in the named collection
    pub fn get_child(&self, id: &str, collection: &str) -> Option<&SchemaObject> {
        self.children(collection).ok().and_then(|list| list.get(id))
    }

    /// All child collections in declaration order
    pub fn child_lists(&self) -> &[ChildList] {
        &self.children
    }

    /// Assigned fields in declaration order
    pub fn assigned_fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> + '_ {
        self.schema
            .fields
            .iter()
            .zip(self.values.iter())
            .filter_map(|(def, value)| value.as_ref().map(|v| (def.name, v)))
    }

    /// Human readable description
    ///
    /// Level 0 renders assigned values and children. Level 1 also documents
    /// the declared fields and child collections; level 2 and above recurse
    /// that documentation into nested schemas.
    pub fn info(&self, level: usize) -> String {
        let mut out = String::new();
        self.write_info(&mut out, 0);
        if level >= 1 {
            out.push('\n');
            write_schema_doc(&mut out, self.schema, 0, level);
        }
        out
    }

    fn write_info(&self, out: &mut String, depth: usize) {
        let pad = "    ".repeat(depth);
        match &self.id {
            Some(id) => {
                let _ = writeln!(out, "{}{}: {}", pad, self.schema.type_name, id);
            }
            None => {
                let _ = writeln!(out, "{}{}", pad, self.schema.type_name);
            }
        }

        for (name, value) in self.assigned_fields() {
            match value {
                FieldValue::Object(obj) => {
                    let _ = writeln!(out, "{}    {}:", pad, name);
                    obj.write_info(out, depth + 2);
                }
                FieldValue::Objects(objs) => {
                    let _ = writeln!(out, "{}    {} ({}):", pad, name, objs.len());
                    for obj in objs {
                        obj.write_info(out, depth + 2);
                    }
                }
                other => {
                    let _ = writeln!(out, "{}    {} = {}", pad, name, value_to_display(other));
                }
            }
        }

        for list in self.children.iter().filter(|list| !list.is_empty()) {
            let _ = writeln!(out, "{}    {} ({}):", pad, list.name(), list.len());
            for child in list {
                child.write_info(out, depth + 2);
            }
        }
    }
}

fn write_schema_doc(out: &mut String, schema: &'static Schema, depth: usize, level: usize) {
    let pad = "    ".repeat(depth);
    let _ = writeln!(out, "{}{}: {}", pad, schema.type_name, schema.definition);
    if schema.identified {
        let _ = writeln!(out, "{}    id (str): Unique identifier", pad);
    }
    for def in schema.fields {
        let _ = writeln!(out, "{}    {} ({}): {}", pad, def.name, def.kind.describe(), def.description);
        if level >= 2 {
            if let FieldKind::Object(nested) | FieldKind::ObjectList(nested) = def.kind {
                write_schema_doc(out, nested, depth + 2, level);
            }
        }
    }
    for def in schema.children {
        let _ = writeln!(
            out,
            "{}    {} (list of {}): {}",
            pad, def.name, def.schema.type_name, def.description
        );
        if level >= 2 && !std::ptr::eq(def.schema, schema) {
            write_schema_doc(out, def.schema, depth + 2, level);
        }
    }
}

impl PartialEq for SchemaObject {
    fn eq(&self, other: &Self) -> bool {
        self.schema.same_as(other.schema)
            && self.id == other.id
            && self.values == other.values
            && self.children == other.children
    }
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info(0))
    }
}
