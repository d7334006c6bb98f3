// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Static schema descriptors.

Every concrete entity type declares one [`Schema`] at definition time: an
ordered table of allowed fields and allowed child collections. Declaration
order is significant, it fixes the order of serialized keys and of the
`info` rendering.

```rust
use neuromllite_base::{ChildDef, FieldDef, FieldKind, Schema};

static LEAF: Schema = Schema {
    type_name: "Leaf",
    definition: "A leaf",
    identified: true,
    fields: &[FieldDef::new("weight", "Leaf weight", FieldKind::Float)],
    children: &[],
};

static TREE: Schema = Schema {
    type_name: "Tree",
    definition: "A tree",
    identified: true,
    fields: &[FieldDef::new("age", "Age in years", FieldKind::Int)],
    children: &[ChildDef::new("leaves", "The leaves", &LEAF)],
};

assert_eq!(TREE.field_index("age"), Some(0));
assert!(TREE.child_index("leaves").is_some());
```
*/

use std::fmt;

/// Declared type of a field
#[derive(Clone, Copy)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
    /// Free-form mapping (JSON object)
    Dict,
    /// Literal value or parametric expression, see [`crate::EvaluableExpression`]
    Expression,
    /// A single nested schema object
    Object(&'static Schema),
    /// A list of nested schema objects
    ObjectList(&'static Schema),
}

impl FieldKind {
    /// Human readable type name used in errors and `info` output
    pub fn describe(&self) -> String {
        match self {
            FieldKind::Str => "str".to_string(),
            FieldKind::Int => "int".to_string(),
            FieldKind::Float => "float".to_string(),
            FieldKind::Bool => "bool".to_string(),
            FieldKind::Dict => "dict".to_string(),
            FieldKind::Expression => "EvaluableExpression".to_string(),
            FieldKind::Object(schema) => schema.type_name.to_string(),
            FieldKind::ObjectList(schema) => format!("list of {}", schema.type_name),
        }
    }

    /// Nested schema, if this kind holds schema objects
    pub fn nested_schema(&self) -> Option<&'static Schema> {
        match self {
            FieldKind::Object(schema) | FieldKind::ObjectList(schema) => Some(schema),
            _ => None,
        }
    }
}

// Nested schemas are printed by name only
impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldKind({})", self.describe())
    }
}

/// One allowed field: name, description and expected type
#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(name: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description,
            kind,
        }
    }
}

/// One allowed child collection: name, description and element schema
pub struct ChildDef {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: &'static Schema,
}

impl ChildDef {
    pub const fn new(name: &'static str, description: &'static str, schema: &'static Schema) -> Self {
        Self {
            name,
            description,
            schema,
        }
    }
}

impl fmt::Debug for ChildDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildDef")
            .field("name", &self.name)
            .field("schema", &self.schema.type_name)
            .finish()
    }
}

/// Schema of one concrete entity type
#[derive(Debug)]
pub struct Schema {
    /// Type name reported in errors, `info` output and snapshots
    pub type_name: &'static str,
    /// One-line definition of the entity
    pub definition: &'static str,
    /// Identified entities carry an `id` (unique within their collection) and
    /// serialize keyed by it
    pub identified: bool,
    pub fields: &'static [FieldDef],
    pub children: &'static [ChildDef],
}

impl Schema {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&'static ChildDef> {
        self.children.iter().find(|c| c.name == name)
    }

    /// True if `name` is a declared field, child collection, or the `id` of
    /// an identified schema
    pub fn allows(&self, name: &str) -> bool {
        (self.identified && name == "id")
            || self.field_index(name).is_some()
            || self.child_index(name).is_some()
    }

    /// Schemas are singletons; the name comparison covers copies in tests
    pub fn same_as(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other) || self.type_name == other.type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: Schema = Schema {
        type_name: "Inner",
        definition: "Inner descriptor",
        identified: false,
        fields: &[FieldDef::new("x", "X", FieldKind::Float)],
        children: &[],
    };

    static OUTER: Schema = Schema {
        type_name: "Outer",
        definition: "Outer entity",
        identified: true,
        fields: &[
            FieldDef::new("inner", "Nested", FieldKind::Object(&INNER)),
            FieldDef::new("many", "Nested list", FieldKind::ObjectList(&INNER)),
        ],
        children: &[ChildDef::new("items", "Items", &INNER)],
    };

    #[test]
    fn test_lookup_follows_declaration_order() {
        assert_eq!(OUTER.field_index("inner"), Some(0));
        assert_eq!(OUTER.field_index("many"), Some(1));
        assert_eq!(OUTER.child_index("items"), Some(0));
        assert!(OUTER.field("items").is_none());
    }

    #[test]
    fn test_allows_id_only_when_identified() {
        assert!(OUTER.allows("id"));
        assert!(!INNER.allows("id"));
        assert!(!OUTER.allows("notcells"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(FieldKind::Object(&INNER).describe(), "Inner");
        assert_eq!(FieldKind::ObjectList(&INNER).describe(), "list of Inner");
        assert!(OUTER.same_as(&OUTER));
        assert!(!OUTER.same_as(&INNER));
    }
}
