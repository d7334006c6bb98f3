// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Typed wrappers over [`SchemaObject`].

[`schema_type!`](crate::schema_type) declares a newtype bound to one static
schema. The wrapper derefs to the underlying object, so the generic field
API stays available, and adds typed persistence through [`SchemaType`].

```rust
use neuromllite_base::{schema_type, FieldDef, FieldKind, Schema, SchemaType};

static CELL: Schema = Schema {
    type_name: "Cell",
    definition: "A cell",
    identified: true,
    fields: &[FieldDef::new("source", "Source file", FieldKind::Str)],
    children: &[],
};

schema_type! {
    /// A cell definition
    pub struct Cell: CELL, id;
}

let cell = Cell::new("hh").with("source", "hh.cell.nml").unwrap();
let text = cell.to_json(0).unwrap();
assert_eq!(text, r#"{"hh":{"source":"hh.cell.nml"}}"#);
assert_eq!(Cell::from_json(&text).unwrap(), cell);
```
*/

use crate::error::ModelResult;
use crate::object::SchemaObject;
use crate::schema::Schema;
use crate::{serialization, snapshot};

/// A newtype bound to one static schema
pub trait SchemaType: Sized + Into<SchemaObject> {
    fn schema() -> &'static Schema;

    /// Wrap an object, checking that it was built from [`Self::schema`]
    fn from_object(obj: SchemaObject) -> ModelResult<Self>;

    fn as_object(&self) -> &SchemaObject;

    fn to_json(&self, indent: usize) -> ModelResult<String> {
        serialization::to_json(self.as_object(), indent)
    }

    fn to_yaml(&self) -> ModelResult<String> {
        serialization::to_yaml(self.as_object())
    }

    fn from_json(text: &str) -> ModelResult<Self> {
        Self::from_object(serialization::from_json(text, Self::schema())?)
    }

    fn from_yaml(text: &str) -> ModelResult<Self> {
        Self::from_object(serialization::from_yaml(text, Self::schema())?)
    }

    fn snapshot(&self) -> ModelResult<Vec<u8>> {
        snapshot::snapshot(self.as_object())
    }

    fn restore(bytes: &[u8]) -> ModelResult<Self> {
        Self::from_object(snapshot::restore(bytes, Self::schema())?)
    }
}

/// Declare a typed wrapper around [`SchemaObject`] for a static schema
///
/// `struct Name: SCHEMA, id;` declares an identified type with `new(id)`;
/// `struct Name: SCHEMA;` declares an anonymous type with `new()`.
#[macro_export]
macro_rules! schema_type {
    (@common $(#[$meta:meta])* $vis:vis struct $name:ident : $schema:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name($crate::SchemaObject);

        impl $name {
            /// Builder-style assignment keeping the wrapper type
            pub fn with(
                self,
                name: &str,
                value: impl Into<$crate::FieldValue>,
            ) -> $crate::ModelResult<Self> {
                self.0.with(name, value).map($name)
            }

            pub fn into_inner(self) -> $crate::SchemaObject {
                self.0
            }
        }

        impl $crate::SchemaType for $name {
            fn schema() -> &'static $crate::Schema {
                &$schema
            }

            fn from_object(obj: $crate::SchemaObject) -> $crate::ModelResult<Self> {
                if obj.schema().same_as(&$schema) {
                    Ok($name(obj))
                } else {
                    Err($crate::ModelError::TypeMismatch {
                        type_name: $schema.type_name.to_string(),
                        field: "self".to_string(),
                        expected: $schema.type_name.to_string(),
                        actual: obj.type_name().to_string(),
                    })
                }
            }

            fn as_object(&self) -> &$crate::SchemaObject {
                &self.0
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::SchemaObject;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$name> for $crate::SchemaObject {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<$name> for $crate::FieldValue {
            fn from(value: $name) -> Self {
                $crate::FieldValue::Object(Box::new(value.0))
            }
        }

        impl ::std::convert::TryFrom<$crate::SchemaObject> for $name {
            type Error = $crate::ModelError;

            fn try_from(obj: $crate::SchemaObject) -> Result<Self, Self::Error> {
                <$name as $crate::SchemaType>::from_object(obj)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };

    ($(#[$meta:meta])* $vis:vis struct $name:ident : $schema:path, id;) => {
        $crate::schema_type!(@common $(#[$meta])* $vis struct $name : $schema);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name($crate::SchemaObject::with_id(&$schema, id))
            }
        }
    };

    ($(#[$meta:meta])* $vis:vis struct $name:ident : $schema:path;) => {
        $crate::schema_type!(@common $(#[$meta])* $vis struct $name : $schema);

        impl $name {
            pub fn new() -> Self {
                $name($crate::SchemaObject::new(&$schema))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };

}
