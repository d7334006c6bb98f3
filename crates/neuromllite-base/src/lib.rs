// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# NeuroMLlite Object Model

Schema-constrained, self-describing objects with lossless persistence:

- **Schemas** (`schema`) - static per-type tables of allowed fields and child collections
- **Objects** (`object`) - validated generic field access, ordered id-unique children, `info`
- **Values** (`value`) - the tagged value holder and its coercion rules
- **Serialization** (`serialization`) - JSON and YAML documents with a round-trip guarantee
- **Snapshots** (`snapshot`) - bincode-encoded copies for in-process transfer
- **Expressions** (`expression`) - parametric values evaluated against network parameters

## Round-trip law

For every valid object `o` and both text formats,
`from_structured_text(to_structured_text(o)) == o` under structural equality.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod error;
pub mod expression;
pub mod macros;
pub mod object;
pub mod schema;
pub mod serialization;
pub mod snapshot;
pub mod value;

pub use error::{ModelError, ModelResult};
pub use expression::{evaluate, EvaluableExpression, EvaluatedValue, Parameters};
pub use macros::SchemaType;
pub use object::{ChildList, SchemaObject};
pub use schema::{ChildDef, FieldDef, FieldKind, Schema};
pub use serialization::{
    from_json, from_structured_text, from_value, from_yaml, load_json_file, load_yaml_file,
    to_json, to_json_file, to_structured_text, to_value, to_yaml, to_yaml_file, StructuredFormat,
};
pub use snapshot::{restore, snapshot};
pub use value::FieldValue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
