// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error handling for the schema-constrained object model.
*/

use thiserror::Error;

/// Result type for object model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for object model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A field or child collection name that the schema does not declare
    #[error("'{type_name}' has no field or child collection named '{name}'")]
    SchemaViolation { type_name: String, name: String },

    /// A value that cannot be coerced to the declared field type
    #[error("Field '{field}' of '{type_name}' expects {expected}, got {actual}")]
    TypeMismatch {
        type_name: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// Two entities with the same id in one child collection
    #[error("'{type_name}' already contains an entry '{id}' in '{collection}'")]
    DuplicateId {
        type_name: String,
        collection: String,
        id: String,
    },

    /// An expression that could not be parsed or evaluated
    #[error("Cannot evaluate '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Structured input whose shape does not describe an object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl ModelError {
    pub(crate) fn schema_violation(type_name: &str, name: &str) -> Self {
        ModelError::SchemaViolation {
            type_name: type_name.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn evaluation(expression: &str, reason: impl Into<String>) -> Self {
        ModelError::Evaluation {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

// Convert from serde_json::Error
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Json(err.to_string())
    }
}

// Convert from serde_yaml::Error
impl From<serde_yaml::Error> for ModelError {
    fn from(err: serde_yaml::Error) -> Self {
        ModelError::Yaml(err.to_string())
    }
}

// Convert from bincode::Error
impl From<bincode::Error> for ModelError {
    fn from(err: bincode::Error) -> Self {
        ModelError::Snapshot(err.to_string())
    }
}

// Convert from std::io::Error
impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}
