// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error types for network generation and export.
*/

use neuromllite_base::ModelError;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors raised while resolving, traversing or exporting a network
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A named cross-reference that does not resolve within the network
    #[error("{kind} '{name}' referenced by '{owner}' not found in the network")]
    Reference {
        kind: String,
        name: String,
        owner: String,
    },

    #[error("{type_name} '{id}' is missing required field '{field}'")]
    MissingField {
        type_name: String,
        id: String,
        field: String,
    },

    #[error("Invalid value for '{field}' of '{id}': {reason}")]
    InvalidValue {
        id: String,
        field: String,
        reason: String,
    },

    /// Failure raised by a handler callback; aborts traversal
    #[error("Handler error: {0}")]
    Handler(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl NetworkError {
    pub(crate) fn reference(kind: &str, name: &str, owner: &str) -> Self {
        NetworkError::Reference {
            kind: kind.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
        }
    }

    pub(crate) fn missing(type_name: &str, id: &str, field: &str) -> Self {
        NetworkError::MissingField {
            type_name: type_name.to_string(),
            id: id.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(id: &str, field: &str, reason: impl Into<String>) -> Self {
        NetworkError::InvalidValue {
            id: id.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// Handlers that produce JSON manifests
impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::Handler(err.to_string())
    }
}
