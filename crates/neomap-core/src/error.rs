// Dweve Neomap - Object-Graph Mapping for Property Graphs
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for mapping, reconstruction and persistence.

use thiserror::Error;

/// Error returned by an execution collaborator (driver, session, store).
///
/// The merge-save engine wraps it into [`OgmError::Persistence`] together
/// with the entity that was being written.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutionError {
    /// Human-readable failure description.
    pub message: String,
    /// Underlying cause, if the collaborator has one.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutionError {
    /// Create an execution error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an execution error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Error type for all object-graph mapping operations.
#[derive(Debug, Error)]
pub enum OgmError {
    /// No schema is registered for the requested type.
    #[error("no schema registered for type '{0}'")]
    SchemaNotFound(String),

    /// A type description cannot be turned into an unambiguous schema.
    #[error("conflicting schema for type '{type_name}': {reason}")]
    SchemaConflict {
        /// The type whose derivation failed.
        type_name: String,
        /// What is conflicting.
        reason: String,
    },

    /// More than one schema matches a node's labels with equal specificity.
    #[error("labels {labels:?} match several types equally well: {candidates:?}")]
    AmbiguousType {
        /// The node labels being resolved.
        labels: Vec<String>,
        /// The equally specific candidate types.
        candidates: Vec<String>,
    },

    /// A record or an entity cannot be mapped.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// An attribute value cannot be converted.
    #[error("cannot convert attribute '{attribute}': {reason}")]
    Conversion {
        /// The attribute or property name.
        attribute: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// The stored version no longer matches the expected version.
    #[error(
        "stale state for {type_name} {id}: expected {}",
        .expected.map_or_else(|| "no version".to_string(), |v| format!("version {v}"))
    )]
    StaleState {
        /// The entity type.
        type_name: String,
        /// The entity identity, rendered for display.
        id: String,
        /// The version the save expected to find in the store; `None` when
        /// it expected the node to carry no version yet.
        expected: Option<i64>,
    },

    /// The execution collaborator failed while writing an entity.
    #[error("failed to persist {entity}: {source}")]
    Persistence {
        /// Description of the entity or relationship being written.
        entity: String,
        /// The underlying execution failure.
        #[source]
        source: ExecutionError,
    },

    /// A label, relationship type or property key that cannot be stored.
    #[error("invalid Cypher identifier: '{0}'")]
    InvalidIdentifier(String),

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl OgmError {
    /// Create a schema conflict error.
    pub fn conflict(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaConflict {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an execution failure with the entity being written.
    pub fn persistence(entity: impl Into<String>, source: ExecutionError) -> Self {
        Self::Persistence {
            entity: entity.into(),
            source,
        }
    }

    /// Returns true for errors raised while deriving or resolving schemas.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaNotFound(_)
                | Self::SchemaConflict { .. }
                | Self::AmbiguousType { .. }
                | Self::InvalidIdentifier(_)
        )
    }
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, OgmError>;
