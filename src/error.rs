// SPDX-License-Identifier: MIT

//! Typed error handling for workflow-canvas
//!
//! Load-time failures (`DocumentError`) abort the whole session start.
//! Store failures (`StoreError`) are recoverable: the mutation does not
//! apply and the session carries on.

use std::fmt;
use thiserror::Error;

/// Top-level error type for workflow-canvas
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The workflow document could not be turned into a graph
    #[error("Malformed workflow document: {0}")]
    MalformedDocument(#[from] DocumentError),

    /// A graph store mutation was refused
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration errors (invalid env values, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl CanvasError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Which kind of document record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Node,
    Edge,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Node => write!(f, "node"),
            RecordKind::Edge => write!(f, "edge"),
        }
    }
}

/// A record used a type tag the registry does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {record_kind} type '{tag}' on record '{record_id}'")]
pub struct UnknownTypeError {
    pub record_kind: RecordKind,
    pub record_id: String,
    pub tag: String,
}

/// Reasons a workflow document is rejected by the loader
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(String),

    /// An edge endpoint names a node that was not declared
    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownEndpoint { edge_id: String, node_id: String },
}

/// Why the connection validator refused a candidate edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("source node does not exist")]
    UnknownSource,
    #[error("target node does not exist")]
    UnknownTarget,
    #[error("self-loops are not allowed")]
    SelfLoop,
    #[error("an edge between these nodes already exists")]
    ParallelEdge,
}

/// Graph store mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: RecordKind, id: String },

    #[error("No {kind} with id '{id}'")]
    NotFound { kind: RecordKind, id: String },

    #[error("Invalid connection {source_node} -> {target_node}: {reason}")]
    InvalidConnection {
        source_node: String,
        target_node: String,
        reason: Rejection,
    },
}

impl StoreError {
    pub fn duplicate(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind,
            id: id.into(),
        }
    }

    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}
