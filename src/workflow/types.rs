// SPDX-License-Identifier: MIT

//! Workflow document types
//!
//! These are the declarative records a session starts from. Type tags are
//! kept as raw strings here; the loader resolves them against the registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(&self, origin: Position) -> Position {
        Position::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Node payload: a display label plus any type-specific keys
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeData {
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A node record in a workflow document
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub data: NodeData,
}

/// An edge record in a workflow document
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// Top-level workflow document
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}
