// SPDX-License-Identifier: MIT

//! Node/edge type registry
//!
//! The set of node and edge type tags is closed (`NodeType`, `EdgeType`).
//! What stays open is the renderer bound to each tag: a host may swap the
//! component that draws a given type without touching graph semantics.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of processing step a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Module,
    Function,
    If,
    Idle,
    Tool,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Module,
        NodeType::Function,
        NodeType::If,
        NodeType::Idle,
        NodeType::Tool,
    ];

    /// The tag used for this type in workflow documents
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Module => "module",
            NodeType::Function => "function",
            NodeType::If => "if",
            NodeType::Idle => "idle",
            NodeType::Tool => "tool",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown node type: {}", s))
    }
}

/// Visual variant of an edge. Has no effect on graph semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum EdgeType {
    AnimatedGradient,
    #[default]
    Bezier,
}

impl EdgeType {
    pub const ALL: [EdgeType; 2] = [EdgeType::AnimatedGradient, EdgeType::Bezier];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::AnimatedGradient => "animatedGradient",
            EdgeType::Bezier => "bezier",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown edge type: {}", s))
    }
}

/// Rendering contract for a node type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRenderer {
    pub node_type: NodeType,
    /// Name of the UI component that draws the node
    pub component: String,
    /// Whether the node exposes separate true/false output handles
    pub branching: bool,
}

/// Rendering contract for an edge type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRenderer {
    pub edge_type: EdgeType,
    pub component: String,
}

/// Maps type tags to their renderer capabilities
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    nodes: HashMap<NodeType, NodeRenderer>,
    edges: HashMap<EdgeType, EdgeRenderer>,
}

static DEFAULT_REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

impl TypeRegistry {
    /// Create a registry with the built-in renderer for every known tag
    pub fn new() -> Self {
        let nodes = NodeType::ALL
            .into_iter()
            .map(|t| {
                let component = match t {
                    NodeType::Module => "ModuleNode",
                    NodeType::Function => "FunctionNode",
                    NodeType::If => "IfNode",
                    NodeType::Idle => "IdleNode",
                    NodeType::Tool => "ToolNode",
                };
                (
                    t,
                    NodeRenderer {
                        node_type: t,
                        component: component.to_string(),
                        branching: t == NodeType::If,
                    },
                )
            })
            .collect();

        let edges = EdgeType::ALL
            .into_iter()
            .map(|t| {
                let component = match t {
                    EdgeType::AnimatedGradient => "AnimatedGradientEdge",
                    EdgeType::Bezier => "BezierEdge",
                };
                (
                    t,
                    EdgeRenderer {
                        edge_type: t,
                        component: component.to_string(),
                    },
                )
            })
            .collect();

        Self { nodes, edges }
    }

    /// Shared registry with the built-in renderers
    pub fn global() -> &'static TypeRegistry {
        &DEFAULT_REGISTRY
    }

    /// Look up the renderer for a node type tag
    pub fn resolve_node_renderer(&self, tag: &str) -> Option<&NodeRenderer> {
        let node_type = tag.parse::<NodeType>().ok()?;
        self.nodes.get(&node_type)
    }

    /// Look up the renderer for an edge type tag
    pub fn resolve_edge_renderer(&self, tag: &str) -> Option<&EdgeRenderer> {
        let edge_type = tag.parse::<EdgeType>().ok()?;
        self.edges.get(&edge_type)
    }

    /// Replace the renderer bound to a node type
    pub fn set_node_renderer(&mut self, node_type: NodeType, component: impl Into<String>) {
        let renderer = self.nodes.entry(node_type).or_insert_with(|| NodeRenderer {
            node_type,
            component: String::new(),
            branching: node_type == NodeType::If,
        });
        renderer.component = component.into();
    }

    /// Replace the renderer bound to an edge type
    pub fn set_edge_renderer(&mut self, edge_type: EdgeType, component: impl Into<String>) {
        self.edges.insert(
            edge_type,
            EdgeRenderer {
                edge_type,
                component: component.into(),
            },
        );
    }

    /// All valid node type tags
    pub fn node_tags(&self) -> Vec<&'static str> {
        NodeType::ALL.iter().map(|t| t.as_str()).collect()
    }

    /// All valid edge type tags
    pub fn edge_tags(&self) -> Vec<&'static str> {
        EdgeType::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
