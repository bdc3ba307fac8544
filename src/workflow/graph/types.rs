//! In-memory graph types
//!
//! `Graph` is read-only outside this crate. Mutation goes through
//! `GraphStore`, which keeps edge endpoints and selection consistent.

use serde::Serialize;
use std::collections::HashMap;

use crate::workflow::registry::{EdgeType, NodeType};
use crate::workflow::types::{EdgeRecord, NodeData, NodeRecord, Position, WorkflowDocument};

/// A step in the workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    id: String,
    node_type: NodeType,
    pub position: Position,
    pub data: NodeData,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        position: Position,
        data: NodeData,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            position,
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }
}

/// Edge payload
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EdgeData {
    pub label: Option<String>,
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    id: String,
    pub source: String,
    pub target: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub edge_type: EdgeType,
    pub animated: bool,
    pub data: EdgeData,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            edge_type: EdgeType::default(),
            animated: false,
            data: EdgeData::default(),
        }
    }

    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn with_handles(
        mut self,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Self {
        self.source_handle = source_handle;
        self.target_handle = target_handle;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = Some(label.into());
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if either endpoint is `node_id`
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The currently selected item, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Selection {
    Node(String),
    Edge(String),
}

/// Nodes, edges and selection for one editing session
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Graph {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    selection: Option<Selection>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges with `node_id` as source or target
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.touches(node_id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Write the graph back out as a document, records sorted by id
    pub fn to_document(&self) -> WorkflowDocument {
        let mut nodes: Vec<NodeRecord> = self
            .nodes
            .values()
            .map(|n| NodeRecord {
                id: n.id.clone(),
                node_type: n.node_type.as_str().to_string(),
                position: n.position,
                data: n.data.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<EdgeRecord> = self
            .edges
            .values()
            .map(|e| EdgeRecord {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                edge_type: e.edge_type.as_str().to_string(),
                animated: e.animated,
                label: e.data.label.clone(),
                source_handle: e.source_handle.clone(),
                target_handle: e.target_handle.clone(),
            })
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        WorkflowDocument { nodes, edges }
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Remove a node and every edge attached to it. Returns the ids of the
    /// cascaded edges, or `None` if the node does not exist.
    pub(crate) fn remove_node(&mut self, id: &str) -> Option<Vec<String>> {
        self.nodes.remove(id)?;

        let mut cascaded: Vec<String> = self
            .edges
            .values()
            .filter(|e| e.touches(id))
            .map(|e| e.id.clone())
            .collect();
        cascaded.sort();
        for edge_id in &cascaded {
            self.edges.remove(edge_id);
        }

        let selection_gone = match &self.selection {
            Some(Selection::Node(n)) => n == id,
            Some(Selection::Edge(e)) => cascaded.contains(e),
            None => false,
        };
        if selection_gone {
            self.selection = None;
        }

        Some(cascaded)
    }

    pub(crate) fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        if self.selection == Some(Selection::Edge(id.to_string())) {
            self.selection = None;
        }
        Some(edge)
    }

    pub(crate) fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }
}
