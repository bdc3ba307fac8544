//! Workflow loader - document parsing and graph construction
//!
//! Parses workflow documents from JSON or YAML and turns them into a typed
//! `Graph`. Loading is all-or-nothing: the first invalid record aborts it.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::graph::{Edge, Graph, Node};
use super::registry::TypeRegistry;
use super::types::WorkflowDocument;
use crate::error::{CanvasError, DocumentError, RecordKind, UnknownTypeError};

/// Builds graphs from workflow documents
pub struct WorkflowLoader<'r> {
    registry: &'r TypeRegistry,
}

impl WorkflowLoader<'static> {
    /// Loader backed by the built-in type registry
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::global(),
        }
    }
}

impl<'r> WorkflowLoader<'r> {
    pub fn with_registry(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Parse a workflow document from a JSON string
    pub fn parse_json(content: &str) -> Result<WorkflowDocument, CanvasError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a workflow document from a YAML string
    pub fn parse_yaml(content: &str) -> Result<WorkflowDocument, CanvasError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read a document from disk. `.yaml`/`.yml` files are parsed as YAML,
    /// everything else as JSON.
    pub fn read_document<P: AsRef<Path>>(path: P) -> Result<WorkflowDocument, CanvasError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            _ => Self::parse_json(&content),
        }
    }

    /// Read and load a document in one step
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Graph, CanvasError> {
        let document = Self::read_document(path)?;
        Ok(self.load(&document)?)
    }

    /// Convert a document into a graph
    pub fn load(&self, document: &WorkflowDocument) -> Result<Graph, DocumentError> {
        let mut graph = Graph::default();

        for record in &document.nodes {
            let renderer = self
                .registry
                .resolve_node_renderer(&record.node_type)
                .ok_or_else(|| UnknownTypeError {
                    record_kind: RecordKind::Node,
                    record_id: record.id.clone(),
                    tag: record.node_type.clone(),
                })?;
            if graph.contains_node(&record.id) {
                return Err(DocumentError::DuplicateNodeId(record.id.clone()));
            }
            graph.insert_node(Node::new(
                record.id.clone(),
                renderer.node_type,
                record.position,
                record.data.clone(),
            ));
        }

        let mut edge_ids = HashSet::new();
        for record in &document.edges {
            let renderer = self
                .registry
                .resolve_edge_renderer(&record.edge_type)
                .ok_or_else(|| UnknownTypeError {
                    record_kind: RecordKind::Edge,
                    record_id: record.id.clone(),
                    tag: record.edge_type.clone(),
                })?;
            if !edge_ids.insert(record.id.as_str()) {
                return Err(DocumentError::DuplicateEdgeId(record.id.clone()));
            }
            for endpoint in [&record.source, &record.target] {
                if !graph.contains_node(endpoint) {
                    return Err(DocumentError::UnknownEndpoint {
                        edge_id: record.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }

            let mut edge = Edge::new(
                record.id.clone(),
                record.source.clone(),
                record.target.clone(),
            )
            .with_type(renderer.edge_type)
            .with_handles(record.source_handle.clone(), record.target_handle.clone())
            .animated(record.animated);
            if let Some(label) = &record.label {
                edge = edge.with_label(label.clone());
            }
            graph.insert_edge(edge);
        }

        log::info!(
            "Loaded workflow graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

impl Default for WorkflowLoader<'static> {
    fn default() -> Self {
        Self::new()
    }
}
