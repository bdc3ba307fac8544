// SPDX-License-Identifier: MIT

//! Connection validation
//!
//! Decides whether a proposed edge may be added. Pure: reads the graph,
//! never changes it.

use serde::{Deserialize, Serialize};

use super::types::Graph;
use crate::error::Rejection;

/// A proposed edge, before it has an id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCandidate {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl ConnectionCandidate {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
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
}

/// Which connections the validator admits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionPolicy {
    /// Allow an edge from a node to itself
    pub allow_self_loops: bool,
    /// Allow more than one edge between the same source/target pair
    pub allow_parallel_edges: bool,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            allow_self_loops: false,
            allow_parallel_edges: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionValidator {
    policy: ConnectionPolicy,
}

impl ConnectionValidator {
    pub fn new(policy: ConnectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    /// Check a candidate, returning the first reason it is refused
    pub fn check(&self, candidate: &ConnectionCandidate, graph: &Graph) -> Result<(), Rejection> {
        if !graph.contains_node(&candidate.source) {
            return Err(Rejection::UnknownSource);
        }
        if !graph.contains_node(&candidate.target) {
            return Err(Rejection::UnknownTarget);
        }
        if candidate.source == candidate.target && !self.policy.allow_self_loops {
            return Err(Rejection::SelfLoop);
        }
        if !self.policy.allow_parallel_edges
            && graph
                .edges_of(&candidate.source)
                .any(|e| e.source == candidate.source && e.target == candidate.target)
        {
            return Err(Rejection::ParallelEdge);
        }
        Ok(())
    }

    pub fn is_valid_connection(&self, candidate: &ConnectionCandidate, graph: &Graph) -> bool {
        self.check(candidate, graph).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::graph::types::{Edge, Node};
    use crate::workflow::registry::NodeType;
    use crate::workflow::types::{NodeData, Position};

    fn node(id: &str, node_type: NodeType) -> Node {
        Node::new(id, node_type, Position::default(), NodeData::new(id))
    }

    fn graph_ab() -> Graph {
        let mut graph = Graph::default();
        graph.insert_node(node("a", NodeType::Module));
        graph.insert_node(node("b", NodeType::Function));
        graph.insert_edge(Edge::new("e1", "a", "b"));
        graph
    }

    #[test]
    fn test_default_policy() {
        let policy = ConnectionPolicy::default();
        assert!(!policy.allow_self_loops);
        assert!(policy.allow_parallel_edges);
    }

    #[test]
    fn test_parallel_edge_allowed_by_default() {
        let validator = ConnectionValidator::default();
        assert!(validator.is_valid_connection(&ConnectionCandidate::new("a", "b"), &graph_ab()));
    }

    #[test]
    fn test_reverse_edge_allowed() {
        let validator = ConnectionValidator::default();
        assert!(validator.is_valid_connection(&ConnectionCandidate::new("b", "a"), &graph_ab()));
    }

    #[test]
    fn test_self_loop_rejected_by_default() {
        let validator = ConnectionValidator::default();
        assert_eq!(
            validator.check(&ConnectionCandidate::new("a", "a"), &graph_ab()),
            Err(Rejection::SelfLoop)
        );
    }

    #[test]
    fn test_self_loop_allowed_when_enabled() {
        let validator = ConnectionValidator::new(ConnectionPolicy {
            allow_self_loops: true,
            ..Default::default()
        });
        assert!(validator.is_valid_connection(&ConnectionCandidate::new("a", "a"), &graph_ab()));
    }

    #[test]
    fn test_unknown_endpoints() {
        let validator = ConnectionValidator::default();
        let graph = graph_ab();
        assert_eq!(
            validator.check(&ConnectionCandidate::new("x", "b"), &graph),
            Err(Rejection::UnknownSource)
        );
        assert_eq!(
            validator.check(&ConnectionCandidate::new("a", "z"), &graph),
            Err(Rejection::UnknownTarget)
        );
    }

    #[test]
    fn test_parallel_edge_rejected_when_disabled() {
        let validator = ConnectionValidator::new(ConnectionPolicy {
            allow_parallel_edges: false,
            ..Default::default()
        });
        let graph = graph_ab();
        assert_eq!(
            validator.check(&ConnectionCandidate::new("a", "b"), &graph),
            Err(Rejection::ParallelEdge)
        );
        // The opposite direction is a different pair
        assert!(validator.is_valid_connection(&ConnectionCandidate::new("b", "a"), &graph));
    }

    #[test]
    fn test_check_does_not_mutate() {
        let validator = ConnectionValidator::default();
        let graph = graph_ab();
        let before = graph.clone();
        for target in ["a", "b"] {
            let candidate = ConnectionCandidate::new("a", target);
            let _ = validator.check(&candidate, &graph);
        }
        assert_eq!(graph, before);
    }
}
