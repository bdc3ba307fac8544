// SPDX-License-Identifier: MIT

//! Graph store for an editing session
//!
//! Owns the graph, applies mutations atomically and notifies subscribers
//! after each committed change. Failed mutations leave the graph untouched
//! and emit nothing.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::types::{Edge, Graph, Node, Selection};
use super::validator::{ConnectionCandidate, ConnectionValidator};
use crate::error::{RecordKind, StoreError};
use crate::workflow::types::Position;

/// What a committed mutation changed
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    NodeAdded(String),
    NodeMoved(String),
    NodeRemoved { id: String, cascaded: Vec<String> },
    EdgeAdded(String),
    EdgeRemoved(String),
    SelectionChanged(Option<Selection>),
}

/// Changes a subscriber may leave unread before it is dropped
pub const SUBSCRIBER_CAPACITY: usize = 100;

/// Notification sent to subscribers after every committed mutation
#[derive(Debug, Clone)]
pub struct GraphChange {
    pub revision: u64,
    pub kind: ChangeKind,
    pub snapshot: Arc<Graph>,
}

pub struct GraphStore {
    graph: Graph,
    validator: ConnectionValidator,
    revision: u64,
    subscribers: Vec<mpsc::Sender<GraphChange>>,
}

impl GraphStore {
    pub fn new(graph: Graph, validator: ConnectionValidator) -> Self {
        Self {
            graph,
            validator,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    /// Current graph, read-only
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Owned copy of the current graph
    pub fn snapshot(&self) -> Arc<Graph> {
        Arc::new(self.graph.clone())
    }

    /// Number of committed mutations so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn validator(&self) -> &ConnectionValidator {
        &self.validator
    }

    /// Receive a `GraphChange` for every mutation committed from now on.
    /// A subscriber that falls `SUBSCRIBER_CAPACITY` changes behind is
    /// disconnected; its receiver drains what was queued, then closes.
    pub fn subscribe(&mut self) -> mpsc::Receiver<GraphChange> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.subscribers.push(tx);
        rx
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), StoreError> {
        if self.graph.contains_node(node.id()) {
            log::warn!("Rejected add_node: duplicate id '{}'", node.id());
            return Err(StoreError::duplicate(RecordKind::Node, node.id()));
        }
        let id = node.id().to_string();
        self.graph.insert_node(node);
        self.commit(ChangeKind::NodeAdded(id));
        Ok(())
    }

    /// Set a node's position. No clamping is applied.
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), StoreError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Node, id))?;
        node.position = position;
        self.commit(ChangeKind::NodeMoved(id.to_string()));
        Ok(())
    }

    pub fn select_node(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.graph.contains_node(id) {
            return Err(StoreError::not_found(RecordKind::Node, id));
        }
        self.set_selection(Some(Selection::Node(id.to_string())));
        Ok(())
    }

    pub fn select_edge(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.graph.contains_edge(id) {
            return Err(StoreError::not_found(RecordKind::Edge, id));
        }
        self.set_selection(Some(Selection::Edge(id.to_string())));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
    }

    /// Insert an edge after the validator admits it
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), StoreError> {
        let candidate = ConnectionCandidate::new(edge.source.clone(), edge.target.clone())
            .with_handles(edge.source_handle.clone(), edge.target_handle.clone());

        if let Err(reason) = self.validator.check(&candidate, &self.graph) {
            log::warn!(
                "Rejected edge '{}' {} -> {}: {}",
                edge.id(),
                edge.source,
                edge.target,
                reason
            );
            return Err(StoreError::InvalidConnection {
                source_node: edge.source,
                target_node: edge.target,
                reason,
            });
        }
        if self.graph.contains_edge(edge.id()) {
            log::warn!("Rejected add_edge: duplicate id '{}'", edge.id());
            return Err(StoreError::duplicate(RecordKind::Edge, edge.id()));
        }

        let id = edge.id().to_string();
        self.graph.insert_edge(edge);
        self.commit(ChangeKind::EdgeAdded(id));
        Ok(())
    }

    /// Remove a node together with every edge attached to it
    pub fn remove_node(&mut self, id: &str) -> Result<Vec<String>, StoreError> {
        let cascaded = self
            .graph
            .remove_node(id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Node, id))?;
        if !cascaded.is_empty() {
            log::debug!("Removing node '{}' dropped edges {:?}", id, cascaded);
        }
        self.commit(ChangeKind::NodeRemoved {
            id: id.to_string(),
            cascaded: cascaded.clone(),
        });
        Ok(cascaded)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge, StoreError> {
        let edge = self
            .graph
            .remove_edge(id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Edge, id))?;
        self.commit(ChangeKind::EdgeRemoved(id.to_string()));
        Ok(edge)
    }

    /// Tear down the store, handing back the final graph
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.graph.set_selection(selection.clone());
        self.commit(ChangeKind::SelectionChanged(selection));
    }

    fn commit(&mut self, kind: ChangeKind) {
        self.revision += 1;
        if self.subscribers.is_empty() {
            return;
        }

        let change = GraphChange {
            revision: self.revision,
            kind,
            snapshot: self.snapshot(),
        };
        for tx in std::mem::take(&mut self.subscribers) {
            match tx.try_send(change.clone()) {
                Ok(()) => self.subscribers.push(tx),
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "Dropped graph subscriber {} changes behind",
                        SUBSCRIBER_CAPACITY
                    );
                }
                Err(TrySendError::Closed(_)) => log::debug!("Dropped closed graph subscriber"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;
    use crate::workflow::graph::validator::ConnectionPolicy;
    use crate::workflow::registry::NodeType;
    use crate::workflow::types::NodeData;

    fn node(id: &str) -> Node {
        Node::new(id, NodeType::Tool, Position::default(), NodeData::new(id))
    }

    fn store_ab() -> GraphStore {
        let mut store = GraphStore::new(Graph::default(), ConnectionValidator::default());
        store.add_node(node("a")).unwrap();
        store.add_node(node("b")).unwrap();
        store
    }

    #[test]
    fn test_add_node_duplicate() {
        let mut store = store_ab();
        let err = store.add_node(node("a")).unwrap_err();
        assert_eq!(err, StoreError::duplicate(RecordKind::Node, "a"));
        assert_eq!(store.graph().node_count(), 2);
    }

    #[test]
    fn test_move_node_last_position_wins() {
        let mut store = store_ab();
        for i in 1..=5 {
            store
                .move_node("a", Position::new(i as f64 * 10.0, -(i as f64)))
                .unwrap();
        }
        assert_eq!(
            store.graph().node("a").unwrap().position,
            Position::new(50.0, -5.0)
        );
    }

    #[test]
    fn test_move_node_unclamped() {
        let mut store = store_ab();
        store.move_node("b", Position::new(-1e9, 1e9)).unwrap();
        assert_eq!(
            store.graph().node("b").unwrap().position,
            Position::new(-1e9, 1e9)
        );
    }

    #[test]
    fn test_move_missing_node() {
        let mut store = store_ab();
        assert_eq!(
            store.move_node("nope", Position::default()),
            Err(StoreError::not_found(RecordKind::Node, "nope"))
        );
    }

    #[test]
    fn test_add_edge_rejections_repeat() {
        let mut store = store_ab();
        let first = store.add_edge(Edge::new("loop", "a", "a")).unwrap_err();
        let second = store.add_edge(Edge::new("loop", "a", "a")).unwrap_err();
        assert_eq!(first, second);
        assert!(matches!(
            first,
            StoreError::InvalidConnection {
                reason: Rejection::SelfLoop,
                ..
            }
        ));
        assert_eq!(store.graph().edge_count(), 0);
    }

    #[test]
    fn test_add_edge_duplicate_id() {
        let mut store = store_ab();
        store.add_edge(Edge::new("e1", "a", "b")).unwrap();
        let err = store.add_edge(Edge::new("e1", "b", "a")).unwrap_err();
        assert_eq!(err, StoreError::duplicate(RecordKind::Edge, "e1"));
        assert_eq!(store.graph().edge("e1").unwrap().source, "a");
    }

    #[test]
    fn test_add_parallel_edges_by_default() {
        let mut store = store_ab();
        store.add_edge(Edge::new("e1", "a", "b")).unwrap();
        store.add_edge(Edge::new("e2", "a", "b")).unwrap();
        assert_eq!(store.graph().edge_count(), 2);
    }

    #[test]
    fn test_add_edge_respects_policy() {
        let validator = ConnectionValidator::new(ConnectionPolicy {
            allow_self_loops: true,
            allow_parallel_edges: false,
        });
        let mut store = GraphStore::new(Graph::default(), validator);
        store.add_node(node("a")).unwrap();
        store.add_edge(Edge::new("self", "a", "a")).unwrap();
        assert!(store.add_edge(Edge::new("self2", "a", "a")).is_err());
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut store = store_ab();
        store.add_node(node("c")).unwrap();
        store.add_edge(Edge::new("ab", "a", "b")).unwrap();
        store.add_edge(Edge::new("ba", "b", "a")).unwrap();
        store.add_edge(Edge::new("bc", "b", "c")).unwrap();

        let cascaded = store.remove_node("b").unwrap();
        assert_eq!(cascaded.len(), 3);
        assert_eq!(store.graph().edge_count(), 0);
        assert!(store.graph().edges().all(|e| !e.touches("b")));
    }

    #[test]
    fn test_remove_edge_only_that_edge() {
        let mut store = store_ab();
        store.add_edge(Edge::new("e1", "a", "b")).unwrap();
        store.add_edge(Edge::new("e2", "b", "a")).unwrap();
        let removed = store.remove_edge("e1").unwrap();
        assert_eq!(removed.id(), "e1");
        assert!(store.graph().contains_edge("e2"));
        assert_eq!(store.graph().node_count(), 2);
        assert!(store.remove_edge("e1").is_err());
    }

    #[test]
    fn test_selection_is_single_valued() {
        let mut store = store_ab();
        store.add_edge(Edge::new("e1", "a", "b")).unwrap();

        store.select_node("a").unwrap();
        store.select_edge("e1").unwrap();
        assert_eq!(
            store.graph().selection(),
            Some(&Selection::Edge("e1".to_string()))
        );

        store.clear_selection();
        assert!(store.graph().selection().is_none());

        assert!(store.select_node("ghost").is_err());
        assert!(store.select_edge("ghost").is_err());
    }

    #[test]
    fn test_notifications_only_on_success() {
        let mut store = store_ab();
        let mut rx = store.subscribe();

        store.add_node(node("c")).unwrap();
        assert!(store.add_node(node("c")).is_err());
        assert!(store.add_edge(Edge::new("x", "a", "zzz")).is_err());
        store.move_node("c", Position::new(1.0, 2.0)).unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.kind, ChangeKind::NodeAdded("c".to_string()));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.kind, ChangeKind::NodeMoved("c".to_string()));
        assert_eq!(second.revision, first.revision + 1);
        assert_eq!(
            second.snapshot.node("c").unwrap().position,
            Position::new(1.0, 2.0)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_subscriber_is_pruned() {
        let mut store = store_ab();
        let rx = store.subscribe();
        let mut live = store.subscribe();
        drop(rx);

        store.clear_selection();
        assert!(live.try_recv().is_ok());
        assert_eq!(store.subscribers.len(), 1);
    }

    #[test]
    fn test_lagging_subscriber_is_dropped() {
        let mut store = store_ab();
        let mut rx = store.subscribe();
        for i in 0..=SUBSCRIBER_CAPACITY {
            let position = Position::new(i as f64, 0.0);
            store.move_node("a", position).unwrap();
        }

        // Mutations keep succeeding for everyone else
        let last = Position::new(SUBSCRIBER_CAPACITY as f64, 0.0);
        assert_eq!(store.graph().node("a").unwrap().position, last);
        assert!(store.subscribers.is_empty());

        let received = std::iter::from_fn(|| rx.try_recv().ok()).count();
        assert_eq!(received, SUBSCRIBER_CAPACITY);
    }

    #[test]
    fn test_remove_selected_edge_clears_selection() {
        let mut store = store_ab();
        store.add_edge(Edge::new("e1", "a", "b")).unwrap();
        store.select_edge("e1").unwrap();
        let mut rx = store.subscribe();

        store.remove_edge("e1").unwrap();
        assert!(store.graph().selection().is_none());
        let change = rx.try_recv().unwrap();
        assert_eq!(change.kind, ChangeKind::EdgeRemoved("e1".to_string()));
        assert!(change.snapshot.selection().is_none());
    }

    #[test]
    fn test_remove_selected_node_clears_selection() {
        let mut store = store_ab();
        store.select_node("a").unwrap();
        let mut rx = store.subscribe();

        store.remove_node("a").unwrap();
        assert!(store.graph().selection().is_none());
        let change = rx.try_recv().unwrap();
        assert!(change.snapshot.selection().is_none());
    }
}
