// SPDX-License-Identifier: MIT

//! Edit session state machine
//!
//! Turns gesture events into graph store mutations. Three states:
//! `Idle`, `ConnectingEdge` (dragging from an output handle) and
//! `DraggingNode`. Events are handled one at a time, to completion.

use uuid::Uuid;

use super::gesture::{ElementRef, GestureEvent, HandleSide};
use crate::config::EditorConfig;
use crate::error::{Rejection, StoreError};
use crate::workflow::graph::{
    ConnectionCandidate, ConnectionValidator, Edge, Graph, GraphChange, GraphStore, Selection,
};
use crate::workflow::registry::EdgeType;
use crate::workflow::types::Position;
use tokio::sync::mpsc;

/// An in-progress connection attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDraft {
    pub source: String,
    pub source_handle: Option<String>,
    /// Last pointer position, for drawing the floating edge
    pub pointer: Position,
    pub hover: Option<HoverTarget>,
}

/// Target handle currently under the pointer while connecting
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub node: String,
    pub handle: Option<String>,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    ConnectingEdge(ConnectionDraft),
    DraggingNode {
        node: String,
        /// Pointer position relative to the node origin at grab time
        grab_offset: Position,
    },
}

/// What handling an event did, for the host to render
#[derive(Debug, Clone, PartialEq)]
pub enum SessionFeedback {
    /// Event had no effect in the current state
    Ignored,
    Selected(Option<Selection>),
    ConnectionStarted {
        source: String,
    },
    /// Advisory validity of the handle under the pointer
    ConnectionPreview {
        target: Option<String>,
        valid: bool,
    },
    EdgeCreated(String),
    ConnectionDiscarded {
        reason: Option<Rejection>,
    },
    NodeMoved {
        node: String,
        position: Position,
    },
    DragEnded {
        node: String,
    },
    Cancelled,
}

type EdgeIdGenerator = Box<dyn FnMut(&ConnectionCandidate) -> String>;

/// Drives one editing session over an exclusively owned graph store
pub struct EditSession {
    store: GraphStore,
    state: SessionState,
    edge_type: EdgeType,
    animate_new_edges: bool,
    next_edge_id: EdgeIdGenerator,
}

impl EditSession {
    pub fn new(store: GraphStore) -> Self {
        Self {
            store,
            state: SessionState::Idle,
            edge_type: EdgeType::default(),
            animate_new_edges: false,
            next_edge_id: Box::new(|candidate: &ConnectionCandidate| {
                format!(
                    "e-{}-{}-{}",
                    candidate.source,
                    candidate.target,
                    Uuid::new_v4()
                )
            }),
        }
    }

    /// Start a session on `graph` using the validator policy and new-edge
    /// defaults from `config`
    pub fn from_config(graph: Graph, config: &EditorConfig) -> Self {
        let store = GraphStore::new(graph, ConnectionValidator::new(config.connection));
        let mut session = Self::new(store);
        session.edge_type = config.default_edge_type;
        session.animate_new_edges = config.animate_new_edges;
        session
    }

    /// Replace how ids for user-drawn edges are made
    pub fn with_edge_id_generator<F>(mut self, generator: F) -> Self
    where
        F: FnMut(&ConnectionCandidate) -> String + 'static,
    {
        self.next_edge_id = Box::new(generator);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn graph(&self) -> &Graph {
        self.store.graph()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Direct store access for edits that are not pointer gestures
    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<GraphChange> {
        self.store.subscribe()
    }

    /// Remove whatever is selected. Removing a node also removes its edges.
    pub fn delete_selection(&mut self) -> Result<bool, StoreError> {
        match self.store.graph().selection().cloned() {
            Some(Selection::Node(id)) => self.store.remove_node(&id).map(|_| true),
            Some(Selection::Edge(id)) => self.store.remove_edge(&id).map(|_| true),
            None => Ok(false),
        }
    }

    /// End the session, handing back the final graph
    pub fn finish(self) -> Graph {
        self.store.into_graph()
    }

    /// Feed one gesture event through the state machine
    pub fn handle(&mut self, event: GestureEvent) -> Result<SessionFeedback, StoreError> {
        if matches!(event, GestureEvent::Cancel) {
            return Ok(self.cancel());
        }

        let state = std::mem::take(&mut self.state);
        let (next, result) = match state {
            SessionState::Idle => self.on_idle(event),
            SessionState::ConnectingEdge(draft) => self.on_connecting(draft, event),
            SessionState::DraggingNode { node, grab_offset } => {
                self.on_dragging(node, grab_offset, event)
            }
        };
        self.state = next;
        result
    }

    /// Abandon the current gesture. Uncommitted connections are dropped;
    /// a dragged node stays where the last move put it.
    pub fn cancel(&mut self) -> SessionFeedback {
        match std::mem::take(&mut self.state) {
            SessionState::Idle => SessionFeedback::Ignored,
            SessionState::ConnectingEdge(draft) => {
                log::debug!("Cancelled connection from '{}'", draft.source);
                SessionFeedback::Cancelled
            }
            SessionState::DraggingNode { node, .. } => {
                log::debug!("Cancelled drag of '{}'", node);
                SessionFeedback::Cancelled
            }
        }
    }

    fn on_idle(
        &mut self,
        event: GestureEvent,
    ) -> (SessionState, Result<SessionFeedback, StoreError>) {
        let GestureEvent::Down { target, position } = event else {
            return (SessionState::Idle, Ok(SessionFeedback::Ignored));
        };

        match target {
            ElementRef::Handle {
                node,
                handle,
                side: HandleSide::Source,
            } => {
                if !self.store.graph().contains_node(&node) {
                    log::debug!("Ignoring press on handle of unknown node '{}'", node);
                    return (SessionState::Idle, Ok(SessionFeedback::Ignored));
                }
                log::debug!("Idle -> ConnectingEdge from '{}'", node);
                let feedback = SessionFeedback::ConnectionStarted {
                    source: node.clone(),
                };
                let draft = ConnectionDraft {
                    source: node,
                    source_handle: handle,
                    pointer: position,
                    hover: None,
                };
                (SessionState::ConnectingEdge(draft), Ok(feedback))
            }
            ElementRef::Handle {
                side: HandleSide::Target,
                ..
            } => (SessionState::Idle, Ok(SessionFeedback::Ignored)),
            ElementRef::Node { id } => {
                // Pressing the selected node again only starts a drag
                let selection = Some(Selection::Node(id.clone()));
                if self.store.graph().selection() != selection.as_ref() {
                    if let Err(e) = self.store.select_node(&id) {
                        return (SessionState::Idle, Err(e));
                    }
                }
                let origin = match self.store.graph().node(&id) {
                    Some(n) => n.position,
                    None => Position::default(),
                };
                log::debug!("Idle -> DraggingNode '{}'", id);
                let feedback = SessionFeedback::Selected(selection);
                (
                    SessionState::DraggingNode {
                        node: id,
                        grab_offset: position.offset_from(origin),
                    },
                    Ok(feedback),
                )
            }
            ElementRef::Edge { id } => {
                let selection = Some(Selection::Edge(id.clone()));
                let result = if self.store.graph().selection() == selection.as_ref() {
                    Ok(())
                } else {
                    self.store.select_edge(&id)
                };
                let result = result.map(|_| SessionFeedback::Selected(selection));
                (SessionState::Idle, result)
            }
            ElementRef::Canvas => {
                if self.store.graph().selection().is_some() {
                    self.store.clear_selection();
                }
                (SessionState::Idle, Ok(SessionFeedback::Selected(None)))
            }
        }
    }

    fn on_connecting(
        &mut self,
        mut draft: ConnectionDraft,
        event: GestureEvent,
    ) -> (SessionState, Result<SessionFeedback, StoreError>) {
        match event {
            GestureEvent::Move { target, position } => {
                draft.pointer = position;
                draft.hover = match target {
                    ElementRef::Handle {
                        node,
                        handle,
                        side: HandleSide::Target,
                    } => {
                        let candidate = self.candidate(&draft, &node, &handle);
                        let valid = self
                            .store
                            .validator()
                            .is_valid_connection(&candidate, self.store.graph());
                        Some(HoverTarget {
                            node,
                            handle,
                            valid,
                        })
                    }
                    _ => None,
                };
                let feedback = match &draft.hover {
                    Some(h) => SessionFeedback::ConnectionPreview {
                        target: Some(h.node.clone()),
                        valid: h.valid,
                    },
                    None => SessionFeedback::ConnectionPreview {
                        target: None,
                        valid: false,
                    },
                };
                (SessionState::ConnectingEdge(draft), Ok(feedback))
            }
            GestureEvent::Up { target, .. } => {
                let ElementRef::Handle {
                    node,
                    handle,
                    side: HandleSide::Target,
                } = target
                else {
                    log::debug!("Connection from '{}' released off a handle", draft.source);
                    return (
                        SessionState::Idle,
                        Ok(SessionFeedback::ConnectionDiscarded { reason: None }),
                    );
                };
                let result = self.commit_connection(&draft, node, handle);
                (SessionState::Idle, result)
            }
            // A second press cannot start a gesture while one is running
            GestureEvent::Down { .. } | GestureEvent::Cancel => (
                SessionState::ConnectingEdge(draft),
                Ok(SessionFeedback::Ignored),
            ),
        }
    }

    fn on_dragging(
        &mut self,
        node: String,
        grab_offset: Position,
        event: GestureEvent,
    ) -> (SessionState, Result<SessionFeedback, StoreError>) {
        match event {
            GestureEvent::Move { position, .. } => {
                let position = position.offset_from(grab_offset);
                match self.store.move_node(&node, position) {
                    Ok(()) => {
                        let feedback = SessionFeedback::NodeMoved {
                            node: node.clone(),
                            position,
                        };
                        let state = SessionState::DraggingNode { node, grab_offset };
                        (state, Ok(feedback))
                    }
                    Err(e) => (SessionState::Idle, Err(e)),
                }
            }
            GestureEvent::Up { .. } => {
                log::debug!("DraggingNode '{}' -> Idle", node);
                (SessionState::Idle, Ok(SessionFeedback::DragEnded { node }))
            }
            GestureEvent::Down { .. } | GestureEvent::Cancel => (
                SessionState::DraggingNode { node, grab_offset },
                Ok(SessionFeedback::Ignored),
            ),
        }
    }

    fn candidate(
        &self,
        draft: &ConnectionDraft,
        target: &str,
        target_handle: &Option<String>,
    ) -> ConnectionCandidate {
        ConnectionCandidate::new(draft.source.clone(), target)
            .with_handles(draft.source_handle.clone(), target_handle.clone())
    }

    fn commit_connection(
        &mut self,
        draft: &ConnectionDraft,
        target: String,
        target_handle: Option<String>,
    ) -> Result<SessionFeedback, StoreError> {
        let candidate = self.candidate(draft, &target, &target_handle);
        let graph = self.store.graph();
        if let Err(reason) = self.store.validator().check(&candidate, graph) {
            log::debug!(
                "Discarded connection {} -> {}: {}",
                candidate.source,
                candidate.target,
                reason
            );
            return Ok(SessionFeedback::ConnectionDiscarded {
                reason: Some(reason),
            });
        }

        let id = (self.next_edge_id)(&candidate);
        let edge = Edge::new(id.clone(), candidate.source, candidate.target)
            .with_type(self.edge_type)
            .with_handles(candidate.source_handle, candidate.target_handle)
            .animated(self.animate_new_edges);
        self.store.add_edge(edge)?;
        log::debug!("ConnectingEdge -> Idle, created edge '{}'", id);
        Ok(SessionFeedback::EdgeCreated(id))
    }
}
