// SPDX-License-Identifier: MIT

//! Typed workflow graph
//!
//! This module provides the in-memory graph, the connection validator and
//! the store that owns the graph during an editing session.

pub mod store;
pub mod types;
pub mod validator;

pub use store::{ChangeKind, GraphChange, GraphStore, SUBSCRIBER_CAPACITY};
pub use types::{Edge, EdgeData, Graph, Node, Selection};
pub use validator::{ConnectionCandidate, ConnectionPolicy, ConnectionValidator};
