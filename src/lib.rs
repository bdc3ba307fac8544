// SPDX-License-Identifier: MIT

//! Workflow graph model and interactive edit session.
//!
//! A `WorkflowDocument` is loaded into a typed `Graph` by `WorkflowLoader`,
//! then edited through an `EditSession` that owns the `GraphStore` and turns
//! pointer gestures into validated mutations.

pub mod config;
pub mod error;
pub mod workflow;

pub use config::EditorConfig;
pub use error::{CanvasError, DocumentError, Rejection, StoreError, UnknownTypeError};
pub use workflow::graph::{Edge, Graph, GraphChange, GraphStore, Node, Selection};
pub use workflow::loader::WorkflowLoader;
pub use workflow::session::{EditSession, ElementRef, GestureEvent, SessionFeedback};
pub use workflow::types::WorkflowDocument;
