// SPDX-License-Identifier: MIT

//! Interactive editing
//!
//! This module provides:
//! - `GestureEvent` - pointer input from the host surface
//! - `EditSession` - the state machine applying gestures to a `GraphStore`

mod controller;
mod gesture;

pub use controller::{ConnectionDraft, EditSession, HoverTarget, SessionFeedback, SessionState};
pub use gesture::{ElementRef, GestureEvent, HandleSide};
