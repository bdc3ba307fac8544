//! Pointer gesture input
//!
//! The host translates mouse/touch/pen events into `GestureEvent`s. Where a
//! pointer event landed is described by an `ElementRef`.

use serde::{Deserialize, Serialize};

use crate::workflow::types::Position;

/// Which end of an edge a handle accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    /// Output handle, edges start here
    Source,
    /// Input handle, edges end here
    Target,
}

/// The element under the pointer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum ElementRef {
    /// A node body
    Node {
        id: String,
    },
    /// A connection handle on a node
    Handle {
        node: String,
        #[serde(default)]
        handle: Option<String>,
        side: HandleSide,
    },
    Edge {
        id: String,
    },
    /// Empty canvas
    #[default]
    Canvas,
}

impl ElementRef {
    pub fn node(id: impl Into<String>) -> Self {
        ElementRef::Node { id: id.into() }
    }

    pub fn edge(id: impl Into<String>) -> Self {
        ElementRef::Edge { id: id.into() }
    }

    pub fn source_handle(node: impl Into<String>, handle: Option<&str>) -> Self {
        ElementRef::Handle {
            node: node.into(),
            handle: handle.map(str::to_string),
            side: HandleSide::Source,
        }
    }

    pub fn target_handle(node: impl Into<String>, handle: Option<&str>) -> Self {
        ElementRef::Handle {
            node: node.into(),
            handle: handle.map(str::to_string),
            side: HandleSide::Target,
        }
    }
}

/// One step of a user gesture
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GestureEvent {
    Down {
        #[serde(default)]
        target: ElementRef,
        position: Position,
    },
    Move {
        #[serde(default)]
        target: ElementRef,
        position: Position,
    },
    Up {
        #[serde(default)]
        target: ElementRef,
        position: Position,
    },
    /// Pointer left the surface or the host aborted the gesture
    Cancel,
}

impl GestureEvent {
    pub fn down(target: ElementRef, x: f64, y: f64) -> Self {
        GestureEvent::Down {
            target,
            position: Position::new(x, y),
        }
    }

    pub fn moved(target: ElementRef, x: f64, y: f64) -> Self {
        GestureEvent::Move {
            target,
            position: Position::new(x, y),
        }
    }

    pub fn up(target: ElementRef, x: f64, y: f64) -> Self {
        GestureEvent::Up {
            target,
            position: Position::new(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_handle_event() {
        let event: GestureEvent = serde_json::from_value(json!({
            "kind": "down",
            "target": {"element": "handle", "node": "a", "handle": "out", "side": "source"},
            "position": {"x": 4, "y": 8}
        }))
        .unwrap();
        assert_eq!(
            event,
            GestureEvent::down(ElementRef::source_handle("a", Some("out")), 4.0, 8.0)
        );
    }

    #[test]
    fn test_target_defaults_to_canvas() {
        let event: GestureEvent = serde_json::from_value(json!({
            "kind": "up",
            "position": {"x": 0, "y": 0}
        }))
        .unwrap();
        assert_eq!(event, GestureEvent::up(ElementRef::Canvas, 0.0, 0.0));
    }

    #[test]
    fn test_deserialize_script_yaml() {
        let yaml = r#"
- kind: down
  target: { element: node, id: fetch }
  position: { x: 1, y: 1 }
- kind: move
  position: { x: 5, y: 1 }
- kind: cancel
"#;
        let events: Vec<GestureEvent> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], GestureEvent::Cancel);
        assert!(matches!(
            &events[0],
            GestureEvent::Down { target: ElementRef::Node { id }, .. } if id == "fetch"
        ));
    }
}
