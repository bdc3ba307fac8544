// SPDX-License-Identifier: MIT

//! Editor configuration
//!
//! Settings come from defaults, an optional YAML/JSON file, and
//! `CANVAS_*` environment variables, applied in that order.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::CanvasError;
use crate::workflow::graph::ConnectionPolicy;
use crate::workflow::registry::EdgeType;

pub const ENV_ALLOW_SELF_LOOPS: &str = "CANVAS_ALLOW_SELF_LOOPS";
pub const ENV_ALLOW_PARALLEL_EDGES: &str = "CANVAS_ALLOW_PARALLEL_EDGES";
pub const ENV_DEFAULT_EDGE_TYPE: &str = "CANVAS_DEFAULT_EDGE_TYPE";
pub const ENV_ANIMATE_NEW_EDGES: &str = "CANVAS_ANIMATE_NEW_EDGES";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Rules for admitting new connections
    pub connection: ConnectionPolicy,
    /// Type given to edges drawn by the user
    pub default_edge_type: EdgeType,
    /// Whether edges drawn by the user start animated
    pub animate_new_edges: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionPolicy::default(),
            default_edge_type: EdgeType::Bezier,
            animate_new_edges: false,
        }
    }
}

impl EditorConfig {
    /// Parse a config from YAML (JSON is valid YAML too)
    pub fn from_yaml(content: &str) -> Result<Self, CanvasError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CanvasError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, CanvasError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from a key lookup (usually the environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, CanvasError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_ALLOW_SELF_LOOPS) {
            self.connection.allow_self_loops = parse_bool(ENV_ALLOW_SELF_LOOPS, &v)?;
        }
        if let Some(v) = lookup(ENV_ALLOW_PARALLEL_EDGES) {
            self.connection.allow_parallel_edges = parse_bool(ENV_ALLOW_PARALLEL_EDGES, &v)?;
        }
        if let Some(v) = lookup(ENV_DEFAULT_EDGE_TYPE) {
            self.default_edge_type = v.trim().parse::<EdgeType>().map_err(|e: String| {
                CanvasError::config(format!("{}: {}", ENV_DEFAULT_EDGE_TYPE, e))
            })?;
        }
        if let Some(v) = lookup(ENV_ANIMATE_NEW_EDGES) {
            self.animate_new_edges = parse_bool(ENV_ANIMATE_NEW_EDGES, &v)?;
        }
        Ok(self)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CanvasError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CanvasError::config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
