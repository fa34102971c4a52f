//! Node type and related structures.
//!
//! Nodes are the topics of the mind map. Each node has:
//! - A caller-assigned identifier, stable for the node's lifetime
//! - Position (x, y) in scene space
//! - An optional color, carried for the caller and never read by layout

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use crate::geometry::Point2D;

/// Stable node identifier.
///
/// Assigned by the caller (usually the topic label) and never generated by
/// the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordering used for sibling lists: case-insensitive, exact id breaks ties.
    pub fn sibling_order(&self, other: &NodeId) -> Ordering {
        self.0
            .to_lowercase()
            .cmp(&other.0.to_lowercase())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Per-node attributes stored as the petgraph node weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Point2D,
    /// Hex color such as `#add8e6`.
    pub color: Option<String>,
}

impl Node {
    pub fn new(id: NodeId, position: Point2D) -> Self {
        Self {
            id,
            position,
            color: None,
        }
    }
}
