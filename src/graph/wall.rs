use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::opening::Opening;

slotmap::new_key_type! {
    /// Unique identifier for a wall in the wall graph.
    pub struct WallId;
}

/// A straight wall between two distinct nodes.
///
/// The wall's centerline runs from `start` to `end`; its left side is the
/// side on the left when walking that direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub start: NodeId,
    pub end: NodeId,
    pub thickness: f64,
    /// Per-wall height override; falls back to the generator default.
    #[serde(default)]
    pub height: Option<f64>,
    /// Openings ordered by insertion.
    #[serde(default)]
    pub openings: Vec<Opening>,
}

impl Wall {
    /// Creates a wall without openings.
    #[must_use]
    pub fn new(start: NodeId, end: NodeId, thickness: f64) -> Self {
        Self {
            start,
            end,
            thickness,
            height: None,
            openings: Vec::new(),
        }
    }

    /// Returns `true` if the wall touches the node.
    #[must_use]
    pub fn touches(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }

    /// Returns the endpoint opposite to `node`.
    #[must_use]
    pub fn other_end(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }
}
