use serde::{Deserialize, Serialize};

use crate::math::Point2;

slotmap::new_key_type! {
    /// Unique identifier for a node in the wall graph.
    pub struct NodeId;
}

/// A wall junction or wall end in the floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallNode {
    /// Plan position of the node.
    pub position: Point2,
}

impl WallNode {
    /// Creates a new node at the given position.
    #[must_use]
    pub fn new(position: Point2) -> Self {
        Self { position }
    }
}
