use crate::error::SnapshotError;

use super::WallGraph;

impl WallGraph {
    /// Encodes the graph as JSON. Ids and coordinates round-trip exactly.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    /// Decodes a graph previously produced by [`to_json`](Self::to_json).
    ///
    /// The decoded graph is validated before it is returned, so a
    /// hand-edited snapshot cannot smuggle in dangling ids or invalid walls.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Decode`] for malformed JSON and
    /// [`SnapshotError::Inconsistent`] for a graph that breaks an invariant.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let graph: WallGraph = serde_json::from_str(json).map_err(SnapshotError::Decode)?;
        graph.validate()?;
        Ok(graph)
    }
}
