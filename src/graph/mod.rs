pub mod node;
pub mod opening;
pub mod snapshot;
pub mod wall;

pub use node::{NodeId, WallNode};
pub use opening::{
    AssetBounds, FittedSize, Opening, OpeningAlignment, OpeningId, OpeningKind,
    OpeningOrientation, OpeningParams,
};
pub use wall::{Wall, WallId};

use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap};

use crate::error::GraphError;
use crate::math::{Point2, Tolerances, Vector2};

/// The editable floor plan: nodes, walls and their openings.
///
/// Walls reference nodes by id only; which walls meet at a node is derived
/// on demand. Every edit validates first and leaves the graph untouched on
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallGraph {
    nodes: SlotMap<NodeId, WallNode>,
    walls: SlotMap<WallId, Wall>,
    /// Owning wall of every opening.
    openings: SlotMap<OpeningId, WallId>,
    #[serde(skip)]
    tolerances: Tolerances,
}

fn dangling(kind: &'static str, id: impl Key) -> GraphError {
    GraphError::DanglingReference {
        kind,
        id: format!("{:?}", id.data()),
    }
}

impl WallGraph {
    /// Creates a new, empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with custom tolerances.
    #[must_use]
    pub fn with_tolerances(tolerances: Tolerances) -> Self {
        Self {
            tolerances,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    // --- Queries ---

    /// Returns the node, or an error if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown id.
    pub fn node(&self, id: NodeId) -> Result<&WallNode, GraphError> {
        self.nodes.get(id).ok_or_else(|| dangling("node", id))
    }

    /// Returns the wall, or an error if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown id.
    pub fn wall(&self, id: WallId) -> Result<&Wall, GraphError> {
        self.walls.get(id).ok_or_else(|| dangling("wall", id))
    }

    /// Returns the opening, or an error if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown id.
    pub fn opening(&self, id: OpeningId) -> Result<&Opening, GraphError> {
        let wall_id = *self.openings.get(id).ok_or_else(|| dangling("opening", id))?;
        self.wall(wall_id)?
            .openings
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| dangling("opening", id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &WallNode)> {
        self.nodes.iter()
    }

    pub fn walls(&self) -> impl Iterator<Item = (WallId, &Wall)> {
        self.walls.iter()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    #[must_use]
    pub fn opening_count(&self) -> usize {
        self.openings.len()
    }

    /// Walls that start or end at `node`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown node.
    pub fn incident_walls(&self, node: NodeId) -> Result<Vec<WallId>, GraphError> {
        self.node(node)?;
        Ok(self
            .walls
            .iter()
            .filter(|(_, w)| w.touches(node))
            .map(|(id, _)| id)
            .collect())
    }

    /// Start and end positions of a wall's centerline.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown wall.
    pub fn wall_endpoints(&self, id: WallId) -> Result<(Point2, Point2), GraphError> {
        let wall = self.wall(id)?;
        Ok((
            self.node(wall.start)?.position,
            self.node(wall.end)?.position,
        ))
    }

    /// Centerline length of a wall.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown wall.
    pub fn wall_length(&self, id: WallId) -> Result<f64, GraphError> {
        let (a, b) = self.wall_endpoints(id)?;
        Ok((b - a).norm())
    }

    // --- Node edits ---

    /// Inserts a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NonFiniteCoordinate`] for NaN or infinite input.
    pub fn add_node(&mut self, position: Point2) -> Result<NodeId, GraphError> {
        check_finite(&position)?;
        Ok(self.nodes.insert(WallNode::new(position)))
    }

    /// Moves a node, re-validating every incident wall and its openings.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DegenerateWall`] if an incident wall would
    /// collapse, or [`GraphError::InvalidOpeningPlacement`] if an opening no
    /// longer fits its shortened wall.
    pub fn move_node(&mut self, id: NodeId, position: Point2) -> Result<(), GraphError> {
        check_finite(&position)?;
        self.node(id)?;
        for (_, wall) in self.walls.iter().filter(|(_, w)| w.touches(id)) {
            let other = self.node(wall.other_end(id))?.position;
            let length = (other - position).norm();
            self.check_length(length)?;
            for placed in &wall.openings {
                opening::validate_placement(
                    &placed.params(),
                    length,
                    wall.openings.iter().filter(|o| o.id != placed.id),
                    self.tolerances.len,
                )?;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.position = position;
        }
        Ok(())
    }

    /// Removes a node together with its incident walls and their openings.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown node.
    pub fn remove_node(&mut self, id: NodeId) -> Result<WallNode, GraphError> {
        for wall_id in self.incident_walls(id)? {
            self.remove_wall(wall_id)?;
        }
        self.nodes.remove(id).ok_or_else(|| dangling("node", id))
    }

    // --- Wall edits ---

    /// Adds a wall between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`], [`GraphError::InvalidThickness`],
    /// [`GraphError::DegenerateWall`] or [`GraphError::DuplicateWall`].
    pub fn add_wall(
        &mut self,
        start: NodeId,
        end: NodeId,
        thickness: f64,
    ) -> Result<WallId, GraphError> {
        let a = self.node(start)?.position;
        let b = self.node(end)?.position;
        check_thickness(thickness)?;
        if start == end {
            return Err(GraphError::DegenerateWall { length: 0.0 });
        }
        self.check_length((b - a).norm())?;
        let duplicate = self
            .walls
            .values()
            .any(|w| w.touches(start) && w.touches(end));
        if duplicate {
            return Err(GraphError::DuplicateWall);
        }
        Ok(self.walls.insert(Wall::new(start, end, thickness)))
    }

    /// Changes a wall's thickness.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] or [`GraphError::InvalidThickness`].
    pub fn set_wall_thickness(&mut self, id: WallId, thickness: f64) -> Result<(), GraphError> {
        check_thickness(thickness)?;
        let wall = self.walls.get_mut(id).ok_or_else(|| dangling("wall", id))?;
        wall.thickness = thickness;
        Ok(())
    }

    /// Overrides (or clears) a wall's extrusion height.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] or [`GraphError::DegenerateWall`]
    /// for a non-positive height.
    pub fn set_wall_height(&mut self, id: WallId, height: Option<f64>) -> Result<(), GraphError> {
        if let Some(h) = height {
            if !h.is_finite() {
                return Err(GraphError::NonFiniteCoordinate);
            }
            self.check_length(h)?;
        }
        let wall = self.walls.get_mut(id).ok_or_else(|| dangling("wall", id))?;
        wall.height = height;
        Ok(())
    }

    /// Splits a wall at the projection of `at` onto its centerline.
    ///
    /// The original wall keeps the start half; a new wall covers the end
    /// half. Openings move with the half that contains them.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DegenerateWall`] if either half would be too
    /// short, or [`GraphError::InvalidOpeningPlacement`] if an opening
    /// straddles the split point.
    pub fn split_wall(&mut self, id: WallId, at: Point2) -> Result<(NodeId, WallId), GraphError> {
        check_finite(&at)?;
        let (a, b) = self.wall_endpoints(id)?;
        let length = (b - a).norm();
        let dir: Vector2 = (b - a) / length;
        let t = (at - a).dot(&dir);
        self.check_length(t)?;
        self.check_length(length - t)?;

        let wall = self.wall(id)?;
        let eps = self.tolerances.len;
        if let Some(o) = wall.openings.iter().find(|o| {
            let (lo, hi) = o.extent();
            lo < t - eps && hi > t + eps
        }) {
            return Err(GraphError::InvalidOpeningPlacement(format!(
                "split at {t} cuts through opening centered at {}",
                o.position
            )));
        }

        let (end, thickness, height) = (wall.end, wall.thickness, wall.height);
        let (keep, moved): (Vec<Opening>, Vec<Opening>) =
            wall.openings.iter().cloned().partition(|o| o.extent().1 <= t + eps);

        let mid = self.nodes.insert(WallNode::new(a + dir * t));
        let new_wall = self.walls.insert(Wall {
            start: mid,
            end,
            thickness,
            height,
            openings: Vec::new(),
        });
        let moved: Vec<Opening> = moved
            .into_iter()
            .map(|mut o| {
                o.position -= t;
                o.wall = new_wall;
                o
            })
            .collect();
        for o in &moved {
            if let Some(owner) = self.openings.get_mut(o.id) {
                *owner = new_wall;
            }
        }
        if let Some(w) = self.walls.get_mut(new_wall) {
            w.openings = moved;
        }
        if let Some(w) = self.walls.get_mut(id) {
            w.end = mid;
            w.openings = keep;
        }
        Ok((mid, new_wall))
    }

    /// Removes a wall and its openings. Its nodes are kept.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown wall.
    pub fn remove_wall(&mut self, id: WallId) -> Result<Wall, GraphError> {
        let wall = self.walls.remove(id).ok_or_else(|| dangling("wall", id))?;
        for o in &wall.openings {
            self.openings.remove(o.id);
        }
        Ok(wall)
    }

    // --- Opening edits ---

    /// Adds an opening to a wall.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOpeningPlacement`] if the opening is
    /// malformed, exceeds the wall, or overlaps another opening.
    pub fn add_opening(
        &mut self,
        wall_id: WallId,
        params: OpeningParams,
    ) -> Result<OpeningId, GraphError> {
        let length = self.wall_length(wall_id)?;
        let wall = self.wall(wall_id)?;
        opening::validate_placement(&params, length, &wall.openings, self.tolerances.len)?;

        let id = self.openings.insert(wall_id);
        if let Some(wall) = self.walls.get_mut(wall_id) {
            wall.openings.push(Opening::from_params(id, wall_id, &params));
        }
        Ok(id)
    }

    /// Replaces an opening's parameters in place.
    ///
    /// # Errors
    ///
    /// Same as [`add_opening`](Self::add_opening).
    pub fn update_opening(&mut self, id: OpeningId, params: OpeningParams) -> Result<(), GraphError> {
        let wall_id = *self.openings.get(id).ok_or_else(|| dangling("opening", id))?;
        let length = self.wall_length(wall_id)?;
        let wall = self.wall(wall_id)?;
        opening::validate_placement(
            &params,
            length,
            wall.openings.iter().filter(|o| o.id != id),
            self.tolerances.len,
        )?;
        if let Some(slot) = self
            .walls
            .get_mut(wall_id)
            .and_then(|w| w.openings.iter_mut().find(|o| o.id == id))
        {
            *slot = Opening::from_params(id, wall_id, &params);
        }
        Ok(())
    }

    /// Removes an opening.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown opening.
    pub fn remove_opening(&mut self, id: OpeningId) -> Result<Opening, GraphError> {
        let wall_id = self.openings.remove(id).ok_or_else(|| dangling("opening", id))?;
        let wall = self
            .walls
            .get_mut(wall_id)
            .ok_or_else(|| dangling("wall", wall_id))?;
        let index = wall
            .openings
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| dangling("opening", id))?;
        Ok(wall.openings.remove(index))
    }

    // --- Validation helpers ---

    fn check_length(&self, length: f64) -> Result<(), GraphError> {
        if length < self.tolerances.len {
            return Err(GraphError::DegenerateWall { length });
        }
        Ok(())
    }

    /// Verifies every cross-reference and per-wall invariant.
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        let mut seen = 0;
        for (wall_id, wall) in &self.walls {
            let a = self.node(wall.start)?.position;
            let b = self.node(wall.end)?.position;
            check_thickness(wall.thickness)?;
            if wall.start == wall.end {
                return Err(GraphError::DegenerateWall { length: 0.0 });
            }
            let length = (b - a).norm();
            self.check_length(length)?;
            for (i, o) in wall.openings.iter().enumerate() {
                if self.openings.get(o.id) != Some(&wall_id) || o.wall != wall_id {
                    return Err(dangling("opening", o.id));
                }
                opening::validate_placement(
                    &o.params(),
                    length,
                    &wall.openings[..i],
                    self.tolerances.len,
                )?;
                seen += 1;
            }
        }
        if seen != self.openings.len() {
            return Err(GraphError::DanglingReference {
                kind: "opening",
                id: format!("{} unowned", self.openings.len() - seen),
            });
        }
        Ok(())
    }
}

fn check_finite(p: &Point2) -> Result<(), GraphError> {
    if p.x.is_finite() && p.y.is_finite() {
        Ok(())
    } else {
        Err(GraphError::NonFiniteCoordinate)
    }
}

fn check_thickness(thickness: f64) -> Result<(), GraphError> {
    if thickness.is_finite() && thickness > 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidThickness(thickness))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn straight_wall(len: f64) -> (WallGraph, NodeId, NodeId, WallId) {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(len, 0.0)).unwrap();
        let w = g.add_wall(a, b, 10.0).unwrap();
        (g, a, b, w)
    }

    // ── add_wall ──

    #[test]
    fn add_wall_between_nodes() {
        let (g, a, b, w) = straight_wall(200.0);
        assert_eq!(g.wall_count(), 1);
        assert_relative_eq!(g.wall_length(w).unwrap(), 200.0);
        assert_eq!(g.incident_walls(a).unwrap(), vec![w]);
        assert_eq!(g.incident_walls(b).unwrap(), vec![w]);
    }

    #[test]
    fn add_wall_rejects_dangling_node() {
        let (mut g, a, b, _) = straight_wall(200.0);
        g.remove_node(b).unwrap();
        let err = g.add_wall(a, b, 10.0).unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference { kind: "node", .. }));
    }

    #[test]
    fn add_wall_rejects_bad_thickness() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(10.0, 0.0)).unwrap();
        assert_eq!(g.add_wall(a, b, 0.0), Err(GraphError::InvalidThickness(0.0)));
        assert!(g.add_wall(a, b, f64::NAN).is_err());
        assert_eq!(g.wall_count(), 0);
    }

    #[test]
    fn add_wall_rejects_degenerate() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(1e-9, 0.0)).unwrap();
        assert!(matches!(g.add_wall(a, b, 10.0), Err(GraphError::DegenerateWall { .. })));
        assert!(matches!(g.add_wall(a, a, 10.0), Err(GraphError::DegenerateWall { .. })));
    }

    #[test]
    fn add_wall_rejects_duplicate_in_either_direction() {
        let (mut g, a, b, _) = straight_wall(100.0);
        assert_eq!(g.add_wall(b, a, 10.0), Err(GraphError::DuplicateWall));
    }

    #[test]
    fn add_node_rejects_nan() {
        let mut g = WallGraph::new();
        assert_eq!(g.add_node(p(f64::NAN, 0.0)), Err(GraphError::NonFiniteCoordinate));
    }

    // ── move_node ──

    #[test]
    fn move_node_updates_length() {
        let (mut g, _, b, w) = straight_wall(100.0);
        g.move_node(b, p(0.0, 50.0)).unwrap();
        assert_relative_eq!(g.wall_length(w).unwrap(), 50.0);
    }

    #[test]
    fn move_node_onto_other_end_rejected() {
        let (mut g, a, b, _) = straight_wall(100.0);
        let err = g.move_node(b, p(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, GraphError::DegenerateWall { .. }));
        assert_eq!(g.node(b).unwrap().position, p(100.0, 0.0));
        assert_eq!(g.node(a).unwrap().position, p(0.0, 0.0));
    }

    #[test]
    fn move_node_that_strands_opening_rejected() {
        let (mut g, _, b, w) = straight_wall(200.0);
        g.add_opening(w, OpeningParams::door(150.0, 80.0, 200.0)).unwrap();
        let err = g.move_node(b, p(120.0, 0.0)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidOpeningPlacement(_)));
        assert_relative_eq!(g.wall_length(w).unwrap(), 200.0);
    }

    // ── remove ──

    #[test]
    fn remove_node_cascades() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(100.0, 0.0)).unwrap();
        let c = g.add_node(p(100.0, 100.0)).unwrap();
        let w1 = g.add_wall(a, b, 10.0).unwrap();
        let w2 = g.add_wall(b, c, 10.0).unwrap();
        g.add_opening(w1, OpeningParams::door(50.0, 40.0, 200.0)).unwrap();
        g.add_opening(w2, OpeningParams::door(50.0, 40.0, 200.0)).unwrap();

        g.remove_node(b).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.wall_count(), 0);
        assert_eq!(g.opening_count(), 0);
    }

    #[test]
    fn remove_wall_keeps_nodes() {
        let (mut g, a, _, w) = straight_wall(100.0);
        let o = g.add_opening(w, OpeningParams::door(50.0, 40.0, 200.0)).unwrap();
        let removed = g.remove_wall(w).unwrap();
        assert_eq!(removed.openings.len(), 1);
        assert_eq!(g.node_count(), 2);
        assert!(g.incident_walls(a).unwrap().is_empty());
        assert!(g.opening(o).is_err());
    }

    #[test]
    fn remove_unknown_wall_is_dangling() {
        let (mut g, _, _, w) = straight_wall(100.0);
        g.remove_wall(w).unwrap();
        assert!(matches!(g.remove_wall(w), Err(GraphError::DanglingReference { .. })));
    }

    // ── split_wall ──

    #[test]
    fn split_wall_redistributes_openings() {
        let (mut g, a, b, w) = straight_wall(300.0);
        let left = g.add_opening(w, OpeningParams::door(50.0, 60.0, 200.0)).unwrap();
        let right = g
            .add_opening(w, OpeningParams::window(250.0, 60.0, 100.0, 90.0))
            .unwrap();

        let (mid, new_wall) = g.split_wall(w, p(150.0, 7.0)).unwrap();
        assert_eq!(g.node(mid).unwrap().position, p(150.0, 0.0));
        assert_eq!(g.wall(w).unwrap().start, a);
        assert_eq!(g.wall(w).unwrap().end, mid);
        assert_eq!(g.wall(new_wall).unwrap().start, mid);
        assert_eq!(g.wall(new_wall).unwrap().end, b);

        assert_relative_eq!(g.opening(left).unwrap().position, 50.0);
        let moved = g.opening(right).unwrap();
        assert_eq!(moved.wall, new_wall);
        assert_relative_eq!(moved.position, 100.0);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn split_through_opening_rejected() {
        let (mut g, _, _, w) = straight_wall(300.0);
        g.add_opening(w, OpeningParams::door(150.0, 60.0, 200.0)).unwrap();
        let err = g.split_wall(w, p(150.0, 0.0)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidOpeningPlacement(_)));
        assert_eq!(g.wall_count(), 1);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn split_at_endpoint_rejected() {
        let (mut g, _, _, w) = straight_wall(300.0);
        assert!(matches!(
            g.split_wall(w, p(0.0, 0.0)),
            Err(GraphError::DegenerateWall { .. })
        ));
        assert!(matches!(
            g.split_wall(w, p(400.0, 0.0)),
            Err(GraphError::DegenerateWall { .. })
        ));
    }

    // ── openings ──

    #[test]
    fn opening_wider_than_wall_rejected() {
        let (mut g, _, _, w) = straight_wall(200.0);
        let err = g
            .add_opening(w, OpeningParams::door(100.0, 200.5, 200.0))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidOpeningPlacement(_)));
        assert_eq!(g.opening_count(), 0);
    }

    #[test]
    fn update_opening_validates_against_siblings() {
        let (mut g, _, _, w) = straight_wall(300.0);
        let first = g.add_opening(w, OpeningParams::door(50.0, 60.0, 200.0)).unwrap();
        let second = g.add_opening(w, OpeningParams::door(200.0, 60.0, 200.0)).unwrap();

        assert!(g.update_opening(second, OpeningParams::door(70.0, 60.0, 200.0)).is_err());
        // Moving an opening over its own old extent is fine.
        g.update_opening(first, OpeningParams::door(60.0, 60.0, 200.0)).unwrap();
        assert_relative_eq!(g.opening(first).unwrap().position, 60.0);
    }

    #[test]
    fn remove_opening() {
        let (mut g, _, _, w) = straight_wall(300.0);
        let o = g.add_opening(w, OpeningParams::door(50.0, 60.0, 200.0)).unwrap();
        let removed = g.remove_opening(o).unwrap();
        assert_eq!(removed.id, o);
        assert!(g.wall(w).unwrap().openings.is_empty());
        assert!(g.remove_opening(o).is_err());
    }

    // ── heights ──

    #[test]
    fn wall_height_override() {
        let (mut g, _, _, w) = straight_wall(100.0);
        g.set_wall_height(w, Some(120.0)).unwrap();
        assert_eq!(g.wall(w).unwrap().height, Some(120.0));
        assert!(g.set_wall_height(w, Some(0.0)).is_err());
        g.set_wall_height(w, None).unwrap();
        assert_eq!(g.wall(w).unwrap().height, None);
    }
}
