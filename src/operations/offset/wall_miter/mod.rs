mod junction;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{GeometryError, GraphError};
use crate::graph::{NodeId, WallGraph, WallId};
use crate::math::polygon_2d::{
    is_simple_polygon, left_normal, remove_near_duplicates, segment_direction, signed_area_2d,
};
use crate::math::{Point2, Tolerances};

use junction::WallEnd;

/// Parameters controlling corner generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiterConfig {
    pub tolerances: Tolerances,
    /// Maximum distance of a miter corner from its node, in multiples of
    /// the wall's half thickness. Longer miters are bevelled.
    pub miter_limit: f64,
}

impl Default for MiterConfig {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            miter_limit: 4.0,
        }
    }
}

/// The plan outline of one wall.
#[derive(Debug, Clone, PartialEq)]
pub struct WallOutline {
    pub wall: WallId,
    /// Simple, counter-clockwise loop of at least four points.
    pub polygon: Vec<Point2>,
    /// Set when the mitered outline was unusable and square caps were used.
    pub fallback: Option<GeometryError>,
}

/// Builds one mitered outline polygon per wall from a wall graph.
///
/// At every node, incident walls are sorted by angle and each wall's offset
/// lines are intersected with its angular neighbours' to find shared corner
/// points. Open ends are capped square. Nodes with three or more walls add
/// the node center so each wall covers its own wedge of the junction.
#[derive(Debug)]
pub struct MiteredPolygonBuilder<'a> {
    graph: &'a WallGraph,
    config: MiterConfig,
}

impl<'a> MiteredPolygonBuilder<'a> {
    /// Creates a new builder over a graph snapshot.
    #[must_use]
    pub fn new(graph: &'a WallGraph, config: MiterConfig) -> Self {
        Self { graph, config }
    }

    /// Builds outlines for every wall in the graph.
    ///
    /// Walls whose miter is unusable fall back to a plain rectangle; the
    /// reason is recorded on the returned outline.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] only if the graph itself is inconsistent.
    pub fn execute(&self) -> Result<Vec<WallOutline>, GraphError> {
        let mut ends: HashMap<(WallId, bool), Vec<Point2>> = HashMap::new();
        for (node_id, _) in self.graph.nodes() {
            for end in junction::resolve_node(self.graph, node_id, &self.config)? {
                ends.insert((end.wall, end.at_start), end.points);
            }
        }

        let mut outlines = Vec::with_capacity(self.graph.wall_count());
        for (wall_id, _) in self.graph.walls() {
            let start = ends.remove(&(wall_id, true)).unwrap_or_default();
            let end = ends.remove(&(wall_id, false)).unwrap_or_default();
            outlines.push(self.assemble(wall_id, start, end)?);
        }
        debug!(walls = outlines.len(), "built wall outlines");
        Ok(outlines)
    }

    /// Builds the outline of a single wall.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown wall.
    pub fn build_wall(&self, wall_id: WallId) -> Result<WallOutline, GraphError> {
        let wall = self.graph.wall(wall_id)?;
        let start = self.end_points(wall.start, wall_id, true)?;
        let end = self.end_points(wall.end, wall_id, false)?;
        self.assemble(wall_id, start, end)
    }

    fn end_points(
        &self,
        node: NodeId,
        wall_id: WallId,
        at_start: bool,
    ) -> Result<Vec<Point2>, GraphError> {
        Ok(junction::resolve_node(self.graph, node, &self.config)?
            .into_iter()
            .find(|e: &WallEnd| e.wall == wall_id && e.at_start == at_start)
            .map(|e| e.points)
            .unwrap_or_default())
    }

    /// Joins the start-end and end-end point runs into one loop and checks
    /// that it is usable.
    fn assemble(
        &self,
        wall_id: WallId,
        start: Vec<Point2>,
        end: Vec<Point2>,
    ) -> Result<WallOutline, GraphError> {
        let eps = self.config.tolerances.len;
        let mut polygon = start;
        polygon.extend(end);
        let polygon = remove_near_duplicates(&polygon, eps);

        if polygon.len() >= 4 && signed_area_2d(&polygon) > 0.0 && is_simple_polygon(&polygon, eps) {
            return Ok(WallOutline {
                wall: wall_id,
                polygon,
                fallback: None,
            });
        }

        let error = GeometryError::MiterDegenerate {
            wall: format!("{wall_id:?}"),
        };
        warn!(wall = ?wall_id, points = polygon.len(), "{error}");
        Ok(WallOutline {
            wall: wall_id,
            polygon: self.square_outline(wall_id)?,
            fallback: Some(error),
        })
    }

    /// Unmitered rectangle around the wall centerline.
    fn square_outline(&self, wall_id: WallId) -> Result<Vec<Point2>, GraphError> {
        let wall = self.graph.wall(wall_id)?;
        let (a, b) = self.graph.wall_endpoints(wall_id)?;
        let (dir, _) = segment_direction(&a, &b, self.config.tolerances.len).ok_or(
            GraphError::DegenerateWall {
                length: (b - a).norm(),
            },
        )?;
        let n = left_normal(&dir) * (wall.thickness * 0.5);
        Ok(vec![a - n, b - n, b + n, a + n])
    }
}
