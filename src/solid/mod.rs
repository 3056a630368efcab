mod cutout;
mod scheduler;

pub use cutout::OpeningPlacement;
pub use scheduler::{RegenerationBatch, RegenerationScheduler};

use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::error::{GeometryError, GraphError};
use crate::graph::{Opening, OpeningId, WallGraph, WallId};
use crate::math::Tolerances;
use crate::operations::boolean::{validate_result, BooleanEvaluator, BspEvaluator};
use crate::operations::offset::{MiterConfig, MiteredPolygonBuilder, WallOutline};
use crate::operations::shaping::Extrude;
use crate::tessellation::TriangleMesh;

use cutout::WallFrame;

/// Parameters for turning wall outlines into solids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidConfig {
    /// Height used for walls without their own height.
    pub wall_height: f64,
    /// Extra depth added to every cutout so it clears both wall faces.
    pub cutout_clearance: f64,
    /// Passed to the outline builder; see [`MiterConfig::miter_limit`].
    pub miter_limit: f64,
    pub tolerances: Tolerances,
}

impl Default for SolidConfig {
    fn default() -> Self {
        Self {
            wall_height: 250.0,
            cutout_clearance: 1.0,
            miter_limit: MiterConfig::default().miter_limit,
            tolerances: Tolerances::default(),
        }
    }
}

/// The generated solid of one wall.
#[derive(Debug, Clone, PartialEq)]
pub struct WallSolid {
    pub wall: WallId,
    /// Flat-shaded, closed mesh.
    pub mesh: TriangleMesh,
    /// Asset placement for every opening on the wall.
    pub placements: Vec<(OpeningId, OpeningPlacement)>,
    /// Recovered problems; the mesh is the fallback geometry when non-empty.
    pub errors: Vec<GeometryError>,
}

/// Extrudes every wall outline and cuts its openings.
///
/// The graph is read only; every call returns freshly built meshes. Walls
/// are generated in parallel and independently, so one wall's failure only
/// affects that wall.
pub struct SolidGenerator<'a> {
    graph: &'a WallGraph,
    config: SolidConfig,
    evaluator: &'a dyn BooleanEvaluator,
}

impl<'a> SolidGenerator<'a> {
    /// Creates a new generator using the built-in BSP evaluator.
    #[must_use]
    pub fn new(graph: &'a WallGraph, config: SolidConfig) -> Self {
        Self {
            graph,
            config,
            evaluator: &BspEvaluator,
        }
    }

    /// Uses a different boolean backend.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: &'a dyn BooleanEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Generates solids for all walls, in graph iteration order.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] only if the graph itself is inconsistent.
    pub fn execute(&self) -> Result<Vec<WallSolid>, GraphError> {
        let outlines = self.outlines()?;
        let solids = outlines
            .par_iter()
            .map(|outline| self.generate_wall(outline))
            .collect::<Result<Vec<_>, _>>()?;
        let fallbacks = solids.iter().filter(|s| !s.errors.is_empty()).count();
        debug!(walls = solids.len(), fallbacks, "generated wall solids");
        Ok(solids)
    }

    /// Generates the solid of a single wall.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] for an unknown wall.
    pub fn execute_wall(&self, wall_id: WallId) -> Result<WallSolid, GraphError> {
        let outline =
            MiteredPolygonBuilder::new(self.graph, self.miter_config()).build_wall(wall_id)?;
        self.generate_wall(&outline)
    }

    pub(crate) fn outlines(&self) -> Result<Vec<WallOutline>, GraphError> {
        MiteredPolygonBuilder::new(self.graph, self.miter_config()).execute()
    }

    fn miter_config(&self) -> MiterConfig {
        MiterConfig {
            tolerances: self.config.tolerances,
            miter_limit: self.config.miter_limit,
        }
    }

    /// Builds the prism for one outline and subtracts its openings.
    #[instrument(skip_all, fields(wall = ?outline.wall))]
    pub(crate) fn generate_wall(&self, outline: &WallOutline) -> Result<WallSolid, GraphError> {
        let wall = self.graph.wall(outline.wall)?;
        let frame = WallFrame::new(self.graph, outline.wall)?;
        let height = wall.height.unwrap_or(self.config.wall_height);
        let mut errors: Vec<GeometryError> = outline.fallback.iter().cloned().collect();

        let prism = match Extrude::vertical(&outline.polygon, height).execute() {
            Ok(mesh) => mesh,
            Err(err) => {
                let err = into_geometry_error(err);
                warn!(wall = ?outline.wall, reason = %err, "extrusion failed; using centerline box");
                errors.push(err);
                frame
                    .local_box(frame.length * 0.5, frame.length, frame.thickness, 0.0, height)
                    .map_err(|_| GraphError::DegenerateWall {
                        length: frame.length,
                    })?
            }
        };

        let placements = wall
            .openings
            .iter()
            .map(|o| (o.id, cutout::opening_placement(&frame, o)))
            .collect();

        if wall.openings.is_empty() {
            return Ok(WallSolid {
                wall: outline.wall,
                mesh: prism,
                placements,
                errors,
            });
        }

        let mesh = match self.cut_openings(&frame, &prism, &wall.openings) {
            Ok(mesh) => mesh,
            Err(err) => {
                warn!(wall = ?outline.wall, reason = %err, "opening cut failed; using uncut prism");
                errors.push(err);
                prism
            }
        };
        Ok(WallSolid {
            wall: outline.wall,
            mesh,
            placements,
            errors,
        })
    }

    fn cut_openings(
        &self,
        frame: &WallFrame,
        prism: &TriangleMesh,
        openings: &[Opening],
    ) -> Result<TriangleMesh, GeometryError> {
        let mut cutter: Option<TriangleMesh> = None;
        for opening in openings {
            let cut = cutout::cutout_box(frame, opening, self.config.cutout_clearance)
                .map_err(into_geometry_error)?;
            cutter = Some(match cutter {
                None => cut,
                Some(acc) => validate_result(&self.evaluator.union(&acc, &cut)?)?,
            });
        }
        let Some(cutter) = cutter else {
            return Ok(prism.clone());
        };
        validate_result(&self.evaluator.subtract(prism, &cutter)?)
    }
}

fn into_geometry_error(err: crate::WallcraftError) -> GeometryError {
    match err {
        crate::WallcraftError::Geometry(g) => g,
        other => GeometryError::BooleanEvaluationFailed(other.to_string()),
    }
}
