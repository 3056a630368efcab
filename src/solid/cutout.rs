use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::{Opening, OpeningAlignment, OpeningKind, OpeningOrientation, WallGraph, WallId};
use crate::math::polygon_2d::{left_normal, segment_direction};
use crate::math::{Isometry3, Point2, Point3, UnitQuaternion, Vector2, Vector3};
use crate::operations::creation::MakeBox;
use crate::tessellation::TriangleMesh;

/// Where the rendering collaborator puts an opening's asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningPlacement {
    /// Bottom-center anchor of the asset, in world space.
    pub position: Point3,
    /// Rotation about +Z aligning the asset's X axis with the wall.
    pub rotation: UnitQuaternion,
    /// Uniform scale applied to the asset.
    pub scale: f64,
}

/// A wall's centerline frame: X along the wall, Y to its left, Z up.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WallFrame {
    pub start: Point2,
    pub dir: Vector2,
    pub normal: Vector2,
    pub length: f64,
    pub thickness: f64,
}

impl WallFrame {
    pub fn new(graph: &WallGraph, wall_id: WallId) -> std::result::Result<Self, GraphError> {
        let wall = graph.wall(wall_id)?;
        let (a, b) = graph.wall_endpoints(wall_id)?;
        let (dir, length) = segment_direction(&a, &b, graph.tolerances().len).ok_or(
            GraphError::DegenerateWall {
                length: (b - a).norm(),
            },
        )?;
        Ok(Self {
            start: a,
            dir,
            normal: left_normal(&dir),
            length,
            thickness: wall.thickness,
        })
    }

    pub fn angle(&self) -> f64 {
        self.dir.y.atan2(self.dir.x)
    }

    /// Point `along` the centerline, pushed `across` to the left, at height `z`.
    pub fn point(&self, along: f64, across: f64, z: f64) -> Point3 {
        let p = self.start + self.dir * along + self.normal * across;
        Point3::new(p.x, p.y, z)
    }

    fn isometry(&self, along: f64) -> Isometry3 {
        let origin = self.point(along, 0.0, 0.0);
        Isometry3::new(origin.coords, Vector3::z() * self.angle())
    }

    /// Box in frame coordinates: `x` centered at `along`, `y` centered on the
    /// centerline, `z` from `z0` to `z1`.
    pub fn local_box(&self, along: f64, width: f64, depth: f64, z0: f64, z1: f64) -> Result<TriangleMesh> {
        let mesh = MakeBox::new(
            Point3::new(-width * 0.5, -depth * 0.5, z0),
            Point3::new(width * 0.5, depth * 0.5, z1),
        )
        .execute()?;
        Ok(mesh.transformed(&self.isometry(along)))
    }
}

/// Oriented box removed from the wall for one opening.
///
/// Uses the fitted asset size, spans the full wall thickness plus
/// `clearance`, and for doors reaches `clearance / 2` below the floor so the
/// cut never leaves a sliver on the bottom cap.
pub(crate) fn cutout_box(frame: &WallFrame, opening: &Opening, clearance: f64) -> Result<TriangleMesh> {
    let fitted = opening.fitted_size();
    let base = opening.base_height();
    let z0 = match opening.kind {
        OpeningKind::Door => -clearance * 0.5,
        OpeningKind::Window => base,
    };
    frame.local_box(
        opening.position,
        fitted.width,
        frame.thickness + clearance,
        z0,
        base + fitted.height,
    )
}

pub(crate) fn opening_placement(frame: &WallFrame, opening: &Opening) -> OpeningPlacement {
    let fitted = opening.fitted_size();
    let asset_depth = opening.asset.map_or(0.0, |a| a.depth) * fitted.scale;
    let inset = frame.thickness * 0.5 - asset_depth * 0.5;
    let across = match opening.alignment {
        OpeningAlignment::Center => 0.0,
        OpeningAlignment::Interior => inset,
        OpeningAlignment::Exterior => -inset,
    };
    let turn = match opening.orientation {
        OpeningOrientation::Normal => 0.0,
        OpeningOrientation::Flipped => PI,
    };
    OpeningPlacement {
        position: frame.point(opening.position, across, opening.base_height()),
        rotation: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), frame.angle() + turn),
        scale: fitted.scale,
    }
}
