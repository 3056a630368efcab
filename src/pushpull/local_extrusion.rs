use tracing::debug;

use crate::math::{Point3, Tolerances};
use crate::operations::boolean::{validate_result, BooleanEvaluator, BspEvaluator};
use crate::operations::query::{FaceGroup, FaceIndex};
use crate::operations::shaping::{boundary_edges, extrude_patch};
use crate::tessellation::TriangleMesh;

use super::strategy::{
    GeometryPayload, ReExtrusionRequest, ReExtrusionResponse, ReExtrusionStrategy, StrategyError,
};

/// In-process re-extrusion.
///
/// Pulling a face out translates it and stitches a ring of side walls along
/// its boundary loops, so the result stays closed and gains real side
/// faces. Pushing a face in subtracts the swept footprint from the solid.
pub struct LocalExtrusion {
    tolerances: Tolerances,
    /// How far the subtraction cutter starts outside the pushed face.
    clearance: f64,
    evaluator: Box<dyn BooleanEvaluator>,
}

impl Default for LocalExtrusion {
    fn default() -> Self {
        Self::new(Tolerances::default())
    }
}

impl LocalExtrusion {
    #[must_use]
    pub fn new(tolerances: Tolerances) -> Self {
        Self {
            tolerances,
            clearance: 1.0,
            evaluator: Box::new(BspEvaluator),
        }
    }

    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Box<dyn BooleanEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Locates the face described by the request in the decoded mesh.
    fn find_face(&self, mesh: &TriangleMesh, request: &ReExtrusionRequest) -> Result<FaceGroup, StrategyError> {
        let normal = request.face.normal();
        let len = normal.norm();
        if !len.is_finite() || len < self.tolerances.len {
            return Err(StrategyError::new("face normal is zero or not finite"));
        }
        let normal = normal / len;
        let min_cos = self.tolerances.normal.cos();

        let seed = (0..mesh.triangle_count()).find(|&i| {
            let (Some(n), Some([a, b, c])) = (mesh.triangle_normal(i), mesh.triangle(i)) else {
                return false;
            };
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            n.dot(&normal) >= min_cos
                && (normal.dot(&centroid.coords) - request.face.plane_offset).abs() <= self.tolerances.plane
        });
        let seed = seed.ok_or_else(|| StrategyError::new("face is not part of the geometry"))?;

        FaceIndex::new(mesh, self.tolerances)
            .execute(seed)
            .map_err(|e| StrategyError::new(e.to_string()))
    }

    fn pull(mesh: &TriangleMesh, face: &FaceGroup, distance: f64) -> TriangleMesh {
        let offset = face.normal * distance;
        let patch = face.patch(mesh);

        let mut out = TriangleMesh::new();
        for i in (0..mesh.triangle_count()).filter(|i| face.triangle_indices.binary_search(i).is_err()) {
            if let Some([a, b, c]) = mesh.triangle(i) {
                out.push_triangle(a, b, c);
            }
        }
        for [a, b, c] in face.triangles(mesh) {
            out.push_triangle(a + offset, b + offset, c + offset);
        }
        for (a, b) in boundary_edges(&patch) {
            let (a2, b2) = (a + offset, b + offset);
            out.push_triangle(a, b, b2);
            out.push_triangle(a, b2, a2);
        }
        out
    }

    fn push(&self, mesh: &TriangleMesh, face: &FaceGroup, distance: f64) -> Result<TriangleMesh, StrategyError> {
        let lift = face.normal * self.clearance;
        let mut start = face.patch(mesh);
        for v in &mut start.vertices {
            *v += lift;
        }
        let cutter = extrude_patch(&start, &(face.normal * (distance - self.clearance)));
        self.evaluator
            .subtract(mesh, &cutter)
            .and_then(|cut| validate_result(&cut))
            .map_err(|e| StrategyError::new(e.to_string()))
    }
}

impl ReExtrusionStrategy for LocalExtrusion {
    fn re_extrude(&self, request: &ReExtrusionRequest) -> Result<ReExtrusionResponse, StrategyError> {
        let distance = request.distance;
        if !distance.is_finite() {
            return Err(StrategyError::new(format!("invalid distance {distance}")));
        }
        let mesh = request.geometry.to_mesh()?;
        if distance == 0.0 {
            return Ok(ReExtrusionResponse {
                geometry: GeometryPayload::from_mesh(&mesh),
            });
        }
        let face = self.find_face(&mesh, request)?;

        let result = if distance > 0.0 {
            Self::pull(&mesh, &face, distance)
        } else {
            self.push(&mesh, &face, distance)?
        };
        debug!(
            distance,
            face_triangles = face.triangle_indices.len(),
            triangles = result.triangle_count(),
            "local re-extrusion"
        );
        Ok(ReExtrusionResponse {
            geometry: GeometryPayload::from_mesh(&result),
        })
    }
}
