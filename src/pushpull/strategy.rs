use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Point3, Vector3};
use crate::scene::FaceDescriptor;
use crate::tessellation::TriangleMesh;

/// Mesh geometry as flat arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryPayload {
    /// `x, y, z` for every vertex.
    pub positions: Vec<f64>,
    /// Three vertex indices per triangle; absent means every three
    /// consecutive positions form a triangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
}

impl GeometryPayload {
    #[must_use]
    pub fn from_mesh(mesh: &TriangleMesh) -> Self {
        Self {
            positions: mesh.vertices.iter().flat_map(|p| [p.x, p.y, p.z]).collect(),
            indices: Some(mesh.indices.iter().flatten().copied().collect()),
        }
    }

    /// Decodes the payload into a flat-shaded mesh.
    ///
    /// # Errors
    ///
    /// Returns a [`StrategyError`] for ragged arrays, out-of-range indices,
    /// or non-finite coordinates.
    pub fn to_mesh(&self) -> Result<TriangleMesh, StrategyError> {
        if self.positions.len() % 3 != 0 {
            return Err(StrategyError::new("positions length is not a multiple of 3"));
        }
        if self.positions.iter().any(|c| !c.is_finite()) {
            return Err(StrategyError::new("positions contain non-finite values"));
        }
        let vertices: Vec<Point3> = self
            .positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        let indices: Vec<u32> = match &self.indices {
            Some(indices) => indices.clone(),
            None => (0..u32::try_from(vertices.len()).map_err(|_| StrategyError::new("too many vertices"))?)
                .collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(StrategyError::new("index count is not a multiple of 3"));
        }

        let mut mesh = TriangleMesh::new();
        for tri in indices.chunks_exact(3) {
            let corner = |k: usize| {
                vertices
                    .get(tri[k] as usize)
                    .copied()
                    .ok_or_else(|| StrategyError::new(format!("index {} out of range", tri[k])))
            };
            mesh.push_triangle(corner(0)?, corner(1)?, corner(2)?);
        }
        Ok(mesh)
    }
}

/// The face being pushed, in the geometry's coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacePayload {
    pub normal: [f64; 3],
    pub plane_offset: f64,
    pub center: [f64; 3],
    /// Positions of every vertex of the face.
    pub vertices: Vec<[f64; 3]>,
}

impl FacePayload {
    #[must_use]
    pub fn from_face(face: &FaceDescriptor, mesh: &TriangleMesh) -> Self {
        Self {
            normal: face.normal.into(),
            plane_offset: face.plane_offset,
            center: face.center.coords.into(),
            vertices: face
                .vertex_indices
                .iter()
                .filter_map(|&i| mesh.vertices.get(i))
                .map(|p| p.coords.into())
                .collect(),
        }
    }

    #[must_use]
    pub fn normal(&self) -> Vector3 {
        Vector3::from(self.normal)
    }
}

/// Request sent to a re-extrusion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReExtrusionRequest {
    /// Geometry as it was before the drag.
    pub geometry: GeometryPayload,
    pub face: FacePayload,
    /// Signed distance along the face normal.
    pub distance: f64,
}

/// Replacement geometry returned by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReExtrusionResponse {
    pub geometry: GeometryPayload,
}

/// Transport-independent strategy failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StrategyError {
    pub message: String,
}

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Produces a manifold replacement mesh for a committed push-pull.
///
/// Implementations may run in-process or forward the request to a remote
/// service; the engine only sees the request and the response.
pub trait ReExtrusionStrategy {
    /// # Errors
    ///
    /// Returns a [`StrategyError`] describing why no geometry was produced.
    fn re_extrude(&self, request: &ReExtrusionRequest) -> Result<ReExtrusionResponse, StrategyError>;
}
