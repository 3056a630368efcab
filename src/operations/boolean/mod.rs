mod bsp;
mod plane;
mod polygon;

use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::tessellation::TriangleMesh;

use bsp::BspNode;
use polygon::Polygon;

/// A mesh boolean backend.
///
/// Inputs are closed, outward-wound triangle meshes. Implementations return
/// raw results; [`Subtract`] and [`Union`] reject degenerate output.
pub trait BooleanEvaluator: Send + Sync {
    /// Computes `a - b`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::BooleanEvaluationFailed`] if the inputs cannot
    /// be evaluated.
    fn subtract(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
    ) -> std::result::Result<TriangleMesh, GeometryError>;

    /// Computes `a ∪ b`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::BooleanEvaluationFailed`] if the inputs cannot
    /// be evaluated.
    fn union(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
    ) -> std::result::Result<TriangleMesh, GeometryError>;
}

/// Binary space partitioning boolean evaluator.
///
/// Splits both operands by each other's face planes and keeps fragments by
/// side, so results are exact for planar input up to the split tolerance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BspEvaluator;

impl BspEvaluator {
    fn polygons(
        mesh: &TriangleMesh,
        operand: &str,
    ) -> std::result::Result<Vec<Polygon>, GeometryError> {
        if !mesh.is_finite() {
            return Err(GeometryError::BooleanEvaluationFailed(format!(
                "{operand} operand has non-finite coordinates"
            )));
        }
        Ok((0..mesh.triangle_count())
            .filter_map(|i| mesh.triangle(i))
            .filter_map(|[a, b, c]| Polygon::from_triangle(a, b, c))
            .collect())
    }

    fn to_mesh(polygons: &[Polygon]) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for poly in polygons {
            let Some((first, rest)) = poly.vertices.split_first() else {
                continue;
            };
            for pair in rest.windows(2) {
                mesh.push_triangle(*first, pair[0], pair[1]);
            }
        }
        mesh
    }
}

impl BooleanEvaluator for BspEvaluator {
    fn subtract(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
    ) -> std::result::Result<TriangleMesh, GeometryError> {
        let polys_a = Self::polygons(a, "left")?;
        let polys_b = Self::polygons(b, "right")?;
        if polys_a.is_empty() {
            return Ok(TriangleMesh::new());
        }
        if polys_b.is_empty() {
            return Ok(a.to_flat_shaded());
        }

        let mut tree_a = BspNode::new(polys_a);
        let mut tree_b = BspNode::new(polys_b);
        tree_a.invert();
        tree_a.clip_to(&tree_b);
        tree_b.clip_to(&tree_a);
        tree_b.invert();
        tree_b.clip_to(&tree_a);
        tree_b.invert();
        tree_a.build(tree_b.all_polygons());
        tree_a.invert();

        let polygons = tree_a.all_polygons();
        debug!(polygons = polygons.len(), "bsp subtract");
        Ok(Self::to_mesh(&polygons))
    }

    fn union(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
    ) -> std::result::Result<TriangleMesh, GeometryError> {
        let polys_a = Self::polygons(a, "left")?;
        let polys_b = Self::polygons(b, "right")?;
        if polys_a.is_empty() {
            return Ok(b.to_flat_shaded());
        }
        if polys_b.is_empty() {
            return Ok(a.to_flat_shaded());
        }

        let mut tree_a = BspNode::new(polys_a);
        let mut tree_b = BspNode::new(polys_b);
        tree_a.clip_to(&tree_b);
        tree_b.clip_to(&tree_a);
        tree_b.invert();
        tree_b.clip_to(&tree_a);
        tree_b.invert();
        tree_a.build(tree_b.all_polygons());

        let polygons = tree_a.all_polygons();
        debug!(polygons = polygons.len(), "bsp union");
        Ok(Self::to_mesh(&polygons))
    }
}

/// Rejects empty or non-finite boolean output and flat-shades the rest.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyResultGeometry`] for degenerate meshes.
pub fn validate_result(mesh: &TriangleMesh) -> std::result::Result<TriangleMesh, GeometryError> {
    if mesh.is_degenerate() {
        return Err(GeometryError::EmptyResultGeometry);
    }
    Ok(mesh.to_flat_shaded())
}

/// Computes the boolean subtraction of one mesh from another.
pub struct Subtract<'a> {
    mesh_a: &'a TriangleMesh,
    mesh_b: &'a TriangleMesh,
}

impl<'a> Subtract<'a> {
    /// Creates a new `Subtract` operation (A - B).
    #[must_use]
    pub fn new(mesh_a: &'a TriangleMesh, mesh_b: &'a TriangleMesh) -> Self {
        Self { mesh_a, mesh_b }
    }

    /// Executes the subtraction with the built-in [`BspEvaluator`].
    ///
    /// # Errors
    ///
    /// See [`Subtract::execute_with`].
    pub fn execute(&self) -> Result<TriangleMesh> {
        self.execute_with(&BspEvaluator)
    }

    /// Executes the subtraction with a caller-supplied evaluator, returning a
    /// flat-shaded mesh.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::BooleanEvaluationFailed`] if the evaluator
    /// fails, or [`GeometryError::EmptyResultGeometry`] if the result has no
    /// triangles or non-finite coordinates.
    pub fn execute_with(&self, evaluator: &dyn BooleanEvaluator) -> Result<TriangleMesh> {
        let mesh = evaluator.subtract(self.mesh_a, self.mesh_b)?;
        Ok(validate_result(&mesh)?)
    }
}

/// Computes the boolean union of two meshes.
pub struct Union<'a> {
    mesh_a: &'a TriangleMesh,
    mesh_b: &'a TriangleMesh,
}

impl<'a> Union<'a> {
    /// Creates a new `Union` operation.
    #[must_use]
    pub fn new(mesh_a: &'a TriangleMesh, mesh_b: &'a TriangleMesh) -> Self {
        Self { mesh_a, mesh_b }
    }

    /// Executes the union with the built-in [`BspEvaluator`].
    ///
    /// # Errors
    ///
    /// See [`Union::execute_with`].
    pub fn execute(&self) -> Result<TriangleMesh> {
        self.execute_with(&BspEvaluator)
    }

    /// Executes the union with a caller-supplied evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::BooleanEvaluationFailed`] if the evaluator
    /// fails, or [`GeometryError::EmptyResultGeometry`] for degenerate output.
    pub fn execute_with(&self, evaluator: &dyn BooleanEvaluator) -> Result<TriangleMesh> {
        let mesh = evaluator.union(self.mesh_a, self.mesh_b)?;
        Ok(validate_result(&mesh)?)
    }
}
