use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};
use crate::tessellation::TriangleMesh;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    #[must_use]
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Volume of the box itself.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// `true` if `p` is inside or within `eps` of the box.
    #[must_use]
    pub fn contains(&self, p: &Point3, eps: f64) -> bool {
        (0..3).all(|k| p[k] >= self.min[k] - eps && p[k] <= self.max[k] + eps)
    }
}

/// Computes the axis-aligned bounding box of a mesh.
pub struct BoundingBox<'a> {
    mesh: &'a TriangleMesh,
}

impl<'a> BoundingBox<'a> {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        Self { mesh }
    }

    /// Executes the query, returning the AABB of all vertices.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyResultGeometry`] if the mesh has no
    /// vertices or any coordinate is not finite.
    pub fn execute(&self) -> Result<Aabb> {
        if self.mesh.vertices.is_empty() || !self.mesh.is_finite() {
            return Err(GeometryError::EmptyResultGeometry.into());
        }
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.mesh.vertices {
            min = min.inf(p);
            max = max.sup(p);
        }
        Ok(Aabb { min, max })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use approx::assert_relative_eq;

    #[test]
    fn box_bounds() {
        let mesh = MakeBox::new(Point3::new(-1.0, 2.0, 0.0), Point3::new(3.0, 5.0, 10.0))
            .execute()
            .unwrap();
        let bb = BoundingBox::new(&mesh).execute().unwrap();
        assert_relative_eq!(bb.min, Point3::new(-1.0, 2.0, 0.0));
        assert_relative_eq!(bb.max, Point3::new(3.0, 5.0, 10.0));
        assert_relative_eq!(bb.volume(), 120.0);
        assert_relative_eq!(bb.center(), Point3::new(1.0, 3.5, 5.0));
        assert!(bb.contains(&Point3::new(3.0, 5.0, 10.0), 0.0));
        assert!(!bb.contains(&Point3::new(3.1, 5.0, 10.0), 0.01));
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        assert!(BoundingBox::new(&TriangleMesh::new()).execute().is_err());
    }
}
