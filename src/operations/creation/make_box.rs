use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};
use crate::tessellation::TriangleMesh;

/// Corner `i` has x from bit 0, y from bit 1, z from bit 2.
const QUADS: [[usize; 4]; 6] = [
    [0, 2, 3, 1], // -z
    [4, 5, 7, 6], // +z
    [0, 1, 5, 4], // -y
    [2, 6, 7, 3], // +y
    [0, 4, 6, 2], // -x
    [1, 3, 7, 5], // +x
];

/// Creates an axis-aligned box mesh from two corner points.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Box centered on `center` with the given half extents.
    #[must_use]
    pub fn centered(center: Point3, half_extents: Vector3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Executes the operation, returning a closed, outward-wound mesh of
    /// 12 flat-shaded triangles.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidDimensions`] unless every component
    /// of `max_corner - min_corner` is finite and positive.
    pub fn execute(&self) -> Result<TriangleMesh> {
        let size = self.max_corner - self.min_corner;
        if !size.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(GeometryError::InvalidDimensions(format!(
                "box size {} x {} x {} must be positive",
                size.x, size.y, size.z
            ))
            .into());
        }

        let (lo, hi) = (self.min_corner, self.max_corner);
        let corner = |i: usize| {
            Point3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            )
        };

        let mut mesh = TriangleMesh::new();
        for [a, b, c, d] in QUADS {
            mesh.push_triangle(corner(a), corner(b), corner(c));
            mesh.push_triangle(corner(a), corner(c), corner(d));
        }
        Ok(mesh)
    }
}
