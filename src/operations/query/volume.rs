use crate::math::Vector3;
use crate::tessellation::TriangleMesh;

/// Computes the enclosed volume of a closed triangle mesh.
///
/// Uses the signed tetrahedron method: for each triangle, computes
/// `(1/6) * v0 . (v1 x v2)` and sums over all triangles. Where the stored
/// normals disagree with a triangle's winding, its contribution is flipped,
/// so meshes with mixed winding still measure correctly.
pub struct Volume<'a> {
    mesh: &'a TriangleMesh,
}

impl<'a> Volume<'a> {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        Self { mesh }
    }

    /// Executes the query, returning the volume (absolute value).
    #[must_use]
    pub fn execute(&self) -> f64 {
        let mesh = self.mesh;
        let mut signed_volume = 0.0;
        for (i, tri) in mesh.indices.iter().enumerate() {
            let Some([v0, v1, v2]) = mesh.triangle(i) else {
                continue;
            };
            let cross = (v1 - v0).cross(&(v2 - v0));
            let det = v0.coords.dot(&v1.coords.cross(&v2.coords));

            let stored = tri
                .iter()
                .filter_map(|&k| mesh.normals.get(k as usize))
                .sum::<Vector3>();
            if stored.dot(&cross) >= 0.0 {
                signed_volume += det;
            } else {
                signed_volume -= det;
            }
        }
        signed_volume.abs() / 6.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use approx::assert_relative_eq;

    #[test]
    fn unit_box() {
        let mesh = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute()
            .unwrap();
        assert_relative_eq!(Volume::new(&mesh).execute(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn offset_box_is_translation_invariant() {
        let mesh = MakeBox::new(Point3::new(100.0, -50.0, 7.0), Point3::new(102.0, -47.0, 11.0))
            .execute()
            .unwrap();
        assert_relative_eq!(Volume::new(&mesh).execute(), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn stale_normals_fix_reversed_triangle() {
        let mut mesh = MakeBox::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0))
            .execute()
            .unwrap();
        // Reverse one triangle's winding but keep its outward normals.
        mesh.indices[0].swap(1, 2);
        assert_relative_eq!(Volume::new(&mesh).execute(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_mesh_has_no_volume() {
        assert_relative_eq!(Volume::new(&TriangleMesh::new()).execute(), 0.0);
    }
}
