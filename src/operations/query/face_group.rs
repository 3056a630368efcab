use crate::error::{PushPullError, Result};
use crate::math::polygon_3d::triangle_area;
use crate::math::{Point3, Tolerances, Vector3};
use crate::tessellation::TriangleMesh;

/// Every triangle of one mesh lying on a given oriented plane. The triangles
/// need not be connected to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGroup {
    /// Included triangles, ascending.
    pub triangle_indices: Vec<usize>,
    /// Vertices referenced by the included triangles, ascending and unique.
    pub vertex_indices: Vec<usize>,
    /// Unit normal of the hit triangle.
    pub normal: Vector3,
    /// `normal · p` for any point `p` on the face.
    pub plane_offset: f64,
    /// Area-weighted centroid of the patch.
    pub center: Point3,
    pub area: f64,
}

impl FaceGroup {
    /// Corner positions of every included triangle, in mesh order.
    #[must_use]
    pub fn triangles(&self, mesh: &TriangleMesh) -> Vec<[Point3; 3]> {
        self.triangle_indices
            .iter()
            .filter_map(|&i| mesh.triangle(i))
            .collect()
    }

    /// The patch as a standalone mesh.
    #[must_use]
    pub fn patch(&self, mesh: &TriangleMesh) -> TriangleMesh {
        let mut out = TriangleMesh::new();
        for [a, b, c] in self.triangles(mesh) {
            out.push_triangle(a, b, c);
        }
        out
    }
}

/// Groups every triangle coplanar with a hit triangle into one logical face.
///
/// The whole mesh is scanned against the hit triangle's plane, so the result
/// does not depend on triangle order. Connectivity is not checked: disjoint
/// regions on the same plane with the same facing, such as the tops of two
/// separate blocks of equal height in one mesh, form a single face and move
/// together when pushed or pulled. A triangle's orientation is taken from
/// its stored vertex normals when they are present, so a triangle wound the
/// other way but shaded the same still joins its neighbours.
pub struct FaceIndex<'a> {
    mesh: &'a TriangleMesh,
    tolerances: Tolerances,
}

impl<'a> FaceIndex<'a> {
    /// Creates a new `FaceIndex` query.
    #[must_use]
    pub fn new(mesh: &'a TriangleMesh, tolerances: Tolerances) -> Self {
        Self { mesh, tolerances }
    }

    /// Builds the face containing triangle `hit`.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::FaceNotFound`] if `hit` is out of range or
    /// has zero area.
    pub fn execute(&self, hit: usize) -> Result<FaceGroup> {
        let not_found = PushPullError::FaceNotFound { triangle: hit };
        let normal = self.oriented_normal(hit).ok_or(not_found.clone())?;
        let [a, b, c] = self.mesh.triangle(hit).ok_or(not_found)?;
        let plane_offset = normal.dot(&centroid(&a, &b, &c).coords);

        let min_cos = self.tolerances.normal.cos();
        let mut triangle_indices = Vec::new();
        for i in 0..self.mesh.triangle_count() {
            let Some(n) = self.oriented_normal(i) else {
                continue;
            };
            if n.dot(&normal) < min_cos {
                continue;
            }
            let Some([a, b, c]) = self.mesh.triangle(i) else {
                continue;
            };
            let offset = n.dot(&centroid(&a, &b, &c).coords);
            if (offset - plane_offset).abs() <= self.tolerances.plane {
                triangle_indices.push(i);
            }
        }

        let mut vertex_indices: Vec<usize> = triangle_indices
            .iter()
            .flat_map(|&i| self.mesh.indices[i].map(|k| k as usize))
            .collect();
        vertex_indices.sort_unstable();
        vertex_indices.dedup();

        let (area, center) = area_and_centroid(self.mesh, &triangle_indices);
        Ok(FaceGroup {
            triangle_indices,
            vertex_indices,
            normal,
            plane_offset,
            center,
            area,
        })
    }

    /// Winding normal of triangle `i`, flipped if it disagrees with the
    /// stored vertex normals.
    fn oriented_normal(&self, i: usize) -> Option<Vector3> {
        let n = self.mesh.triangle_normal(i)?;
        let stored: Vector3 = self.mesh.indices[i]
            .iter()
            .filter_map(|&k| self.mesh.normals.get(k as usize))
            .sum();
        Some(if stored.dot(&n) < 0.0 { -n } else { n })
    }
}

fn centroid(a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords + c.coords) / 3.0)
}

fn area_and_centroid(mesh: &TriangleMesh, triangles: &[usize]) -> (f64, Point3) {
    let mut total = 0.0;
    let mut weighted = Vector3::zeros();
    for [a, b, c] in triangles.iter().filter_map(|&i| mesh.triangle(i)) {
        let area = triangle_area(&a, &b, &c);
        total += area;
        weighted += centroid(&a, &b, &c).coords * area;
    }
    if total > 0.0 {
        (total, Point3::from(weighted / total))
    } else {
        (0.0, Point3::origin())
    }
}
