mod triangulate;

pub use triangulate::triangulate_polygon;

use crate::math::polygon_3d::triangle_area;
use crate::math::{Isometry3, Point3, Vector3, TOLERANCE};

/// A triangle mesh.
///
/// Meshes produced by this crate are flat shaded: every triangle owns its
/// three vertices and all three carry the triangle's normal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle, CCW seen from outside).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Corner positions of triangle `i`, or `None` if out of range.
    #[must_use]
    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        let tri = self.indices.get(i)?;
        let v = |k: usize| self.vertices.get(tri[k] as usize).copied();
        Some([v(0)?, v(1)?, v(2)?])
    }

    /// Unit normal of triangle `i` from its winding, or `None` if the
    /// triangle is missing or has zero area.
    #[must_use]
    pub fn triangle_normal(&self, i: usize) -> Option<Vector3> {
        let [a, b, c] = self.triangle(i)?;
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < TOLERANCE {
            return None;
        }
        Some(n / len)
    }

    /// Appends a triangle with its own three vertices and a flat normal.
    /// Zero-area triangles are skipped.
    pub fn push_triangle(&mut self, a: Point3, b: Point3, c: Point3) {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < TOLERANCE {
            return;
        }
        let normal = n / len;
        let base = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        self.vertices.extend([a, b, c]);
        self.normals.extend([normal; 3]);
        self.indices.push([base, base + 1, base + 2]);
    }

    /// Appends all triangles of `other`.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }

    /// Returns a copy with every triangle owning its vertices and per-triangle
    /// normals recomputed from the winding. Degenerate triangles are dropped.
    #[must_use]
    pub fn to_flat_shaded(&self) -> TriangleMesh {
        let mut out = TriangleMesh::new();
        for i in 0..self.indices.len() {
            if let Some([a, b, c]) = self.triangle(i) {
                out.push_triangle(a, b, c);
            }
        }
        out
    }

    /// Recomputes vertex normals as the area-weighted average of the
    /// triangles sharing each vertex. Triangles with out-of-range indices
    /// are skipped.
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![Vector3::zeros(); self.vertices.len()];
        for i in 0..self.indices.len() {
            let Some([a, b, c]) = self.triangle(i) else {
                continue;
            };
            let n = (b - a).cross(&(c - a));
            for &k in &self.indices[i] {
                if let Some(sum) = acc.get_mut(k as usize) {
                    *sum += n;
                }
            }
        }
        self.normals = acc
            .into_iter()
            .map(|n| {
                let len = n.norm();
                if len < TOLERANCE {
                    Vector3::zeros()
                } else {
                    n / len
                }
            })
            .collect();
    }

    /// `true` if every coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    /// `true` if the mesh has no triangles or carries non-finite coordinates.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || !self.is_finite()
    }

    /// Total surface area.
    #[must_use]
    pub fn area(&self) -> f64 {
        (0..self.indices.len())
            .filter_map(|i| self.triangle(i))
            .map(|[a, b, c]| triangle_area(&a, &b, &c))
            .sum()
    }

    /// Returns a copy moved by a rigid transform.
    #[must_use]
    pub fn transformed(&self, iso: &Isometry3) -> TriangleMesh {
        TriangleMesh {
            vertices: self.vertices.iter().map(|p| iso * p).collect(),
            normals: self.normals.iter().map(|n| iso * n).collect(),
            indices: self.indices.clone(),
        }
    }
}

/// Bit-exact key for a position; `-0.0` and `0.0` map to the same key.
pub(crate) fn position_key(p: &Point3) -> [u64; 3] {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}
