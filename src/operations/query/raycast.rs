use crate::math::{Point3, Vector3};
use crate::tessellation::TriangleMesh;

const EPSILON: f64 = 1e-9;

/// A half-line `origin + t * direction`, `t > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    #[must_use]
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Nearest triangle hit along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the triangle in the mesh's index list.
    pub triangle: usize,
    /// Ray parameter of the hit; the distance when the direction is unit length.
    pub distance: f64,
    pub point: Point3,
}

/// Möller–Trumbore ray/triangle intersection.
///
/// Returns the ray parameter of the hit, or `None` if the ray misses, runs
/// parallel to the triangle, or the hit lies at or behind the origin.
#[must_use]
pub fn ray_triangle_intersect(ray: &Ray, v0: &Point3, v1: &Point3, v2: &Point3) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > EPSILON).then_some(t)
}

/// Finds the nearest triangle of a mesh hit by a ray.
pub struct RayCast<'a> {
    mesh: &'a TriangleMesh,
    ray: Ray,
}

impl<'a> RayCast<'a> {
    /// Creates a new `RayCast` query.
    #[must_use]
    pub fn new(mesh: &'a TriangleMesh, ray: Ray) -> Self {
        Self { mesh, ray }
    }

    /// Executes the query. Returns `None` when nothing is hit.
    #[must_use]
    pub fn execute(&self) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for i in 0..self.mesh.triangle_count() {
            let Some([a, b, c]) = self.mesh.triangle(i) else {
                continue;
            };
            if let Some(t) = ray_triangle_intersect(&self.ray, &a, &b, &c) {
                if best.as_ref().is_none_or(|hit| t < hit.distance) {
                    best = Some(RayHit {
                        triangle: i,
                        distance: t,
                        point: self.ray.at(t),
                    });
                }
            }
        }
        best
    }
}
