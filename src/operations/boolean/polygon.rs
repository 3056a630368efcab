use crate::math::Point3;

use super::plane::{Plane, Side};

/// A convex planar polygon carried through the BSP tree.
#[derive(Debug, Clone)]
pub(super) struct Polygon {
    pub vertices: Vec<Point3>,
    pub plane: Plane,
}

impl Polygon {
    /// Polygon from a triangle, or `None` if the triangle has no area.
    pub fn from_triangle(a: Point3, b: Point3, c: Point3) -> Option<Self> {
        let plane = Plane::from_points(&a, &b, &c)?;
        Some(Self {
            vertices: vec![a, b, c],
            plane,
        })
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }

    /// Sorts this polygon against `plane`.
    ///
    /// Coplanar polygons go to `coplanar_front` or `coplanar_back` depending
    /// on whether they face the same way as the plane. Spanning polygons are
    /// cut in two; the pieces keep this polygon's plane.
    pub fn split(
        self,
        plane: &Plane,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        match plane.side_of_all(&self.vertices) {
            Side::Coplanar => {
                if plane.normal.dot(&self.plane.normal) > 0.0 {
                    coplanar_front.push(self);
                } else {
                    coplanar_back.push(self);
                }
            }
            Side::Front => front.push(self),
            Side::Back => back.push(self),
            Side::Spanning => {
                let n = self.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let vi = self.vertices[i];
                    let vj = self.vertices[(i + 1) % n];
                    let ti = plane.side_of(&vi);
                    let tj = plane.side_of(&vj);
                    if ti != Side::Back {
                        f.push(vi);
                    }
                    if ti != Side::Front {
                        b.push(vi);
                    }
                    let crosses = matches!(
                        (ti, tj),
                        (Side::Front, Side::Back) | (Side::Back, Side::Front)
                    );
                    if crosses {
                        let t = (plane.w - plane.normal.dot(&vi.coords))
                            / plane.normal.dot(&(vj - vi));
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(Polygon {
                        vertices: f,
                        plane: self.plane,
                    });
                }
                if b.len() >= 3 {
                    back.push(Polygon {
                        vertices: b,
                        plane: self.plane,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn sort(poly: Polygon, plane: &Plane) -> [Vec<Polygon>; 4] {
        let mut out: [Vec<Polygon>; 4] = Default::default();
        let [cf, cb, f, b] = &mut out;
        poly.split(plane, cf, cb, f, b);
        out
    }

    #[test]
    fn spanning_triangle_is_cut() {
        let tri = Polygon::from_triangle(p(-1.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 2.0, 0.0)).unwrap();
        let plane = Plane {
            normal: Vector3::x(),
            w: 0.0,
        };
        let [cf, cb, f, b] = sort(tri, &plane);
        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(f.len(), 1);
        assert_eq!(b.len(), 1);
        // Front piece is a quad, back piece a triangle.
        assert_eq!(f[0].vertices.len(), 4);
        assert_eq!(b[0].vertices.len(), 3);
        for v in &b[0].vertices {
            assert!(v.x <= 1e-12);
        }
        assert_relative_eq!(f[0].plane.normal, Vector3::z());
    }

    #[test]
    fn coplanar_sorted_by_facing() {
        let plane = Plane {
            normal: Vector3::z(),
            w: 0.0,
        };
        let up = Polygon::from_triangle(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)).unwrap();
        let mut down = up.clone();
        down.flip();
        assert_eq!(sort(up, &plane)[0].len(), 1);
        assert_eq!(sort(down, &plane)[1].len(), 1);
    }
}
