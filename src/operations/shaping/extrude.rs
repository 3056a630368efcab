use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::math::polygon_3d::{newell_normal, PlaneFrame};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::tessellation::{position_key, triangulate_polygon, TriangleMesh};

/// Extrudes a closed planar loop along a direction vector into a closed,
/// outward-wound prism mesh.
pub struct Extrude {
    profile: Vec<Point3>,
    direction: Vector3,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(profile: Vec<Point3>, direction: Vector3) -> Self {
        Self { profile, direction }
    }

    /// Extrudes a plan polygon (z = 0) straight up by `height`.
    #[must_use]
    pub fn vertical(polygon: &[Point2], height: f64) -> Self {
        Self::new(
            polygon.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect(),
            Vector3::new(0.0, 0.0, height),
        )
    }

    /// Executes the extrusion.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Triangulation`] if the direction is zero-length,
    /// the profile is degenerate, or its cap cannot be triangulated.
    pub fn execute(&self) -> Result<TriangleMesh> {
        if self.direction.norm() < TOLERANCE {
            return Err(
                GeometryError::Triangulation("extrude direction must be non-zero".into()).into(),
            );
        }
        let normal = newell_normal(&self.profile).ok_or_else(|| {
            GeometryError::Triangulation("degenerate profile: cannot compute normal".into())
        })?;

        // Orient the cap so its normal agrees with the extrusion direction;
        // the bottom then faces away from it and the sides face outward.
        let normal = if normal.dot(&self.direction) >= 0.0 {
            normal
        } else {
            -normal
        };
        let frame = PlaneFrame::new(self.profile[0], normal);
        let flat: Vec<Point2> = self.profile.iter().map(|p| frame.project(p)).collect();

        let mut cap = TriangleMesh::new();
        for [a, b, c] in triangulate_polygon(&flat)? {
            cap.push_triangle(self.profile[a], self.profile[b], self.profile[c]);
        }
        Ok(extrude_patch(&cap, &self.direction))
    }
}

/// Sweeps a planar triangle patch along `direction` into a closed mesh.
///
/// The patch's open boundary (edges used by only one patch triangle, matched
/// by exact position) becomes the side walls, so patches with holes produce
/// prisms with holes. Winding is chosen so the result faces outward whichever
/// way `direction` points relative to the patch normal.
#[must_use]
pub fn extrude_patch(patch: &TriangleMesh, direction: &Vector3) -> TriangleMesh {
    let mut out = TriangleMesh::new();
    let Some(normal) = (0..patch.triangle_count()).find_map(|i| patch.triangle_normal(i)) else {
        return out;
    };
    let forward = normal.dot(direction) >= 0.0;
    let shift = |p: &Point3| p + direction;

    for i in 0..patch.triangle_count() {
        let Some([a, b, c]) = patch.triangle(i) else {
            continue;
        };
        if forward {
            out.push_triangle(a, c, b);
            out.push_triangle(shift(&a), shift(&b), shift(&c));
        } else {
            out.push_triangle(a, b, c);
            out.push_triangle(shift(&a), shift(&c), shift(&b));
        }
    }

    for (a, b) in boundary_edges(patch) {
        let (a2, b2) = (shift(&a), shift(&b));
        if forward {
            out.push_triangle(a, b, b2);
            out.push_triangle(a, b2, a2);
        } else {
            out.push_triangle(a, b2, b);
            out.push_triangle(a, a2, b2);
        }
    }
    out
}

/// Distance below which a point counts as lying on a boundary line.
const LINE_EPS: f64 = 1e-7;

/// Directed boundary edges of a patch.
///
/// Edges traversed in both directions are interior. Edges whose reverse is
/// split by a T-junction are cancelled span by span along their common line,
/// so only the parts covered in one direction remain.
#[must_use]
pub fn boundary_edges(mesh: &TriangleMesh) -> Vec<(Point3, Point3)> {
    let mut counts: HashMap<([u64; 3], [u64; 3]), i32> = HashMap::new();
    let mut edges = Vec::new();
    for i in 0..mesh.triangle_count() {
        let Some(tri) = mesh.triangle(i) else {
            continue;
        };
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            edges.push((a, b));
            *counts.entry((position_key(&a), position_key(&b))).or_default() += 1;
        }
    }
    let open = edges
        .into_iter()
        .filter(|(a, b)| !counts.contains_key(&(position_key(b), position_key(a))));

    let mut lines: Vec<EdgeLine> = Vec::new();
    for (a, b) in open {
        let d = b - a;
        let len = d.norm();
        if len < TOLERANCE {
            continue;
        }
        match lines.iter_mut().find(|l| l.contains(&a) && l.contains(&b)) {
            Some(line) => line.push(a, b),
            None => lines.push(EdgeLine::new(a, b, d / len)),
        }
    }

    let mut out = Vec::new();
    for line in &lines {
        line.resolve(&mut out);
    }
    out
}

/// Open edges sharing one supporting line.
struct EdgeLine {
    origin: Point3,
    dir: Vector3,
    /// Signed parameter spans, `(from, to)` in traversal order.
    spans: Vec<(f64, f64)>,
    /// Every span endpoint with its original position.
    stops: Vec<(f64, Point3)>,
}

impl EdgeLine {
    fn new(a: Point3, b: Point3, dir: Vector3) -> Self {
        let mut line = Self {
            origin: a,
            dir,
            spans: Vec::new(),
            stops: Vec::new(),
        };
        line.push(a, b);
        line
    }

    fn param(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.dir)
    }

    fn contains(&self, p: &Point3) -> bool {
        let v = p - self.origin;
        (v - self.dir * v.dot(&self.dir)).norm() < LINE_EPS
    }

    fn push(&mut self, a: Point3, b: Point3) {
        let (ta, tb) = (self.param(&a), self.param(&b));
        self.spans.push((ta, tb));
        self.stops.push((ta, a));
        self.stops.push((tb, b));
    }

    /// Emits the maximal runs covered more often forward than backward (or
    /// the reverse), oriented by the winning direction.
    fn resolve(&self, out: &mut Vec<(Point3, Point3)>) {
        let mut stops = self.stops.clone();
        stops.sort_by(|x, y| x.0.total_cmp(&y.0));
        stops.dedup_by(|later, kept| later.0 - kept.0 < LINE_EPS);

        let mut run: Option<(i32, Point3, Point3)> = None;
        for pair in stops.windows(2) {
            let ((t0, p0), (t1, p1)) = (pair[0], pair[1]);
            let mid = (t0 + t1) * 0.5;
            let winding: i32 = self
                .spans
                .iter()
                .map(|&(from, to)| {
                    if from < to && from <= mid && mid <= to {
                        1
                    } else if to < from && to <= mid && mid <= from {
                        -1
                    } else {
                        0
                    }
                })
                .sum();
            let sign = winding.signum();
            run = match run {
                Some((s, start, _)) if s == sign => Some((s, start, p1)),
                other => {
                    flush(other, out);
                    Some((sign, p0, p1))
                }
            };
        }
        flush(run, out);
    }
}

fn flush(run: Option<(i32, Point3, Point3)>, out: &mut Vec<(Point3, Point3)>) {
    match run {
        Some((1, start, end)) => out.push((start, end)),
        Some((-1, start, end)) => out.push((end, start)),
        _ => {}
    }
}
