use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::GeometryError;
use crate::math::Point2;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Triangulates a simple polygon with a constrained Delaunay triangulation.
///
/// Returns triangles as index triples into `points`, wound counter-clockwise.
/// Points that coincide exactly are merged.
///
/// # Errors
///
/// Returns [`GeometryError::Triangulation`] for fewer than three points,
/// non-finite input, or a self-crossing outline.
pub fn triangulate_polygon(points: &[Point2]) -> Result<Vec<[usize; 3]>, GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::Triangulation(
            "polygon needs at least 3 points".into(),
        ));
    }

    let mut cdt = Cdt::new();
    let mut input_of: HashMap<usize, usize> = HashMap::new();
    let mut handles = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| GeometryError::Triangulation(format!("CDT insert: {e}")))?;
        input_of.entry(h.index()).or_insert(i);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(GeometryError::Triangulation(
                "polygon outline crosses itself".into(),
            ));
        }
        cdt.add_constraint(from, to);
    }

    let interior = classify_interior_faces(&cdt);
    let mut triangles = Vec::with_capacity(interior.len());
    for face in cdt.inner_faces() {
        if !interior.contains(&face.fix().index()) {
            continue;
        }
        let mut tri = [0usize; 3];
        for (k, v) in face.vertices().iter().enumerate() {
            tri[k] = *input_of.get(&v.fix().index()).ok_or_else(|| {
                GeometryError::Triangulation("CDT produced an unknown vertex".into())
            })?;
        }
        triangles.push(tri);
    }
    Ok(triangles)
}

/// Classifies which inner faces of the CDT are inside the polygon using flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each time
/// a constraint edge is crossed, depth increments. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                depth + 1
            } else {
                depth
            };
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn total_area(points: &[Point2], tris: &[[usize; 3]]) -> f64 {
        tris.iter()
            .map(|t| signed_area_2d(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum()
    }

    #[test]
    fn square_produces_2_triangles() {
        let pts = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)];
        let tris = triangulate_polygon(&pts).unwrap();
        assert_eq!(tris.len(), 2);
        assert_relative_eq!(total_area(&pts, &tris), 16.0);
    }

    #[test]
    fn concave_l_shape_excludes_notch() {
        let pts = [
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(4.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 4.0),
            p(0.0, 4.0),
        ];
        let tris = triangulate_polygon(&pts).unwrap();
        assert_eq!(tris.len(), 4);
        // Every triangle is CCW and the notch is not covered.
        for t in &tris {
            assert!(signed_area_2d(&[pts[t[0]], pts[t[1]], pts[t[2]]]) > 0.0);
        }
        assert_relative_eq!(total_area(&pts, &tris), 12.0);
    }

    #[test]
    fn clockwise_input_still_yields_ccw_triangles() {
        let pts = [p(0.0, 0.0), p(0.0, 3.0), p(3.0, 3.0), p(3.0, 0.0)];
        let tris = triangulate_polygon(&pts).unwrap();
        assert_relative_eq!(total_area(&pts, &tris), 9.0);
    }

    #[test]
    fn too_few_points_rejected() {
        assert!(triangulate_polygon(&[p(0.0, 0.0), p(1.0, 0.0)]).is_err());
    }

    #[test]
    fn nan_rejected() {
        let pts = [p(0.0, 0.0), p(f64::NAN, 0.0), p(0.0, 1.0)];
        assert!(triangulate_polygon(&pts).is_err());
    }
}
