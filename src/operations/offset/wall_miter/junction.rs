use crate::error::GraphError;
use crate::graph::{NodeId, WallGraph, WallId};
use crate::math::intersect_2d::line_line_intersect_2d;
use crate::math::polygon_2d::left_normal;
use crate::math::{Point2, Vector2};

use super::MiterConfig;

/// One wall leaving a node, viewed from the node outward.
#[derive(Debug, Clone)]
struct Arm {
    wall: WallId,
    /// `true` if the wall starts at this node.
    outgoing: bool,
    /// Unit direction pointing away from the node.
    dir: Vector2,
    half_width: f64,
    length: f64,
}

impl Arm {
    fn left_raw(&self, node: Point2) -> Point2 {
        node + left_normal(&self.dir) * self.half_width
    }

    fn right_raw(&self, node: Point2) -> Point2 {
        node - left_normal(&self.dir) * self.half_width
    }
}

/// How the left side of one arm meets the right side of its CCW neighbour.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Join {
    /// Both offset lines meet at a shared corner.
    Miter(Point2),
    /// Parallel or opposite arms: each side ends square at the node.
    Butt,
    /// Miter too long; both sides end square and share the bevel midpoint.
    Bevel(Point2),
}

/// Resolved outline of one wall end, ordered from the arm's left side to
/// its right side (clockwise around the node).
#[derive(Debug, Clone)]
pub(super) struct WallEnd {
    pub wall: WallId,
    /// `true` if this is the wall's start node.
    pub at_start: bool,
    pub points: Vec<Point2>,
}

/// Resolves the outline corners of every wall meeting at `node_id`.
///
/// Arms are sorted by angle (CCW). For each adjacent pair, the LEFT offset
/// line of the current arm is intersected with the RIGHT offset line of the
/// next arm; both arms share the resulting corner.
pub(super) fn resolve_node(
    graph: &WallGraph,
    node_id: NodeId,
    config: &MiterConfig,
) -> Result<Vec<WallEnd>, GraphError> {
    let node = graph.node(node_id)?.position;
    let mut arms: Vec<(f64, Arm)> = Vec::new();
    for wall_id in graph.incident_walls(node_id)? {
        let wall = graph.wall(wall_id)?;
        let other = graph.node(wall.other_end(node_id))?.position;
        let delta = other - node;
        let length = delta.norm();
        if length < config.tolerances.len {
            return Err(GraphError::DegenerateWall { length });
        }
        let dir = delta / length;
        arms.push((
            dir.y.atan2(dir.x),
            Arm {
                wall: wall_id,
                outgoing: wall.start == node_id,
                dir,
                half_width: wall.thickness * 0.5,
                length,
            },
        ));
    }
    arms.sort_by(|a, b| a.0.total_cmp(&b.0));
    let arms: Vec<Arm> = arms.into_iter().map(|(_, arm)| arm).collect();

    let n = arms.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if n == 1 {
        let arm = &arms[0];
        return Ok(vec![WallEnd {
            wall: arm.wall,
            at_start: arm.outgoing,
            points: vec![arm.left_raw(node), arm.right_raw(node)],
        }]);
    }

    // joins[k] sits between arm k (left side) and arm k+1 (right side).
    let joins: Vec<Join> = (0..n)
        .map(|k| join_pair(node, &arms[k], &arms[(k + 1) % n], config))
        .collect();

    let mut ends = Vec::with_capacity(n);
    for (k, arm) in arms.iter().enumerate() {
        let left_join = joins[k];
        let right_join = joins[(k + n - 1) % n];

        let mut points = Vec::with_capacity(5);
        match left_join {
            Join::Miter(p) => points.push(p),
            Join::Butt => points.push(arm.left_raw(node)),
            Join::Bevel(mid) => {
                points.push(arm.left_raw(node));
                points.push(mid);
            }
        }
        let bevelled = matches!(left_join, Join::Bevel(_)) || matches!(right_join, Join::Bevel(_));
        if n >= 3 || bevelled {
            points.push(node);
        }
        match right_join {
            Join::Miter(p) => points.push(p),
            Join::Butt => points.push(arm.right_raw(node)),
            Join::Bevel(mid) => {
                points.push(mid);
                points.push(arm.right_raw(node));
            }
        }
        drop_collinear_center(&mut points, node, config.tolerances.len);

        ends.push(WallEnd {
            wall: arm.wall,
            at_start: arm.outgoing,
            points,
        });
    }
    Ok(ends)
}

fn join_pair(node: Point2, current: &Arm, next: &Arm, config: &MiterConfig) -> Join {
    let p1 = current.left_raw(node);
    let p2 = next.right_raw(node);
    let min_sin = config.tolerances.angle.sin();
    let Some((t, u)) = line_line_intersect_2d(&p1, &current.dir, &p2, &next.dir, min_sin) else {
        return Join::Butt;
    };
    let corner = p1 + current.dir * t;

    let limit = config.miter_limit * current.half_width.max(next.half_width);
    let too_long = (corner - node).norm() > limit;
    // A corner past the far end of either wall would fold the outline.
    let overshoots = t.abs() > current.length || u.abs() > next.length;
    if too_long || overshoots {
        return Join::Bevel(nalgebra::center(&p1, &p2));
    }
    Join::Miter(corner)
}

/// Removes the node center when it lies on the segment joining its
/// neighbours (straight-through junctions).
fn drop_collinear_center(points: &mut Vec<Point2>, node: Point2, eps: f64) {
    let Some(i) = points.iter().position(|p| *p == node) else {
        return;
    };
    if i == 0 || i + 1 >= points.len() {
        return;
    }
    let (a, b) = (points[i - 1], points[i + 1]);
    let ab = b - a;
    let len = ab.norm();
    if len < eps {
        return;
    }
    if (node - a).perp(&ab).abs() / len < eps {
        points.remove(i);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn end_for(ends: &[WallEnd], wall: WallId) -> &WallEnd {
        ends.iter().find(|e| e.wall == wall).unwrap()
    }

    // ── Dead end ──

    #[test]
    fn dead_end_is_square() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(100.0, 0.0)).unwrap();
        let w = g.add_wall(a, b, 10.0).unwrap();

        let ends = resolve_node(&g, a, &MiterConfig::default()).unwrap();
        let end = end_for(&ends, w);
        assert!(end.at_start);
        assert_eq!(end.points, vec![p(0.0, 5.0), p(0.0, -5.0)]);
    }

    // ── L corner ──

    #[test]
    fn right_angle_shares_both_corners() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(0.0, 300.0)).unwrap();
        let c = g.add_node(p(300.0, 300.0)).unwrap();
        let wa = g.add_wall(a, b, 10.0).unwrap();
        let wb = g.add_wall(b, c, 10.0).unwrap();

        let ends = resolve_node(&g, b, &MiterConfig::default()).unwrap();
        let ea = end_for(&ends, wa);
        let eb = end_for(&ends, wb);
        assert!(!ea.at_start);
        assert!(eb.at_start);
        assert_eq!(ea.points.len(), 2);
        assert_eq!(eb.points.len(), 2);

        assert_relative_eq!(ea.points[0], p(5.0, 295.0), epsilon = 1e-9);
        assert_relative_eq!(ea.points[1], p(-5.0, 305.0), epsilon = 1e-9);
        // Same corners, visited from the other wall's side.
        assert_eq!(eb.points[0], ea.points[1]);
        assert_eq!(eb.points[1], ea.points[0]);
    }

    // ── Straight continuation ──

    #[test]
    fn collinear_walls_butt_square() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(100.0, 0.0)).unwrap();
        let c = g.add_node(p(200.0, 0.0)).unwrap();
        let w1 = g.add_wall(a, b, 10.0).unwrap();
        g.add_wall(b, c, 10.0).unwrap();

        let ends = resolve_node(&g, b, &MiterConfig::default()).unwrap();
        let e1 = end_for(&ends, w1);
        assert_eq!(e1.points.len(), 2);
        assert_relative_eq!(e1.points[0], p(100.0, -5.0), epsilon = 1e-9);
        assert_relative_eq!(e1.points[1], p(100.0, 5.0), epsilon = 1e-9);
    }

    // ── T junction ──

    #[test]
    fn tee_junction_adds_center_vertex() {
        let mut g = WallGraph::new();
        let west = g.add_node(p(-100.0, 0.0)).unwrap();
        let center = g.add_node(p(0.0, 0.0)).unwrap();
        let east = g.add_node(p(100.0, 0.0)).unwrap();
        let north = g.add_node(p(0.0, 100.0)).unwrap();
        let ww = g.add_wall(west, center, 10.0).unwrap();
        let we = g.add_wall(center, east, 10.0).unwrap();
        let wn = g.add_wall(center, north, 10.0).unwrap();

        let ends = resolve_node(&g, center, &MiterConfig::default()).unwrap();
        assert_eq!(ends.len(), 3);

        let e = end_for(&ends, we);
        assert_eq!(e.points.len(), 3);
        assert_relative_eq!(e.points[0], p(5.0, 5.0), epsilon = 1e-9);
        assert_relative_eq!(e.points[1], p(0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(e.points[2], p(0.0, -5.0), epsilon = 1e-9);

        let n = end_for(&ends, wn);
        assert_relative_eq!(n.points[0], p(-5.0, 5.0), epsilon = 1e-9);
        assert_relative_eq!(n.points[2], p(5.0, 5.0), epsilon = 1e-9);

        let w = end_for(&ends, ww);
        assert!(!w.at_start);
        assert_relative_eq!(w.points[0], p(0.0, -5.0), epsilon = 1e-9);
        assert_relative_eq!(w.points[2], p(-5.0, 5.0), epsilon = 1e-9);
    }

    // ── Acute angle ──

    #[test]
    fn acute_corners_are_bevelled() {
        let mut g = WallGraph::new();
        let a = g.add_node(p(0.0, 0.0)).unwrap();
        let b = g.add_node(p(100.0, 0.0)).unwrap();
        // ~10 degrees between the two arms at `a`.
        let c = g.add_node(p(100.0, 17.6)).unwrap();
        let w1 = g.add_wall(a, b, 10.0).unwrap();
        g.add_wall(a, c, 10.0).unwrap();

        let ends = resolve_node(&g, a, &MiterConfig::default()).unwrap();
        let e1 = end_for(&ends, w1);
        // Both corners exceed the miter limit: raw offset points, bevel
        // midpoints and the node center.
        assert!(e1.points.len() >= 3);
        assert!(e1.points.contains(&p(0.0, 0.0)));
    }
}
