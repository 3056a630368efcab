use super::intersect_2d::segments_intersect_2d;
use super::{Point2, Vector2, TOLERANCE};

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the normalized direction from `a` to `b` and the segment length,
/// or `None` for a segment shorter than `min_len`.
#[must_use]
pub fn segment_direction(a: &Point2, b: &Point2, min_len: f64) -> Option<(Vector2, f64)> {
    let d = b - a;
    let len = d.norm();
    if len < min_len.max(TOLERANCE) {
        return None;
    }
    Some((d / len, len))
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// Drops consecutive points (including the closing pair) closer than `eps`.
#[must_use]
pub fn remove_near_duplicates(points: &[Point2], eps: f64) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|q| (p - q).norm() < eps) {
            continue;
        }
        out.push(p);
    }
    while out.len() > 1 {
        let (first, last) = (out[0], out[out.len() - 1]);
        if (first - last).norm() < eps {
            out.pop();
        } else {
            break;
        }
    }
    out
}

/// Returns `true` if the closed loop has at least three vertices, non-zero
/// area, and no two non-adjacent edges touch.
#[must_use]
pub fn is_simple_polygon(points: &[Point2], eps: f64) -> bool {
    let n = points.len();
    if n < 3 || signed_area_2d(points).abs() < eps * eps {
        return false;
    }
    for i in 0..n {
        let a0 = points[i];
        let a1 = points[(i + 1) % n];
        for j in (i + 1)..n {
            // Neighbouring edges share a vertex.
            if (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let b0 = points[j];
            let b1 = points[(j + 1) % n];
            if segments_intersect_2d(&a0, &a1, &b0, &b1, eps * eps) {
                return false;
            }
        }
    }
    true
}
