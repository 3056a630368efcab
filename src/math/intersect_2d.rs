use super::{Point2, Vector2, TOLERANCE};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if the
/// lines are not parallel. Directions are expected to be unit length so that
/// `min_sin` is the sine of the smallest accepted crossing angle.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
    min_sin: f64,
) -> Option<(f64, f64)> {
    let cross = d1.perp(d2);
    if cross.abs() < min_sin.max(TOLERANCE) {
        return None;
    }
    let d = p2 - p1;
    let t = d.perp(d2) / cross;
    let u = d.perp(d1) / cross;
    Some((t, u))
}

/// Returns `true` if the closed segments `a0-a1` and `b0-b1` touch or cross.
///
/// Collinear overlapping segments count as intersecting.
#[must_use]
pub fn segments_intersect_2d(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2, eps: f64) -> bool {
    let o1 = orient(a0, a1, b0, eps);
    let o2 = orient(a0, a1, b1, eps);
    let o3 = orient(b0, b1, a0, eps);
    let o4 = orient(b0, b1, a1, eps);

    if o1 != o2 && o3 != o4 && o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 {
        return true;
    }

    (o1 == 0 && on_segment(a0, a1, b0, eps))
        || (o2 == 0 && on_segment(a0, a1, b1, eps))
        || (o3 == 0 && on_segment(b0, b1, a0, eps))
        || (o4 == 0 && on_segment(b0, b1, a1, eps))
}

/// Sign of the turn `a -> b -> c`: 1 for CCW, -1 for CW, 0 when collinear.
fn orient(a: &Point2, b: &Point2, c: &Point2, eps: f64) -> i8 {
    let v = (b - a).perp(&(c - a));
    if v > eps {
        1
    } else if v < -eps {
        -1
    } else {
        0
    }
}

/// For a point `p` already known to be collinear with `a-b`.
fn on_segment(a: &Point2, b: &Point2, p: &Point2, eps: f64) -> bool {
    p.x >= a.x.min(b.x) - eps
        && p.x <= a.x.max(b.x) + eps
        && p.y >= a.y.min(b.y) - eps
        && p.y <= a.y.max(b.y) + eps
}
