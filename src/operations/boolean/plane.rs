use crate::math::{Point3, Vector3};

/// Distance below which a point counts as lying on a plane.
pub(super) const EPSILON: f64 = 1e-5;

/// Side of a plane a point or polygon lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Side {
    Coplanar,
    Front,
    Back,
    Spanning,
}

impl Side {
    fn combine(self, other: Side) -> Side {
        match (self, other) {
            (Side::Coplanar, s) | (s, Side::Coplanar) => s,
            (a, b) if a == b => a,
            _ => Side::Spanning,
        }
    }
}

/// Oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Plane {
    pub normal: Vector3,
    pub w: f64,
}

impl Plane {
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < EPSILON * EPSILON || !len.is_finite() {
            return None;
        }
        let normal = n / len;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
        }
    }

    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    pub fn side_of(&self, p: &Point3) -> Side {
        let d = self.signed_distance(p);
        if d > EPSILON {
            Side::Front
        } else if d < -EPSILON {
            Side::Back
        } else {
            Side::Coplanar
        }
    }

    pub fn side_of_all(&self, points: &[Point3]) -> Side {
        points
            .iter()
            .fold(Side::Coplanar, |acc, p| acc.combine(self.side_of(p)))
    }
}
