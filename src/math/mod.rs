pub mod intersect_2d;
pub mod polygon_2d;
pub mod polygon_3d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Rigid placement (rotation + translation).
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Unit quaternion rotation.
pub type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Named tolerances used throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Minimum meaningful length; points closer than this are coincident.
    pub len: f64,
    /// Angular tolerance (radians) below which two directions are parallel.
    pub angle: f64,
    /// Angular tolerance (radians) for treating two face normals as equal.
    pub normal: f64,
    /// Distance tolerance for treating two plane offsets as equal.
    pub plane: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            len: 1e-6,
            angle: 1e-6,
            normal: 1e-4,
            plane: 1e-5,
        }
    }
}
