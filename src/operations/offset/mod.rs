pub mod wall_miter;

pub use wall_miter::{MiterConfig, MiteredPolygonBuilder, WallOutline};
