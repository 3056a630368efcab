mod bounding_box;
mod face_group;
mod raycast;
mod volume;

pub use bounding_box::{Aabb, BoundingBox};
pub use face_group::{FaceGroup, FaceIndex};
pub use raycast::{ray_triangle_intersect, Ray, RayCast, RayHit};
pub use volume::Volume;
