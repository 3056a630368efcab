pub mod error;
pub mod graph;
pub mod math;
pub mod operations;
pub mod pushpull;
pub mod scene;
pub mod solid;
pub mod tessellation;

pub use error::{Result, WallcraftError};
pub use graph::WallGraph;
pub use pushpull::{PushPullConfig, PushPullEngine};
pub use scene::{ObjectId, ObjectKind, Scene};
pub use solid::{SolidConfig, SolidGenerator, WallSolid};
pub use tessellation::TriangleMesh;
