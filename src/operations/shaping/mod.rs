mod extrude;

pub use extrude::{boundary_edges, extrude_patch, Extrude};
