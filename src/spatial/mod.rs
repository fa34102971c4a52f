//! Spatial indexing for collision tests and nearest-node lookup.
//!
//! - [`SpatialIndex`]: grid buckets over node circles, kept current on every
//!   insert/move/remove so placement can test collisions cheaply.
//! - [`NearestIndex`]: R-tree for "which node is closest to this point".

mod grid;
mod rtree;

pub use grid::SpatialIndex;
pub use rtree::NearestIndex;
