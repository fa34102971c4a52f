//! Placement and layout algorithms for mind-map nodes.
//!
//! These compute target positions only; committing them to the graph and the
//! spatial index is the caller's job (see [`crate::mindmap::MindMap`]).
//!
//! - [`free_slot`]: place one new child next to an anchor without collisions.
//! - [`radial`]: concentric-ring layout of a whole tree around an anchor.
//! - [`tree`]: top-down axis-aligned layout of a whole tree.
//! - [`size`]: collision radii derived from node visual sizes.
//! - [`spanning`]: deterministic BFS spanning tree shared by the full layouts.

pub mod free_slot;
pub mod radial;
pub mod size;
pub mod spanning;
pub mod tree;

pub use free_slot::{ChildAngleHints, FreeSlotFinder, SlotPlacement, GOLDEN_ANGLE};
pub use radial::{RadialLayout, RadialLayoutEngine, RadialPlacement, Sector};
pub use size::{NodeSizeEstimator, SizeSource, UnknownSizes};
pub use spanning::SpanningTree;
pub use tree::{TreeLayout, TreeLayoutEngine};
