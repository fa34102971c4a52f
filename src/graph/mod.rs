//! Graph data structures and operations.
//!
//! The mind map is an undirected graph of topics. Topology is held in
//! petgraph's StableGraph so petgraph indices of surviving nodes stay valid
//! when a topic is deleted; callers only ever see their own [`NodeId`]s.

mod engine;
mod node;

pub use engine::MindMapGraph;
pub use node::{Node, NodeId};
