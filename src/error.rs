//! Error type for graph mutations and placement requests.

use crate::graph::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("node already exists: {0}")]
    DuplicateNode(NodeId),
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("edge endpoint is missing from the graph: {from} -- {to}")]
    MissingEndpoint { from: NodeId, to: NodeId },
    #[error("graph has no nodes to anchor a placement")]
    EmptyGraph,
}

pub type Result<T> = std::result::Result<T, LayoutError>;
