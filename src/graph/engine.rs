//! MindMapGraph - the caller-owned node/edge store.
//!
//! Topology lives in petgraph's StableGraph (undirected, so indices of other
//! nodes survive removals) and a side map translates caller ids into petgraph
//! indices. Layout engines borrow the graph immutably; only the owning
//! [`MindMap`](crate::MindMap) mutates it.

use petgraph::Undirected;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use std::collections::{HashMap, VecDeque};

use super::node::{Node, NodeId};
use crate::error::{LayoutError, Result};
use crate::geometry::Point2D;
use crate::spatial::NearestIndex;

/// Undirected mind-map graph with per-node position and color.
///
/// Invariant: every edge endpoint exists in the node set (petgraph drops
/// incident edges together with a removed node).
#[derive(Debug, Clone, Default)]
pub struct MindMapGraph {
    graph: StableGraph<Node, (), Undirected>,

    /// Map from caller id to petgraph NodeIndex
    index_of: HashMap<NodeId, NodeIndex>,

    /// Designated layout root, if the caller picked one
    root: Option<NodeId>,
}

impl MindMapGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node at the given position.
    pub fn add_node(&mut self, id: NodeId, position: Point2D) -> Result<()> {
        if self.index_of.contains_key(&id) {
            return Err(LayoutError::DuplicateNode(id));
        }
        let index = self.graph.add_node(Node::new(id.clone(), position));
        self.index_of.insert(id, index);
        Ok(())
    }

    /// Remove a node and all its edges, returning its attributes.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let index = self.index_of.remove(id)?;
        if self.root.as_ref() == Some(id) {
            self.root = None;
        }
        self.graph.remove_node(index)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index_of.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index_of.get(id).and_then(|&i| self.graph.node_weight(i))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node ids in index order (insertion order until a removal frees a slot).
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.graph.node_indices().map(move |i| &self.graph[i].id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_indices().map(move |i| &self.graph[i])
    }

    pub fn position(&self, id: &NodeId) -> Option<Point2D> {
        self.node(id).map(|n| n.position)
    }

    /// Set a node's position, returning the previous one.
    pub fn set_position(&mut self, id: &NodeId, position: Point2D) -> Result<Point2D> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.position, position))
    }

    pub fn set_color(&mut self, id: &NodeId, color: Option<String>) -> Result<()> {
        self.node_mut(id)?.color = color;
        Ok(())
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        let index = *self
            .index_of
            .get(id)
            .ok_or_else(|| LayoutError::UnknownNode(id.clone()))?;
        Ok(&mut self.graph[index])
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Connect two nodes. Connecting an already-connected pair is a no-op.
    pub fn add_edge(&mut self, a: &NodeId, b: &NodeId) -> Result<()> {
        let (Some(&ia), Some(&ib)) = (self.index_of.get(a), self.index_of.get(b)) else {
            return Err(LayoutError::MissingEndpoint {
                from: a.clone(),
                to: b.clone(),
            });
        };
        if ia != ib && self.graph.find_edge(ia, ib).is_none() {
            self.graph.add_edge(ia, ib, ());
        }
        Ok(())
    }

    /// Disconnect two nodes. Returns true if an edge was removed.
    pub fn remove_edge(&mut self, a: &NodeId, b: &NodeId) -> bool {
        let (Some(&ia), Some(&ib)) = (self.index_of.get(a), self.index_of.get(b)) else {
            return false;
        };
        match self.graph.find_edge(ia, ib) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    pub fn has_edge(&self, a: &NodeId, b: &NodeId) -> bool {
        match (self.index_of.get(a), self.index_of.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Neighbors of a node in sibling order (case-insensitive lexicographic).
    pub fn neighbors(&self, id: &NodeId) -> Vec<&NodeId> {
        let Some(&index) = self.index_of.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&NodeId> = self
            .graph
            .neighbors(index)
            .map(|other| &self.graph[other].id)
            .collect();
        out.sort_by(|a, b| a.sibling_order(b));
        out.dedup();
        out
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        self.neighbors(id).len()
    }

    // =========================================================================
    // Roots and Depths
    // =========================================================================

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    /// Designate the layout root. Unknown ids are ignored.
    pub fn set_root(&mut self, id: &NodeId) -> bool {
        if self.contains(id) {
            self.root = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Pick the node a layout should grow from.
    ///
    /// The designated root wins if it still exists. Otherwise the node nearest
    /// `near` (ties broken by id), and without a reference point the first
    /// node in index order.
    pub fn effective_root(&self, near: Option<Point2D>) -> Option<NodeId> {
        if let Some(root) = self.root.as_ref().filter(|r| self.contains(r)) {
            return Some(root.clone());
        }
        if let Some(p) = near {
            let nearest = NearestIndex::from_nodes(self.nodes());
            if let Some(id) = nearest.nearest(p.x, p.y) {
                return Some(id.clone());
            }
        }
        self.node_ids().next().cloned()
    }

    /// Resolve a requested root, falling back to [`Self::effective_root`].
    pub fn resolve_root(&self, requested: Option<&NodeId>, near: Option<Point2D>) -> Option<NodeId> {
        match requested {
            Some(id) if self.contains(id) => Some(id.clone()),
            _ => self.effective_root(near),
        }
    }

    /// BFS level of every node reachable from `root` (root = 0).
    pub fn bfs_levels(&self, root: &NodeId) -> HashMap<NodeId, usize> {
        let mut levels = HashMap::new();
        if !self.contains(root) {
            return levels;
        }
        let mut queue = VecDeque::new();
        levels.insert(root.clone(), 0);
        queue.push_back(root.clone());
        while let Some(current) = queue.pop_front() {
            let level = levels[&current];
            for nb in self.neighbors(&current) {
                if !levels.contains_key(nb) {
                    levels.insert(nb.clone(), level + 1);
                    queue.push_back(nb.clone());
                }
            }
        }
        levels
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    pub fn clear(&mut self) {
        self.graph.clear();
        self.index_of.clear();
        self.root = None;
    }
}
