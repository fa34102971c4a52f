//! R-tree nearest-node lookup using the rstar crate.
//!
//! Used to pick an effective root near the viewport when the caller has not
//! designated one. The tree is bulk loaded from the current positions on
//! demand; collision queries go through the grid index instead.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::graph::{Node, NodeId};

/// A node position in the R-tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePoint {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

impl NodePoint {
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-neighbor index over node positions.
pub struct NearestIndex {
    tree: RTree<NodePoint>,
}

impl NearestIndex {
    /// Bulk load from graph nodes.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let points: Vec<_> = nodes
            .into_iter()
            .map(|n| NodePoint::new(n.id.clone(), n.position.x, n.position.y))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Nearest node to a point. Equidistant nodes resolve to the smallest id.
    pub fn nearest(&self, x: f64, y: f64) -> Option<&NodeId> {
        let query = [x, y];
        let mut iter = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = iter.next()?;
        let mut winner = &first.id;
        for (point, d2) in iter {
            if d2 > best {
                break;
            }
            if point.id < *winner {
                winner = &point.id;
            }
        }
        Some(winner)
    }
}
