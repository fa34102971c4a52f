//! Collision radii derived from node visual sizes.
//!
//! The caller measures each node's label box; the estimator turns those boxes
//! into circle radii for the spatial index and chord targets for placement.

use std::collections::HashMap;

use crate::graph::{MindMapGraph, NodeId};

/// Average radius reported when no node has a known size.
pub const DEFAULT_AVERAGE_RADIUS: f64 = 140.0;

/// Buffer added around a node's own half-diagonal.
pub const RADIUS_BUFFER: f64 = 10.0;

/// Floor for any minimum chord target.
pub const MIN_CHORD_FLOOR: f64 = 80.0;

/// Source of per-node visual sizes as (width, height).
pub trait SizeSource {
    fn node_size(&self, id: &NodeId) -> Option<(f64, f64)>;
}

impl SizeSource for HashMap<NodeId, (f64, f64)> {
    fn node_size(&self, id: &NodeId) -> Option<(f64, f64)> {
        self.get(id).copied()
    }
}

impl<F> SizeSource for F
where
    F: Fn(&NodeId) -> Option<(f64, f64)>,
{
    fn node_size(&self, id: &NodeId) -> Option<(f64, f64)> {
        self(id)
    }
}

/// Sizes that are never known; every radius falls back to the defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownSizes;

impl SizeSource for UnknownSizes {
    fn node_size(&self, _id: &NodeId) -> Option<(f64, f64)> {
        None
    }
}

fn diagonal((w, h): (f64, f64)) -> Option<f64> {
    let d = w.hypot(h);
    (d.is_finite() && w >= 0.0 && h >= 0.0).then_some(d)
}

/// Per-node and average collision radii for one graph snapshot.
pub struct NodeSizeEstimator<'a> {
    sizes: &'a dyn SizeSource,
    average_radius: f64,
}

impl<'a> NodeSizeEstimator<'a> {
    /// Snapshot the average over every node of `graph` with a known size.
    pub fn new(graph: &MindMapGraph, sizes: &'a dyn SizeSource) -> Self {
        let (sum, count) = graph
            .node_ids()
            .filter_map(|id| sizes.node_size(id).and_then(diagonal))
            .fold((0.0, 0usize), |(s, c), d| (s + d, c + 1));
        let average_radius = if count == 0 {
            DEFAULT_AVERAGE_RADIUS
        } else {
            sum / count as f64 * 0.5
        };
        Self {
            sizes,
            average_radius,
        }
    }

    /// Half the mean bounding-box diagonal, or 140 with no known sizes.
    pub fn average_radius(&self) -> f64 {
        self.average_radius
    }

    /// Half the node's own diagonal plus a 10 unit buffer.
    pub fn node_radius(&self, id: &NodeId) -> f64 {
        self.radius_for_size(self.sizes.node_size(id))
    }

    /// Radius for a box that is not in the graph yet.
    pub fn radius_for_size(&self, size: Option<(f64, f64)>) -> f64 {
        match size.and_then(diagonal) {
            Some(d) => d * 0.5 + RADIUS_BUFFER,
            None => self.fallback_radius(),
        }
    }

    /// Radius assumed for a node whose size is not known yet.
    pub fn fallback_radius(&self) -> f64 {
        self.average_radius * 0.5 + RADIUS_BUFFER
    }

    /// Chord a freshly inserted node needs between itself and its neighbors.
    pub fn slot_min_chord(&self, min_chord_ratio: f64) -> f64 {
        (self.average_radius * 2.4 * min_chord_ratio).max(MIN_CHORD_FLOOR)
    }

    /// Chord a laid-out node needs to its angular neighbors.
    pub fn node_min_chord(&self, id: &NodeId, min_chord_ratio: f64) -> f64 {
        (self.node_radius(id) * 2.0 * min_chord_ratio).max(MIN_CHORD_FLOOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2D;

    fn graph_of(ids: &[&str]) -> MindMapGraph {
        let mut g = MindMapGraph::new();
        for id in ids {
            g.add_node(NodeId::from(*id), Point2D::default()).unwrap();
        }
        g
    }

    #[test]
    fn test_average_defaults_without_nodes() {
        let g = MindMapGraph::new();
        let est = NodeSizeEstimator::new(&g, &UnknownSizes);
        assert_eq!(est.average_radius(), DEFAULT_AVERAGE_RADIUS);
        assert_eq!(est.fallback_radius(), 80.0);
    }

    #[test]
    fn test_average_radius_is_half_mean_diagonal() {
        let g = graph_of(&["a", "b"]);
        let mut sizes = HashMap::new();
        sizes.insert(NodeId::from("a"), (30.0, 40.0)); // diagonal 50
        sizes.insert(NodeId::from("b"), (60.0, 80.0)); // diagonal 100
        let est = NodeSizeEstimator::new(&g, &sizes);
        assert!((est.average_radius() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_node_radius_uses_own_size() {
        let g = graph_of(&["a", "b"]);
        let mut sizes = HashMap::new();
        sizes.insert(NodeId::from("a"), (30.0, 40.0));
        let est = NodeSizeEstimator::new(&g, &sizes);
        assert!((est.node_radius(&NodeId::from("a")) - 35.0).abs() < 1e-9);
        // b has no size: average*0.5 + 10
        let expected = est.average_radius() * 0.5 + 10.0;
        assert!((est.node_radius(&NodeId::from("b")) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_radius_for_unregistered_box() {
        let g = graph_of(&["a"]);
        let est = NodeSizeEstimator::new(&g, &UnknownSizes);
        // 600x400 box: diagonal 721.11, half plus buffer
        assert!((est.radius_for_size(Some((600.0, 400.0))) - 370.555).abs() < 1e-3);
        assert_eq!(est.radius_for_size(None), est.fallback_radius());
        assert_eq!(est.radius_for_size(Some((f64::NAN, 1.0))), est.fallback_radius());
    }

    #[test]
    fn test_closure_size_source() {
        let g = graph_of(&["a"]);
        let source = |_: &NodeId| Some((120.0, 50.0));
        let est = NodeSizeEstimator::new(&g, &source);
        assert!((est.average_radius() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_chord_floor() {
        let g = graph_of(&["a"]);
        let source = |_: &NodeId| Some((3.0, 4.0));
        let est = NodeSizeEstimator::new(&g, &source);
        assert_eq!(est.slot_min_chord(0.8), MIN_CHORD_FLOOR);
        assert_eq!(est.node_min_chord(&NodeId::from("a"), 0.8), MIN_CHORD_FLOOR);
    }

    #[test]
    fn test_invalid_sizes_are_ignored() {
        let g = graph_of(&["a"]);
        let source = |_: &NodeId| Some((f64::NAN, 4.0));
        let est = NodeSizeEstimator::new(&g, &source);
        assert_eq!(est.average_radius(), DEFAULT_AVERAGE_RADIUS);
    }
}
