//! Top-down axis-aligned tree layout.
//!
//! Leaves take consecutive horizontal slots in depth-first order, internal
//! nodes sit over the mean x of their children, and each level is a fixed
//! vertical step below its parent. The finished drawing is shifted so its
//! bounding-box center lands on the caller's anchor.

use std::collections::HashMap;

use tracing::info;

use super::spanning::SpanningTree;
use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::Point2D;
use crate::graph::{MindMapGraph, NodeId};

/// Result of a tree layout run.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub root: NodeId,
    pub positions: HashMap<NodeId, Point2D>,
    /// Leaves in the order they received horizontal slots.
    pub leaf_order: Vec<NodeId>,
}

impl TreeLayout {
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }
}

pub struct TreeLayoutEngine {
    config: LayoutConfig,
}

impl TreeLayoutEngine {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&LayoutConfig::default())
    }

    /// Lay out every node reachable from `root`, centered on `anchor`.
    pub fn layout(
        &self,
        graph: &MindMapGraph,
        root: Option<&NodeId>,
        anchor: Point2D,
    ) -> Result<TreeLayout> {
        let root = graph
            .resolve_root(root, Some(anchor))
            .ok_or(LayoutError::EmptyGraph)?;
        let tree = SpanningTree::bfs(graph, &root).ok_or(LayoutError::EmptyGraph)?;

        let x_spacing = self.config.ring_step;
        let y_spacing = self.config.ring_step * self.config.tree_vertical_ratio;

        let mut raw: HashMap<NodeId, Point2D> = HashMap::with_capacity(tree.len());
        let mut leaf_order = Vec::new();

        // Post-order walk: (node, depth, children already placed)
        let mut stack = vec![(root.clone(), 0usize, false)];
        while let Some((node, depth, expanded)) = stack.pop() {
            let children = tree.children(&node);
            let y = depth as f64 * y_spacing;

            if children.is_empty() {
                let x = leaf_order.len() as f64 * x_spacing;
                raw.insert(node.clone(), Point2D::new(x, y));
                leaf_order.push(node);
            } else if expanded {
                let sum: f64 = children.iter().filter_map(|c| raw.get(c)).map(|p| p.x).sum();
                let x = sum / children.len() as f64;
                raw.insert(node, Point2D::new(x, y));
            } else {
                stack.push((node.clone(), depth, true));
                for child in children.iter().rev() {
                    stack.push((child.clone(), depth + 1, false));
                }
            }
        }

        let positions = recenter(raw, anchor);
        info!(root = %root, nodes = positions.len(), leaves = leaf_order.len(), "tree layout complete");

        Ok(TreeLayout {
            root,
            positions,
            leaf_order,
        })
    }
}

/// Shift every point so the bounding-box center equals `anchor`.
fn recenter(points: HashMap<NodeId, Point2D>, anchor: Point2D) -> HashMap<NodeId, Point2D> {
    let Some((min_x, min_y, max_x, max_y)) = points.values().fold(None, |acc, p| {
        Some(match acc {
            None => (p.x, p.y, p.x, p.y),
            Some((a, b, c, d)) => (p.x.min(a), p.y.min(b), p.x.max(c), p.y.max(d)),
        })
    }) else {
        return points;
    };
    let dx = anchor.x - (min_x + max_x) / 2.0;
    let dy = anchor.y - (min_y + max_y) / 2.0;
    points
        .into_iter()
        .map(|(id, p)| (id, Point2D::new(p.x + dx, p.y + dy)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn build(edges: &[(&str, &str)]) -> MindMapGraph {
        let mut g = MindMapGraph::new();
        for (a, b) in edges {
            for n in [a, b] {
                if !g.contains(&id(n)) {
                    g.add_node(id(n), Point2D::default()).unwrap();
                }
            }
            g.add_edge(&id(a), &id(b)).unwrap();
        }
        g
    }

    #[test]
    fn test_single_node_on_anchor() {
        let mut g = MindMapGraph::new();
        g.add_node(id("solo"), Point2D::new(5.0, 5.0)).unwrap();
        let layout = TreeLayoutEngine::with_defaults()
            .layout(&g, Some(&id("solo")), Point2D::new(100.0, 200.0))
            .unwrap();
        assert_eq!(layout.positions[&id("solo")], Point2D::new(100.0, 200.0));
    }

    #[test]
    fn test_parent_over_children() {
        let g = build(&[("r", "a"), ("r", "b"), ("r", "c")]);
        let layout = TreeLayoutEngine::with_defaults()
            .layout(&g, Some(&id("r")), Point2D::default())
            .unwrap();

        let r = layout.positions[&id("r")];
        let a = layout.positions[&id("a")];
        let b = layout.positions[&id("b")];
        let c = layout.positions[&id("c")];
        assert_eq!(layout.leaf_order, vec![id("a"), id("b"), id("c")]);
        assert!((b.x - a.x - 180.0).abs() < 1e-9);
        assert!((r.x - b.x).abs() < 1e-9);
        // 180 * 0.9 below the root
        assert!((a.y - r.y - 162.0).abs() < 1e-9);
        // Bounding box centered on the anchor
        assert!(((a.x + c.x) / 2.0).abs() < 1e-9);
        assert!(((r.y + a.y) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_uneven_subtrees() {
        let g = build(&[("r", "a"), ("r", "b"), ("a", "a1"), ("a", "a2")]);
        let layout = TreeLayoutEngine::with_defaults()
            .layout(&g, Some(&id("r")), Point2D::default())
            .unwrap();
        assert_eq!(layout.leaf_order, vec![id("a1"), id("a2"), id("b")]);
        let a = layout.positions[&id("a")];
        let a1 = layout.positions[&id("a1")];
        let a2 = layout.positions[&id("a2")];
        assert!((a.x - (a1.x + a2.x) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_graph() {
        let g = MindMapGraph::new();
        assert_eq!(
            TreeLayoutEngine::with_defaults()
                .layout(&g, None, Point2D::default())
                .map(|l| l.node_count()),
            Err(LayoutError::EmptyGraph)
        );
    }

    proptest! {
        #[test]
        fn leaves_strictly_increase_in_dfs_order(
            parents in proptest::collection::vec(0usize..1000, 1..80),
        ) {
            let name = |i: usize| NodeId::new(format!("n{i:03}"));
            let mut g = MindMapGraph::new();
            g.add_node(name(0), Point2D::default()).unwrap();
            for (i, &p) in parents.iter().enumerate() {
                g.add_node(name(i + 1), Point2D::default()).unwrap();
                g.add_edge(&name(p % (i + 1)), &name(i + 1)).unwrap();
            }

            let layout = TreeLayoutEngine::with_defaults()
                .layout(&g, Some(&name(0)), Point2D::default())
                .unwrap();
            prop_assert_eq!(layout.node_count(), parents.len() + 1);
            let xs: Vec<f64> = layout.leaf_order.iter().map(|l| layout.positions[l].x).collect();
            for w in xs.windows(2) {
                prop_assert!(w[0] < w[1]);
            }
        }
    }
}
