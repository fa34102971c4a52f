//! Mind-map session: graph, spatial index and placement state kept in step.
//!
//! Every position change goes through [`MindMap::move_node`], which updates
//! the graph and the spatial index in the same call. If the two are ever
//! found out of sync the index is rebuilt from graph positions.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::Point2D;
use crate::graph::{MindMapGraph, Node, NodeId};
use crate::layout::{
    ChildAngleHints, FreeSlotFinder, NodeSizeEstimator, RadialLayout, RadialLayoutEngine,
    SlotPlacement, TreeLayout, TreeLayoutEngine,
};
use crate::spatial::SpatialIndex;

/// Owner of one mind map's nodes, edges and placement state.
#[derive(Debug, Clone)]
pub struct MindMap {
    config: LayoutConfig,
    graph: MindMapGraph,
    index: SpatialIndex,
    /// Visual (width, height) per node, as measured by the host.
    sizes: HashMap<NodeId, (f64, f64)>,
    hints: ChildAngleHints,
}

impl MindMap {
    pub fn new(config: LayoutConfig) -> Self {
        let config = config.sanitized();
        Self {
            index: SpatialIndex::new(config.spatial_cell_size),
            config,
            graph: MindMapGraph::new(),
            sizes: HashMap::new(),
            hints: ChildAngleHints::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LayoutConfig::default())
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn graph(&self) -> &MindMapGraph {
        &self.graph
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn hints(&self) -> &ChildAngleHints {
        &self.hints
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn position(&self, id: &NodeId) -> Option<Point2D> {
        self.graph.position(id)
    }

    /// Collision radius the index uses for `id`.
    pub fn node_radius(&self, id: &NodeId) -> f64 {
        NodeSizeEstimator::new(&self.graph, &self.sizes).node_radius(id)
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Create a node and register it in the spatial index.
    ///
    /// The first node ever added becomes the designated root.
    pub fn add_node(&mut self, id: NodeId, position: Point2D, size: Option<(f64, f64)>) -> Result<()> {
        self.graph.add_node(id.clone(), position)?;
        if let Some(size) = size {
            self.sizes.insert(id.clone(), size);
        }
        let radius = self.node_radius(&id);
        self.index.insert(&id, position.x, position.y, radius);
        if self.graph.root().is_none() {
            self.graph.set_root(&id);
        }
        Ok(())
    }

    /// Record a new visual size and re-register the node with its new radius.
    pub fn set_node_size(&mut self, id: &NodeId, width: f64, height: f64) -> Result<()> {
        let position = self
            .graph
            .position(id)
            .ok_or_else(|| LayoutError::UnknownNode(id.clone()))?;
        self.sizes.insert(id.clone(), (width, height));
        let radius = self.node_radius(id);
        self.index.remove(id, position.x, position.y);
        self.index.insert(id, position.x, position.y, radius);
        Ok(())
    }

    /// Move a node, keeping the index in step. Returns the old position.
    pub fn move_node(&mut self, id: &NodeId, to: Point2D) -> Result<Point2D> {
        let from = self.graph.set_position(id, to)?;
        if self.index.contains(id) {
            self.index.move_node(id, from.x, from.y, to.x, to.y);
        } else {
            warn!(node = %id, "node missing from spatial index, rebuilding");
            self.rebuild_index();
        }
        Ok(from)
    }

    /// Remove a node, its edges, its size and its child-angle hint.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node> {
        let position = self
            .graph
            .position(id)
            .ok_or_else(|| LayoutError::UnknownNode(id.clone()))?;
        self.index.remove(id, position.x, position.y);
        self.sizes.remove(id);
        self.hints.forget(id);
        self.graph
            .remove_node(id)
            .ok_or_else(|| LayoutError::UnknownNode(id.clone()))
    }

    pub fn set_root(&mut self, id: &NodeId) -> bool {
        self.graph.set_root(id)
    }

    pub fn set_color(&mut self, id: &NodeId, color: Option<String>) -> Result<()> {
        self.graph.set_color(id, color)
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    pub fn connect(&mut self, a: &NodeId, b: &NodeId) -> Result<()> {
        self.graph.add_edge(a, b)
    }

    pub fn disconnect(&mut self, a: &NodeId, b: &NodeId) -> bool {
        self.graph.remove_edge(a, b)
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Free slot for a new child of `anchor` with the given box, without creating it.
    pub fn find_slot(&mut self, anchor: &NodeId, size: Option<(f64, f64)>) -> Result<SlotPlacement> {
        let finder = FreeSlotFinder::new(&self.config, &self.sizes);
        finder.find_slot(anchor, size, &self.graph, &self.index, &mut self.hints)
    }

    /// Create `id` as a child of `anchor` in the nearest free slot.
    ///
    /// With no anchor (or an unknown one) the effective root near `viewport`
    /// is used. On an empty map the node becomes the root at `viewport`.
    pub fn add_child(
        &mut self,
        anchor: Option<&NodeId>,
        id: NodeId,
        size: Option<(f64, f64)>,
        viewport: Point2D,
    ) -> Result<SlotPlacement> {
        if self.graph.contains(&id) {
            return Err(LayoutError::DuplicateNode(id));
        }

        if self.graph.is_empty() {
            let position = viewport.snapped(self.config.snap_step);
            self.add_node(id.clone(), position, size)?;
            self.graph.set_root(&id);
            debug!(node = %id, "first node placed as root");
            return Ok(SlotPlacement {
                angle: 0.0,
                radius: 0.0,
                position,
                exhausted: false,
            });
        }

        let anchor = self
            .graph
            .resolve_root(anchor, Some(viewport))
            .ok_or(LayoutError::EmptyGraph)?;
        let slot = self.find_slot(&anchor, size)?;
        self.add_node(id.clone(), slot.position, size)?;
        self.graph.add_edge(&anchor, &id)?;
        debug!(
            node = %id,
            anchor = %anchor,
            x = slot.position.x,
            y = slot.position.y,
            exhausted = slot.exhausted,
            "child added"
        );
        Ok(slot)
    }

    // =========================================================================
    // Full Layouts
    // =========================================================================

    /// Radial layout around `anchor`, committed to the graph and index.
    ///
    /// Non-root positions are snapped to the grid; the root sits exactly on
    /// `anchor`. The returned layout carries the unsnapped engine output.
    pub fn arrange_radial(&mut self, root: Option<&NodeId>, anchor: Point2D) -> Result<RadialLayout> {
        let layout = RadialLayoutEngine::new(&self.config, &self.sizes).layout(&self.graph, root, anchor)?;
        self.graph.set_root(&layout.root);

        let snap = self.config.snap_step;
        let mut committed: Vec<(NodeId, Point2D)> = layout
            .positions
            .iter()
            .map(|(id, &p)| {
                let p = if *id == layout.root { p } else { p.snapped(snap) };
                (id.clone(), p)
            })
            .collect();
        committed.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, p) in committed {
            self.move_node(&id, p)?;
        }
        Ok(layout)
    }

    /// Top-down tree layout centered on `anchor`, committed to the graph and index.
    pub fn arrange_tree(&mut self, root: Option<&NodeId>, anchor: Point2D) -> Result<TreeLayout> {
        let layout = TreeLayoutEngine::new(&self.config).layout(&self.graph, root, anchor)?;
        self.graph.set_root(&layout.root);

        let mut committed: Vec<(NodeId, Point2D)> =
            layout.positions.iter().map(|(id, &p)| (id.clone(), p)).collect();
        committed.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, p) in committed {
            self.move_node(&id, p)?;
        }
        Ok(layout)
    }

    // =========================================================================
    // Index Maintenance
    // =========================================================================

    /// Re-register every node from its current graph position.
    pub fn rebuild_index(&mut self) {
        let estimator = NodeSizeEstimator::new(&self.graph, &self.sizes);
        let entries: Vec<_> = self
            .graph
            .nodes()
            .map(|n| (n.id.clone(), n.position.x, n.position.y, estimator.node_radius(&n.id)))
            .collect();
        self.index.rebuild(entries);
        info!(nodes = self.index.len(), buckets = self.index.bucket_count(), "spatial index rebuilt");
    }

    /// Whether every node sits in exactly the cells its current position implies.
    pub fn index_is_consistent(&self) -> bool {
        self.index.len() == self.graph.node_count()
            && self
                .graph
                .nodes()
                .all(|n| self.index.is_registered_at(&n.id, n.position.x, n.position.y))
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
        self.sizes.clear();
        self.hints.clear();
    }
}

impl Default for MindMap {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_add_node_registers_in_index() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::new(10.0, 20.0), Some((120.0, 50.0))).unwrap();

        assert_eq!(mm.node_count(), 1);
        assert!(mm.index().contains(&id("a")));
        // half of the 130 diagonal plus the 10 unit buffer
        assert_eq!(mm.index().radius(&id("a")), Some(75.0));
        assert!(mm.index_is_consistent());
        assert_eq!(mm.graph().root(), Some(&id("a")));
    }

    #[test]
    fn test_duplicate_node() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        assert_eq!(
            mm.add_node(id("a"), Point2D::default(), None),
            Err(LayoutError::DuplicateNode(id("a")))
        );
    }

    #[test]
    fn test_move_keeps_index_in_step() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        let old = mm.move_node(&id("a"), Point2D::new(900.0, -300.0)).unwrap();
        assert_eq!(old, Point2D::default());
        assert!(mm.index_is_consistent());
        assert!(mm.index().neighbors(900.0, -300.0, 1.0).contains(&id("a")));
        assert!(!mm.index().neighbors(0.0, 0.0, 1.0).contains(&id("a")));
    }

    #[test]
    fn test_move_unknown_node() {
        let mut mm = MindMap::with_defaults();
        assert_eq!(
            mm.move_node(&id("ghost"), Point2D::default()),
            Err(LayoutError::UnknownNode(id("ghost")))
        );
    }

    #[test]
    fn test_move_rebuilds_diverged_index() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        mm.add_node(id("b"), Point2D::new(500.0, 0.0), None).unwrap();
        // Simulate a lost registration
        mm.index.remove(&id("b"), 500.0, 0.0);
        assert!(!mm.index_is_consistent());

        mm.move_node(&id("b"), Point2D::new(600.0, 0.0)).unwrap();
        assert!(mm.index_is_consistent());
    }

    #[test]
    fn test_remove_node_cleans_up() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        let slot = mm.add_child(Some(&id("a")), id("b"), None, Point2D::default()).unwrap();
        assert!(!slot.exhausted);
        assert!(mm.hints().get(&id("a")).is_some());

        let removed = mm.remove_node(&id("a")).unwrap();
        assert_eq!(removed.id, id("a"));
        assert!(!mm.index().contains(&id("a")));
        assert!(mm.hints().get(&id("a")).is_none());
        assert_eq!(mm.graph().edge_count(), 0);
        assert!(mm.index_is_consistent());
        assert_eq!(mm.remove_node(&id("a")).map(|n| n.id), Err(LayoutError::UnknownNode(id("a"))));
    }

    #[test]
    fn test_set_node_size_reregisters() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), Some((30.0, 40.0))).unwrap();
        assert_eq!(mm.index().radius(&id("a")), Some(35.0));
        mm.set_node_size(&id("a"), 300.0, 400.0).unwrap();
        assert_eq!(mm.index().radius(&id("a")), Some(260.0));
        assert!(mm.index_is_consistent());
        assert!(mm.set_node_size(&id("ghost"), 1.0, 1.0).is_err());
    }

    #[test]
    fn test_add_child_on_empty_map_becomes_root() {
        let mut mm = MindMap::with_defaults();
        let slot = mm
            .add_child(None, id("root"), None, Point2D::new(103.0, 61.0))
            .unwrap();
        assert_eq!(slot.position, Point2D::new(120.0, 80.0));
        assert_eq!(mm.graph().root(), Some(&id("root")));
        assert_eq!(mm.position(&id("root")), Some(Point2D::new(120.0, 80.0)));
    }

    #[test]
    fn test_add_child_rejects_duplicate_before_searching() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        assert_eq!(
            mm.add_child(Some(&id("a")), id("a"), None, Point2D::default()),
            Err(LayoutError::DuplicateNode(id("a")))
        );
        assert!(mm.hints().is_empty());
    }

    #[test]
    fn test_add_children_do_not_collide() {
        let mut mm = MindMap::with_defaults();
        mm.add_child(None, id("root"), None, Point2D::default()).unwrap();
        for i in 0..6 {
            let slot = mm
                .add_child(Some(&id("root")), id(&format!("c{i}")), None, Point2D::default())
                .unwrap();
            assert!(!slot.exhausted);
        }
        assert_eq!(mm.graph().degree(&id("root")), 6);
        let nodes: Vec<_> = mm.graph().nodes().cloned().collect();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                let ra = mm.index().radius(&a.id).unwrap();
                let rb = mm.index().radius(&b.id).unwrap();
                assert!(a.position.distance(b.position) >= ra + rb);
            }
        }
        assert!(mm.index_is_consistent());
    }

    #[test]
    fn test_sized_child_clears_its_anchor() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        let slot = mm
            .add_child(Some(&id("a")), id("big"), Some((600.0, 400.0)), Point2D::default())
            .unwrap();
        assert!(!slot.exhausted);

        let ra = mm.index().radius(&id("a")).unwrap();
        let rb = mm.index().radius(&id("big")).unwrap();
        assert!(rb > 370.0);
        let dist = mm.position(&id("big")).unwrap().distance(Point2D::default());
        assert!(dist >= ra + rb, "dist={dist} ra={ra} rb={rb}");

        // A second sized sibling clears both
        let slot = mm
            .add_child(Some(&id("a")), id("wide"), Some((300.0, 120.0)), Point2D::default())
            .unwrap();
        assert!(!slot.exhausted);
        let rw = mm.index().radius(&id("wide")).unwrap();
        let pw = mm.position(&id("wide")).unwrap();
        assert!(pw.distance(Point2D::default()) >= ra + rw);
        assert!(pw.distance(mm.position(&id("big")).unwrap()) >= rb + rw);
    }

    #[test]
    fn test_arrange_radial_commits_snapped_positions() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("root"), Point2D::new(7.0, 7.0), None).unwrap();
        for name in ["a", "b", "c"] {
            mm.add_node(id(name), Point2D::default(), None).unwrap();
            mm.connect(&id("root"), &id(name)).unwrap();
        }
        let anchor = Point2D::new(13.0, 17.0);
        let layout = mm.arrange_radial(None, anchor).unwrap();

        assert_eq!(layout.root, id("root"));
        assert_eq!(mm.position(&id("root")), Some(anchor));
        for name in ["a", "b", "c"] {
            let p = mm.position(&id(name)).unwrap();
            assert_eq!(p, layout.positions[&id(name)].snapped(40.0));
        }
        assert!(mm.index_is_consistent());
    }

    #[test]
    fn test_arrange_tree_records_root() {
        let mut mm = MindMap::with_defaults();
        for name in ["a", "b", "c"] {
            mm.add_node(id(name), Point2D::default(), None).unwrap();
        }
        mm.connect(&id("a"), &id("b")).unwrap();
        mm.connect(&id("b"), &id("c")).unwrap();

        let layout = mm.arrange_tree(Some(&id("b")), Point2D::default()).unwrap();
        assert_eq!(layout.root, id("b"));
        assert_eq!(mm.graph().root(), Some(&id("b")));
        assert_eq!(mm.position(&id("b")), Some(layout.positions[&id("b")]));
        assert!(mm.index_is_consistent());
    }

    #[test]
    fn test_rebuild_index() {
        let mut mm = MindMap::with_defaults();
        mm.add_node(id("a"), Point2D::default(), None).unwrap();
        mm.add_node(id("b"), Point2D::new(300.0, 0.0), None).unwrap();
        mm.index.clear();
        mm.rebuild_index();
        assert_eq!(mm.index().len(), 2);
        assert!(mm.index_is_consistent());
    }
}
