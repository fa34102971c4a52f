//! Grid-bucketed proximity index over node circles.
//!
//! Space is divided into square cells; each node is registered in every cell
//! its collision circle overlaps. A proximity query returns the union of the
//! buckets under the query circle, so results are a conservative superset and
//! callers must run an exact circle/circle test before treating a hit as a
//! collision.
//!
//! Invariant: a node with a cached radius appears in exactly the cells its
//! registered circle covers; a node without one appears in no cell.

use std::collections::{HashMap, HashSet};

use crate::config::MIN_CELL_SIZE;
use crate::graph::NodeId;

type CellKey = (i64, i64);

/// Grid-bucketed spatial index.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    /// Side length of each cell, never below [`MIN_CELL_SIZE`].
    cell_size: f64,
    /// Cell -> nodes whose circle overlaps it. Empty buckets are pruned.
    cells: HashMap<CellKey, HashSet<NodeId>>,
    /// Last registered radius per node.
    radius: HashMap<NodeId, f64>,
    /// Count of single-id bucket insertions and removals.
    mutations: u64,
}

impl SpatialIndex {
    /// Create an index; `cell_size` is clamped to at least 40.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            radius: HashMap::new(),
            mutations: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cells overlapped by the bounding square of a circle.
    fn cell_range(&self, x: f64, y: f64, r: f64) -> impl Iterator<Item = CellKey> + use<> {
        let c = self.cell_size;
        let r = r.max(0.0);
        let x0 = ((x - r) / c).floor() as i64;
        let x1 = ((x + r) / c).floor() as i64;
        let y0 = ((y - r) / c).floor() as i64;
        let y1 = ((y + r) / c).floor() as i64;
        (x0..=x1).flat_map(move |ix| (y0..=y1).map(move |iy| (ix, iy)))
    }

    fn add_to_cell(&mut self, key: CellKey, id: &NodeId) {
        if self.cells.entry(key).or_default().insert(id.clone()) {
            self.mutations += 1;
        }
    }

    fn remove_from_cell(&mut self, key: CellKey, id: &NodeId) {
        if let Some(bucket) = self.cells.get_mut(&key) {
            if bucket.remove(id) {
                self.mutations += 1;
            }
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Register a node circle in every cell it overlaps.
    ///
    /// Re-inserting the same id at the same place is a no-op. To relocate a
    /// node use [`Self::move_node`] or remove it first.
    pub fn insert(&mut self, id: &NodeId, x: f64, y: f64, r: f64) {
        let r = if r.is_finite() { r.max(0.0) } else { 0.0 };
        self.radius.insert(id.clone(), r);
        for key in self.cell_range(x, y, r) {
            self.add_to_cell(key, id);
        }
    }

    /// Deregister a node last registered at (x, y). Unknown ids are ignored.
    pub fn remove(&mut self, id: &NodeId, x: f64, y: f64) {
        let Some(r) = self.radius.remove(id) else {
            return;
        };
        for key in self.cell_range(x, y, r) {
            self.remove_from_cell(key, id);
        }
    }

    /// Move a node, touching only the cells that enter or leave its footprint.
    pub fn move_node(&mut self, id: &NodeId, old_x: f64, old_y: f64, new_x: f64, new_y: f64) {
        let Some(&r) = self.radius.get(id) else {
            return;
        };
        let old: HashSet<CellKey> = self.cell_range(old_x, old_y, r).collect();
        let new: HashSet<CellKey> = self.cell_range(new_x, new_y, r).collect();
        for &key in old.difference(&new) {
            self.remove_from_cell(key, id);
        }
        for &key in new.difference(&old) {
            self.add_to_cell(key, id);
        }
    }

    /// Every node sharing a cell with the query circle (superset of true overlaps).
    pub fn neighbors(&self, x: f64, y: f64, r: f64) -> HashSet<NodeId> {
        let mut hits = HashSet::new();
        for key in self.cell_range(x, y, r) {
            if let Some(bucket) = self.cells.get(&key) {
                hits.extend(bucket.iter().cloned());
            }
        }
        hits
    }

    /// Cached radius of a registered node.
    pub fn radius(&self, id: &NodeId) -> Option<f64> {
        self.radius.get(id).copied()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.radius.contains_key(id)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }

    /// Total single-id bucket insertions and removals since creation.
    pub fn bucket_mutations(&self) -> u64 {
        self.mutations
    }

    /// Whether `id` occupies exactly the cells its circle at (x, y) covers.
    pub fn is_registered_at(&self, id: &NodeId, x: f64, y: f64) -> bool {
        let Some(r) = self.radius(id) else {
            return !self.cells.values().any(|b| b.contains(id));
        };
        let expected: HashSet<CellKey> = self.cell_range(x, y, r).collect();
        let actual: HashSet<CellKey> = self
            .cells
            .iter()
            .filter(|(_, bucket)| bucket.contains(id))
            .map(|(&key, _)| key)
            .collect();
        expected == actual
    }

    /// Drop everything and re-register from (id, x, y, r) tuples.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (NodeId, f64, f64, f64)>,
    {
        self.clear();
        for (id, x, y, r) in entries {
            self.insert(&id, x, y, r);
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.radius.clear();
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(120.0)
    }
}
