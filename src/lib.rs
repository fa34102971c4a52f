//! Mind Map Layout - WASM Module
//!
//! Node placement for a mind-map editor: an incremental free-slot search for
//! adding one node next to another, and full radial or top-down layouts for
//! re-arranging a whole map. Compiled to WebAssembly with a JavaScript API
//! exposed via wasm-bindgen; the same types are usable natively.
//!
//! # Architecture
//!
//! - `graph`: Mind-map graph using petgraph's StableGraph (undirected)
//! - `spatial`: Grid buckets for collision tests, R-tree for nearest-node lookup
//! - `layout`: Free-slot search, radial and tree layouts, node size estimation
//! - `mindmap`: Session that keeps graph positions and the spatial index in step
//! - `geometry`, `config`, `error`: Shared helpers, tunables and the error type

use js_sys::Float64Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod mindmap;
pub mod spatial;

pub use config::LayoutConfig;
pub use error::{LayoutError, Result};
pub use geometry::Point2D;
pub use graph::{MindMapGraph, Node, NodeId};
pub use layout::{RadialLayout, SlotPlacement, TreeLayout};
pub use mindmap::MindMap;
pub use spatial::SpatialIndex;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js_error(err: LayoutError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

/// `(width, height)` when both are given, warning about a lone dimension.
fn size_arg(id: &str, width: Option<f64>, height: Option<f64>) -> Option<(f64, f64)> {
    match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        (None, None) => None,
        _ => {
            warn(&format!("node {id}: width and height must be given together, size ignored"));
            None
        }
    }
}

/// One committed node position, as handed to JavaScript.
#[derive(Serialize)]
struct PositionEntry<'a> {
    id: &'a str,
    x: f64,
    y: f64,
}

/// Main entry point for the mind-map layout engine.
///
/// This struct wraps a [`MindMap`] session and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct MindMapWasm {
    map: MindMap,
}

#[wasm_bindgen]
impl MindMapWasm {
    /// Create an empty map.
    ///
    /// `config` is an optional plain object with any subset of the
    /// `LayoutConfig` fields; missing fields take their defaults and
    /// out-of-range values are clamped. An unreadable object falls back to
    /// the defaults with a console warning.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Self {
        let config = if config.is_undefined() || config.is_null() {
            LayoutConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).unwrap_or_else(|err| {
                warn(&format!("invalid layout config, using defaults: {err}"));
                LayoutConfig::default()
            })
        };
        Self {
            map: MindMap::new(config),
        }
    }

    /// Current (sanitized) configuration as a plain object.
    #[wasm_bindgen(js_name = getConfig)]
    pub fn get_config(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.map.config()).map_err(Into::into)
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node at a position. Width and height are the label box, if known.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(
        &mut self,
        id: String,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> std::result::Result<(), JsValue> {
        let size = size_arg(&id, width, height);
        self.map
            .add_node(NodeId::from(id), Point2D::new(x, y), size)
            .map_err(to_js_error)
    }

    /// Update a node's measured label box.
    #[wasm_bindgen(js_name = setNodeSize)]
    pub fn set_node_size(&mut self, id: &str, width: f64, height: f64) -> std::result::Result<(), JsValue> {
        self.map
            .set_node_size(&NodeId::from(id), width, height)
            .map_err(to_js_error)
    }

    /// Set or clear a node's hex color.
    #[wasm_bindgen(js_name = setNodeColor)]
    pub fn set_node_color(&mut self, id: &str, color: Option<String>) -> std::result::Result<(), JsValue> {
        self.map
            .set_color(&NodeId::from(id), color)
            .map_err(to_js_error)
    }

    /// Remove a node and its edges.
    ///
    /// Returns true if the node existed and was removed.
    #[wasm_bindgen(js_name = removeNode)]
    pub fn remove_node(&mut self, id: &str) -> bool {
        self.map.remove_node(&NodeId::from(id)).is_ok()
    }

    /// Move a node (e.g. after a drag), keeping the spatial index current.
    #[wasm_bindgen(js_name = moveNode)]
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> std::result::Result<(), JsValue> {
        self.map
            .move_node(&NodeId::from(id), Point2D::new(x, y))
            .map(|_| ())
            .map_err(to_js_error)
    }

    /// Designate the layout root. Returns false for unknown ids.
    #[wasm_bindgen(js_name = setRoot)]
    pub fn set_root(&mut self, id: &str) -> bool {
        self.map.set_root(&NodeId::from(id))
    }

    /// Get the designated root, if any.
    #[wasm_bindgen(js_name = getRoot)]
    pub fn get_root(&self) -> Option<String> {
        self.map.graph().root().map(|r| r.to_string())
    }

    /// Get the number of nodes in the map.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.map.node_count()
    }

    /// Get a node's position as `[x, y]`.
    #[wasm_bindgen(js_name = getNodePosition)]
    pub fn get_node_position(&self, id: &str) -> Option<Vec<f64>> {
        self.map.position(&NodeId::from(id)).map(|p| vec![p.x, p.y])
    }

    /// All node ids in internal order; aligned with `getPositions`.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Vec<String> {
        self.map.graph().node_ids().map(|id| id.to_string()).collect()
    }

    /// All positions as `[x0, y0, x1, y1, ...]`, aligned with `nodeIds`.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float64Array {
        let flat: Vec<f64> = self
            .map
            .graph()
            .nodes()
            .flat_map(|n| [n.position.x, n.position.y])
            .collect();
        Float64Array::from(&flat[..])
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Connect two existing nodes.
    pub fn connect(&mut self, a: &str, b: &str) -> std::result::Result<(), JsValue> {
        self.map
            .connect(&NodeId::from(a), &NodeId::from(b))
            .map_err(to_js_error)
    }

    /// Disconnect two nodes. Returns true if an edge was removed.
    pub fn disconnect(&mut self, a: &str, b: &str) -> bool {
        self.map.disconnect(&NodeId::from(a), &NodeId::from(b))
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Find a free slot for a new child of `anchor` without creating it.
    ///
    /// Width and height are the new node's label box, if known.
    /// Returns `{ angle, radius, position: { x, y }, exhausted }`.
    #[wasm_bindgen(js_name = findSlot)]
    pub fn find_slot(
        &mut self,
        anchor: &str,
        width: Option<f64>,
        height: Option<f64>,
    ) -> std::result::Result<JsValue, JsValue> {
        let size = size_arg(anchor, width, height);
        let slot = self
            .map
            .find_slot(&NodeId::from(anchor), size)
            .map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&slot).map_err(Into::into)
    }

    /// Create a node as a child of `anchor` in the nearest free slot.
    ///
    /// Without an anchor the root nearest the viewport center is used; on an
    /// empty map the node becomes the root at the viewport center.
    #[wasm_bindgen(js_name = addChild)]
    pub fn add_child(
        &mut self,
        anchor: Option<String>,
        id: String,
        width: Option<f64>,
        height: Option<f64>,
        viewport_x: f64,
        viewport_y: f64,
    ) -> std::result::Result<JsValue, JsValue> {
        let size = size_arg(&id, width, height);
        let anchor = anchor.map(NodeId::from);
        let slot = self
            .map
            .add_child(anchor.as_ref(), NodeId::from(id), size, Point2D::new(viewport_x, viewport_y))
            .map_err(to_js_error)?;
        if slot.exhausted {
            warn("no free slot found, node placed without collision guarantee");
        }
        serde_wasm_bindgen::to_value(&slot).map_err(Into::into)
    }

    // =========================================================================
    // Full Layouts
    // =========================================================================

    /// Arrange the whole map radially around `(anchor_x, anchor_y)`.
    ///
    /// Returns the committed positions as `[{ id, x, y }, ...]` sorted by id.
    #[wasm_bindgen(js_name = layoutRadial)]
    pub fn layout_radial(
        &mut self,
        root: Option<String>,
        anchor_x: f64,
        anchor_y: f64,
    ) -> std::result::Result<JsValue, JsValue> {
        let root = root.map(NodeId::from);
        let layout = self
            .map
            .arrange_radial(root.as_ref(), Point2D::new(anchor_x, anchor_y))
            .map_err(to_js_error)?;
        self.committed_positions(layout.positions.keys())
    }

    /// Arrange the whole map top-down, centered on `(anchor_x, anchor_y)`.
    ///
    /// Returns the committed positions as `[{ id, x, y }, ...]` sorted by id.
    #[wasm_bindgen(js_name = layoutTree)]
    pub fn layout_tree(
        &mut self,
        root: Option<String>,
        anchor_x: f64,
        anchor_y: f64,
    ) -> std::result::Result<JsValue, JsValue> {
        let root = root.map(NodeId::from);
        let layout = self
            .map
            .arrange_tree(root.as_ref(), Point2D::new(anchor_x, anchor_y))
            .map_err(to_js_error)?;
        self.committed_positions(layout.positions.keys())
    }

    // =========================================================================
    // Index Maintenance
    // =========================================================================

    /// Rebuild the spatial index from current positions.
    #[wasm_bindgen(js_name = rebuildIndex)]
    pub fn rebuild_index(&mut self) {
        self.map.rebuild_index();
    }

    /// Clear all nodes and edges.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl MindMapWasm {
    fn committed_positions<'a>(
        &self,
        ids: impl Iterator<Item = &'a NodeId>,
    ) -> std::result::Result<JsValue, JsValue> {
        let mut ids: Vec<&NodeId> = ids.collect();
        ids.sort();
        let entries: Vec<PositionEntry<'_>> = ids
            .into_iter()
            .filter_map(|id| {
                self.map.position(id).map(|p| PositionEntry {
                    id: id.as_str(),
                    x: p.x,
                    y: p.y,
                })
            })
            .collect();
        serde_wasm_bindgen::to_value(&entries).map_err(Into::into)
    }
}

impl Default for MindMapWasm {
    fn default() -> Self {
        Self {
            map: MindMap::with_defaults(),
        }
    }
}
