//! Layout configuration.
//!
//! Every engine receives a [`LayoutConfig`] and calls [`LayoutConfig::sanitized`]
//! on construction. Values outside their sane range are clamped, never rejected,
//! so a half-filled settings object coming from JavaScript still lays out.

use serde::{Deserialize, Serialize};

/// Hard floor for the spatial grid cell size.
pub const MIN_CELL_SIZE: f64 = 40.0;

/// Configuration shared by the placement and layout engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Radius of the first placement ring around an anchor (default: 160).
    pub base_radius: f64,
    /// Distance between consecutive rings, roughly the target edge length (default: 180).
    pub ring_step: f64,
    /// Scales the minimum chord between neighbouring nodes (default: 0.8).
    pub min_chord_ratio: f64,
    /// Maximum ring stretch, as a multiple of `ring_step` (default: 3.0).
    pub max_extra_stretch: f64,
    /// Increment used while stretching a ring outward (default: 40).
    pub stretch_step: f64,
    /// Angular padding at sector edges in the radial layout, in degrees (default: 6).
    pub pad_angle_degrees: f64,
    /// Angular padding at gap edges in free-slot search, in degrees (default: 8).
    pub slot_pad_degrees: f64,
    /// Widest cone a non-root subtree may fan into, in degrees (default: 120).
    pub max_cone_degrees: f64,
    /// Spatial index cell size, floored at 40 (default: 120).
    pub spatial_cell_size: f64,
    /// Minimum spacing a freshly placed node claims (default: 140).
    pub min_node_distance: f64,
    /// Grid quantization step for placed positions (default: 40).
    pub snap_step: f64,
    /// Rings tried beyond the first during free-slot search (default: 6).
    pub slot_max_rings: u32,
    /// Angular step between free-slot candidates, in degrees (default: 10).
    pub slot_angle_step_degrees: f64,
    /// Maximum rings one parent may spill its children into (default: 4).
    pub max_rings_per_level: u32,
    /// Vertical spacing of the tree layout as a fraction of `ring_step` (default: 0.9).
    pub tree_vertical_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_radius: 160.0,
            ring_step: 180.0,
            min_chord_ratio: 0.8,
            max_extra_stretch: 3.0,
            stretch_step: 40.0,
            pad_angle_degrees: 6.0,
            slot_pad_degrees: 8.0,
            max_cone_degrees: 120.0,
            spatial_cell_size: 120.0,
            min_node_distance: 140.0,
            snap_step: 40.0,
            slot_max_rings: 6,
            slot_angle_step_degrees: 10.0,
            max_rings_per_level: 4,
            tree_vertical_ratio: 0.9,
        }
    }
}

impl LayoutConfig {
    /// Return a copy with every field clamped into its usable range.
    ///
    /// Non-finite values fall back to the field default.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            base_radius: finite_or(self.base_radius, d.base_radius).max(0.0),
            ring_step: finite_or(self.ring_step, d.ring_step).max(1.0),
            min_chord_ratio: finite_or(self.min_chord_ratio, d.min_chord_ratio).max(0.0),
            max_extra_stretch: finite_or(self.max_extra_stretch, d.max_extra_stretch).max(0.0),
            stretch_step: finite_or(self.stretch_step, d.stretch_step).max(1.0),
            pad_angle_degrees: finite_or(self.pad_angle_degrees, d.pad_angle_degrees)
                .clamp(0.0, 45.0),
            slot_pad_degrees: finite_or(self.slot_pad_degrees, d.slot_pad_degrees)
                .clamp(2.0, 45.0),
            max_cone_degrees: finite_or(self.max_cone_degrees, d.max_cone_degrees)
                .clamp(1.0, 360.0),
            spatial_cell_size: finite_or(self.spatial_cell_size, d.spatial_cell_size)
                .max(MIN_CELL_SIZE),
            min_node_distance: finite_or(self.min_node_distance, d.min_node_distance).max(0.0),
            snap_step: finite_or(self.snap_step, d.snap_step).max(1.0),
            slot_max_rings: self.slot_max_rings.min(64),
            slot_angle_step_degrees: finite_or(
                self.slot_angle_step_degrees,
                d.slot_angle_step_degrees,
            )
            .clamp(1.0, 90.0),
            max_rings_per_level: self.max_rings_per_level.clamp(1, 32),
            tree_vertical_ratio: {
                let v = finite_or(self.tree_vertical_ratio, d.tree_vertical_ratio);
                if v > 0.0 { v } else { d.tree_vertical_ratio }
            },
        }
    }

    /// Absolute stretch budget for a single ring.
    pub fn max_stretch_distance(&self) -> f64 {
        self.max_extra_stretch * self.ring_step
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
