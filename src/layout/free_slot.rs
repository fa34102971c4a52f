//! Incremental placement of one new child next to an anchor node.
//!
//! The search looks at the directions the anchor's existing neighbors already
//! occupy, picks the widest open gap, narrows it to a cone around the
//! anchor's "outward" direction and then walks rings outward from a base
//! radius, trying the gap center first and fanning out in fixed angular
//! steps. The first snapped candidate that clears every indexed node wins.
//!
//! Successive children of the same anchor fan out by the golden angle: the
//! angle chosen last time is kept in [`ChildAngleHints`] and the next search
//! prefers `last + golden_angle`.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::Serialize;
use tracing::{debug, warn};

use super::size::{NodeSizeEstimator, SizeSource};
use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::{angle_between, min_radius_for_chord, normalize_angle, Arc, Point2D};
use crate::graph::{MindMapGraph, NodeId};
use crate::spatial::SpatialIndex;

/// 137.50776405003785 degrees.
pub const GOLDEN_ANGLE: f64 = 137.507_764_050_037_85 * PI / 180.0;

/// Hard cap on the candidate fan-out from the gap center, in degrees.
const MAX_FAN_DEGREES: f64 = 170.0;

/// Upper bound on the jitter applied on outer rings.
const MAX_JITTER: f64 = 8.0;

/// Outcome of a free-slot search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotPlacement {
    /// Direction from the anchor, in `[0, 2π)`.
    pub angle: f64,
    /// Ring radius the slot was found on.
    pub radius: f64,
    /// Snapped scene position of the new node.
    pub position: Point2D,
    /// True when every candidate collided and this is a best-effort fallback.
    pub exhausted: bool,
}

/// Last child angle per anchor.
#[derive(Debug, Clone, Default)]
pub struct ChildAngleHints {
    last: HashMap<NodeId, f64>,
}

impl ChildAngleHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, anchor: &NodeId) -> Option<f64> {
        self.last.get(anchor).copied()
    }

    pub fn record(&mut self, anchor: &NodeId, angle: f64) {
        self.last.insert(anchor.clone(), angle);
    }

    pub fn forget(&mut self, anchor: &NodeId) -> Option<f64> {
        self.last.remove(anchor)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}

/// Single-node placement engine.
pub struct FreeSlotFinder<'a> {
    config: LayoutConfig,
    sizes: &'a dyn SizeSource,
}

impl<'a> FreeSlotFinder<'a> {
    pub fn new(config: &LayoutConfig, sizes: &'a dyn SizeSource) -> Self {
        Self {
            config: config.sanitized(),
            sizes,
        }
    }

    /// Find a collision-free slot for a new child of `anchor`.
    ///
    /// `size` is the new node's own box, when the caller already knows it;
    /// the clearance test then uses the radius the node will be indexed with.
    /// An anchor missing from the graph falls back to the effective root.
    /// The chosen angle is recorded in `hints` for the anchor actually used.
    pub fn find_slot(
        &self,
        anchor: &NodeId,
        size: Option<(f64, f64)>,
        graph: &MindMapGraph,
        index: &SpatialIndex,
        hints: &mut ChildAngleHints,
    ) -> Result<SlotPlacement> {
        let anchor = graph
            .resolve_root(Some(anchor), None)
            .ok_or(LayoutError::EmptyGraph)?;
        let origin = graph
            .position(&anchor)
            .ok_or_else(|| LayoutError::UnknownNode(anchor.clone()))?;

        let cfg = &self.config;
        let estimator = NodeSizeEstimator::new(graph, self.sizes);
        let pad = cfg.slot_pad_degrees.to_radians();

        let preferred = self.preferred_direction(&anchor, origin, graph, hints);

        let mut neighbor_angles: Vec<f64> = graph
            .neighbors(&anchor)
            .into_iter()
            .filter_map(|nb| graph.position(nb))
            .map(|p| angle_between(origin, p))
            .collect();
        neighbor_angles.sort_by(f64::total_cmp);

        let gap = largest_gap(&neighbor_angles, preferred, pad);
        let cone = (120.0 - 10.0 * neighbor_angles.len() as f64).max(60.0).to_radians();
        let sector = gap.clamp_to_cone(preferred, cone);
        let center = sector.center();

        let min_chord = estimator.slot_min_chord(cfg.min_chord_ratio);
        let first_ring = self.first_ring_radius(sector.width, min_chord);
        let new_radius = (cfg.min_node_distance / 2.0).max(estimator.radius_for_size(size));

        let step = cfg.slot_angle_step_degrees.to_radians();
        let limit = (sector.width.to_degrees() * 0.5)
            .min(MAX_FAN_DEGREES)
            .to_radians()
            .max(step);

        for ring_i in 0..=cfg.slot_max_rings {
            let radius = first_ring + f64::from(ring_i) * cfg.ring_step;
            let jitter = if ring_i == 0 {
                0.0
            } else {
                (cfg.ring_step * 0.02).min(MAX_JITTER)
            };

            for angle in fan_candidates(center, step, limit) {
                if !sector.contains(angle) {
                    continue;
                }
                let (jx, jy) = jitter_offsets(&anchor, angle, radius, jitter);
                let raw = origin.polar_offset(angle, radius);
                let position = Point2D::new(raw.x + jx, raw.y + jy).snapped(cfg.snap_step);

                if is_free(position, new_radius, graph, index) {
                    hints.record(&anchor, angle);
                    debug!(
                        anchor = %anchor,
                        ring = ring_i,
                        angle_deg = angle.to_degrees(),
                        radius,
                        "free slot found"
                    );
                    return Ok(SlotPlacement {
                        angle,
                        radius,
                        position,
                        exhausted: false,
                    });
                }
            }
        }

        let last_tried = first_ring + f64::from(cfg.slot_max_rings) * cfg.ring_step;
        let radius = last_tried + cfg.ring_step;
        hints.record(&anchor, center);
        warn!(
            anchor = %anchor,
            rings = cfg.slot_max_rings + 1,
            radius,
            "no free slot within ring cap, placing without collision guarantee"
        );
        Ok(SlotPlacement {
            angle: center,
            radius,
            position: origin.polar_offset(center, radius).snapped(cfg.snap_step),
            exhausted: true,
        })
    }

    /// Outward direction for a new child of `anchor`.
    fn preferred_direction(
        &self,
        anchor: &NodeId,
        origin: Point2D,
        graph: &MindMapGraph,
        hints: &ChildAngleHints,
    ) -> f64 {
        if let Some(last) = hints.get(anchor) {
            return normalize_angle(last + GOLDEN_ANGLE);
        }

        let Some(root) = graph.effective_root(None) else {
            return 0.0;
        };
        let levels = graph.bfs_levels(&root);
        let Some(&own) = levels.get(anchor) else {
            return 0.0;
        };

        graph
            .neighbors(anchor)
            .into_iter()
            .find(|nb| levels.get(*nb).is_some_and(|&l| l < own))
            .and_then(|parent| graph.position(parent))
            .map(|p| angle_between(p, origin))
            .unwrap_or(0.0)
    }

    /// Smallest `base_radius + k * ring_step` that fits `min_chord` across `width`.
    fn first_ring_radius(&self, width: f64, min_chord: f64) -> f64 {
        let cfg = &self.config;
        let needed = min_radius_for_chord(width, min_chord);
        if !needed.is_finite() || needed <= cfg.base_radius {
            return cfg.base_radius;
        }
        let rings_up = ((needed - cfg.base_radius) / cfg.ring_step).ceil();
        cfg.base_radius + rings_up * cfg.ring_step
    }
}

/// The widest open direction range around the anchor, shrunk by `pad` on both edges.
///
/// With no neighbors this is the half plane facing `preferred`.
fn largest_gap(sorted_angles: &[f64], preferred: f64, pad: f64) -> Arc {
    if sorted_angles.is_empty() {
        return Arc::centered(preferred, PI - 2.0 * pad);
    }

    let n = sorted_angles.len();
    let mut best_start = sorted_angles[0];
    let mut best_width = f64::NEG_INFINITY;
    for (i, &a) in sorted_angles.iter().enumerate() {
        let width = if i + 1 < n {
            sorted_angles[i + 1] - a
        } else {
            sorted_angles[0] + std::f64::consts::TAU - a
        };
        if width > best_width {
            best_width = width;
            best_start = a;
        }
    }

    Arc::new(
        best_start + pad,
        (best_width - 2.0 * pad).max(crate::geometry::ANGLE_EPSILON),
    )
}

/// Center first, then alternating `+k*step`, `-k*step` up to `limit`.
fn fan_candidates(center: f64, step: f64, limit: f64) -> impl Iterator<Item = f64> {
    let steps = ((limit + 1e-9) / step).floor() as usize;
    std::iter::once(normalize_angle(center)).chain((1..=steps).flat_map(move |k| {
        let offset = k as f64 * step;
        [normalize_angle(center + offset), normalize_angle(center - offset)]
    }))
}

/// Deterministic per-candidate jitter in `[-magnitude/2, magnitude/2]`.
fn jitter_offsets(anchor: &NodeId, angle: f64, radius: f64, magnitude: f64) -> (f64, f64) {
    if magnitude <= 0.0 {
        return (0.0, 0.0);
    }
    let mut hx = FxHasher::default();
    (anchor, angle.to_bits(), radius.to_bits()).hash(&mut hx);
    let mut hy = FxHasher::default();
    (radius.to_bits(), angle.to_bits(), anchor).hash(&mut hy);

    let unit = |h: u64| 0.5 - (h & 1023) as f64 / 1023.0;
    (magnitude * unit(hx.finish()), magnitude * unit(hy.finish()))
}

/// Exact circle test against every index neighbor near `p`.
fn is_free(p: Point2D, radius: f64, graph: &MindMapGraph, index: &SpatialIndex) -> bool {
    index.neighbors(p.x, p.y, radius).iter().all(|other| {
        match (graph.position(other), index.radius(other)) {
            (Some(q), Some(r_other)) => p.distance(q) >= r_other + radius,
            _ => true,
        }
    })
}
