//! Concentric-ring radial layout.
//!
//! The root sits at the caller's anchor and owns the full circle. Every node
//! hands each of its children a slice of its own angular sector; children
//! are spread evenly across the (padded, cone-limited) usable part of that
//! sector at a ring radius large enough to keep a minimum chord between
//! neighbors. When one ring cannot hold all children the ring is first
//! stretched outward, then the overflow spills onto additional rings.
//!
//! All angles are polar around the anchor and are kept unwrapped, so a
//! sector like `[-0.3, 0.3)` is valid and every child sector is a linear
//! sub-range of its parent's.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use serde::Serialize;
use tracing::{debug, info};

use super::size::{NodeSizeEstimator, SizeSource};
use super::spanning::SpanningTree;
use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::{chord_angle, clamp_sector_to_cone, Point2D, ANGLE_EPSILON};
use crate::graph::{MindMapGraph, NodeId};

/// Upper bound on stretch increments tried for one ring.
const MAX_STRETCH_ITERATIONS: usize = 1024;

/// Half-open angular range `[start, end)` handed to a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sector {
    pub start: f64,
    pub end: f64,
}

impl Sector {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub const fn full() -> Self {
        Self::new(0.0, TAU)
    }

    /// Zero-width sector at `angle`.
    pub const fn point(angle: f64) -> Self {
        Self::new(angle, angle)
    }

    pub fn width(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Whether `other` lies inside this sector, within `tolerance`.
    pub fn encloses(&self, other: &Sector, tolerance: f64) -> bool {
        other.start >= self.start - tolerance && other.end <= self.end + tolerance
    }

    /// Whether `angle` lies in `[start, end]`, within `tolerance`.
    pub fn covers(&self, angle: f64, tolerance: f64) -> bool {
        angle >= self.start - tolerance && angle <= self.end + tolerance
    }
}

/// Where one node ended up in the radial layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialPlacement {
    pub parent: Option<NodeId>,
    pub depth: usize,
    /// Unwrapped polar angle around the anchor.
    pub angle: f64,
    /// Ring radius; 0 for the root.
    pub radius: f64,
    /// Sector owned by this node's subtree.
    pub sector: Sector,
}

/// Result of a radial layout run.
#[derive(Debug, Clone)]
pub struct RadialLayout {
    pub root: NodeId,
    pub anchor: Point2D,
    /// Unsnapped positions for every node reachable from the root.
    pub positions: HashMap<NodeId, Point2D>,
    pub placements: HashMap<NodeId, RadialPlacement>,
    /// Number of rings each parent spread its children over.
    pub rings_used: HashMap<NodeId, usize>,
}

impl RadialLayout {
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Distinct ring radii used for the children of `parent`, ascending.
    pub fn child_radii(&self, parent: &NodeId) -> Vec<f64> {
        let mut radii: Vec<f64> = self
            .placements
            .values()
            .filter(|p| p.parent.as_ref() == Some(parent))
            .map(|p| p.radius)
            .collect();
        radii.sort_by(f64::total_cmp);
        radii.dedup();
        radii
    }
}

/// Ring radii and how many consecutive children go on each.
#[derive(Debug, Clone, PartialEq)]
struct RingPlan {
    radii: Vec<f64>,
    counts: Vec<usize>,
}

impl RingPlan {
    fn single(radius: f64, count: usize) -> Self {
        Self {
            radii: vec![radius],
            counts: vec![count],
        }
    }

    /// Ring radius for each child index, in order.
    fn per_child(&self) -> Vec<f64> {
        self.radii
            .iter()
            .zip(&self.counts)
            .flat_map(|(&r, &n)| std::iter::repeat_n(r, n))
            .collect()
    }
}

/// Pending subtree on the work stack.
struct Frame {
    node: NodeId,
    depth: usize,
    sector: Sector,
    parent_radius: f64,
}

/// Sector-recursive radial layout engine.
pub struct RadialLayoutEngine<'a> {
    config: LayoutConfig,
    sizes: &'a dyn SizeSource,
}

impl<'a> RadialLayoutEngine<'a> {
    pub fn new(config: &LayoutConfig, sizes: &'a dyn SizeSource) -> Self {
        Self {
            config: config.sanitized(),
            sizes,
        }
    }

    /// Lay out every node reachable from `root` around `anchor`.
    ///
    /// An unknown or missing root falls back to the effective root nearest
    /// the anchor. Only an empty graph is an error.
    pub fn layout(
        &self,
        graph: &MindMapGraph,
        root: Option<&NodeId>,
        anchor: Point2D,
    ) -> Result<RadialLayout> {
        let root = graph
            .resolve_root(root, Some(anchor))
            .ok_or(LayoutError::EmptyGraph)?;
        let tree = SpanningTree::bfs(graph, &root).ok_or(LayoutError::EmptyGraph)?;
        let estimator = NodeSizeEstimator::new(graph, self.sizes);
        let pad = self.config.pad_angle_degrees.to_radians();

        let mut layout = RadialLayout {
            root: root.clone(),
            anchor,
            positions: HashMap::with_capacity(tree.len()),
            placements: HashMap::with_capacity(tree.len()),
            rings_used: HashMap::new(),
        };
        layout.positions.insert(root.clone(), anchor);
        layout.placements.insert(
            root.clone(),
            RadialPlacement {
                parent: None,
                depth: 0,
                angle: 0.0,
                radius: 0.0,
                sector: Sector::full(),
            },
        );

        let mut stack = vec![Frame {
            node: root.clone(),
            depth: 0,
            sector: Sector::full(),
            parent_radius: 0.0,
        }];

        while let Some(frame) = stack.pop() {
            let children = tree.children(&frame.node);
            if children.is_empty() {
                continue;
            }
            let m = children.len();
            let full_circle = frame.depth == 0;

            let usable = if full_circle {
                Sector::full()
            } else {
                let own_angle = layout
                    .placements
                    .get(&frame.node)
                    .map_or(frame.sector.mid(), |p| p.angle);
                self.usable_sector(frame.sector, own_angle, pad)
            };

            let start_radius = (frame.parent_radius + self.config.ring_step)
                .max(self.config.base_radius + self.config.ring_step * frame.depth as f64);

            let min_chord = children
                .iter()
                .map(|c| estimator.node_min_chord(c, self.config.min_chord_ratio))
                .fold(0.0, f64::max);

            let plan = if m == 1 {
                RingPlan::single(start_radius, 1)
            } else {
                self.plan_rings(m, start_radius, usable.width(), full_circle, min_chord)
            };
            let angles = child_angles(usable, m, full_circle);
            let sectors = child_sectors(usable, &angles, full_circle, pad);
            let radii = plan.per_child();

            debug!(
                node = %frame.node,
                children = m,
                rings = plan.radii.len(),
                first_radius = plan.radii[0],
                usable_deg = usable.width().to_degrees(),
                "radial ring plan"
            );
            layout.rings_used.insert(frame.node.clone(), plan.radii.len());

            for (i, child) in children.iter().enumerate() {
                let (angle, radius, sector) = (angles[i], radii[i], sectors[i]);
                layout
                    .positions
                    .insert(child.clone(), anchor.polar_offset(angle, radius));
                layout.placements.insert(
                    child.clone(),
                    RadialPlacement {
                        parent: Some(frame.node.clone()),
                        depth: frame.depth + 1,
                        angle,
                        radius,
                        sector,
                    },
                );
            }
            // Reverse so siblings are expanded in sibling order
            for (i, child) in children.iter().enumerate().rev() {
                stack.push(Frame {
                    node: child.clone(),
                    depth: frame.depth + 1,
                    sector: sectors[i],
                    parent_radius: radii[i],
                });
            }
        }

        info!(
            root = %layout.root,
            nodes = layout.node_count(),
            max_rings = layout.rings_used.values().copied().max().unwrap_or(0),
            "radial layout complete"
        );
        Ok(layout)
    }

    /// Padded part of `sector`, limited to a cone around the node's own angle.
    ///
    /// Never narrower than [`ANGLE_EPSILON`], so children always get distinct
    /// angles. The floor window stays inside `sector` when `sector` is wide
    /// enough to hold it.
    fn usable_sector(&self, sector: Sector, own_angle: f64, pad: f64) -> Sector {
        let (a0, a1) = (sector.start + pad, sector.end - pad);
        if a1 - a0 >= ANGLE_EPSILON {
            let cone = self.config.max_cone_degrees.to_radians().min(a1 - a0);
            let (s, e) = clamp_sector_to_cone(a0, a1, own_angle, cone);
            if e - s >= ANGLE_EPSILON {
                return Sector::new(s, e);
            }
        }
        let half = ANGLE_EPSILON / 2.0;
        let center = if sector.width() >= ANGLE_EPSILON {
            own_angle.max(sector.start + half).min(sector.end - half)
        } else {
            sector.mid()
        };
        Sector::new(center - half, center + half)
    }

    /// Decide ring radii for `m > 1` children sharing a sector of `width`.
    fn plan_rings(
        &self,
        m: usize,
        start_radius: f64,
        width: f64,
        full_circle: bool,
        min_chord: f64,
    ) -> RingPlan {
        let cfg = &self.config;
        let capacity = |r: f64| ring_capacity(width, full_circle, r, min_chord);
        let sliver = !full_circle && width < 2.0 * ANGLE_EPSILON;

        if capacity(start_radius) >= m {
            return RingPlan::single(start_radius, m);
        }

        let stretched = self.stretch(start_radius, m, &capacity);
        if capacity(stretched) >= m {
            return RingPlan::single(stretched, m);
        }

        // Spill: fill rings greedily, then dump the rest on the last one
        let max_rings = cfg.max_rings_per_level as usize;
        let mut radii = vec![start_radius];
        let mut counts = Vec::new();
        let mut placed = 0;
        while placed < m && radii.len() < max_rings {
            let r = radii[radii.len() - 1];
            // A sliver sector gets one child per ring
            let cap = match capacity(r) {
                c if c < 2 && m - placed > 1 && !sliver => 2,
                c => c.max(1),
            };
            let put = cap.min(m - placed);
            counts.push(put);
            placed += put;
            if placed < m {
                radii.push(r + cfg.ring_step);
            }
        }
        if placed < m {
            let rest = m - placed;
            let last = radii.len() - 1;
            radii[last] = self.stretch(radii[last], rest, &capacity);
            counts.push(rest);
        }

        RingPlan { radii, counts }
    }

    /// Push `radius` outward in `stretch_step` increments until `want` fit or the budget runs out.
    fn stretch(&self, radius: f64, want: usize, capacity: &impl Fn(f64) -> usize) -> f64 {
        let cfg = &self.config;
        let budget = cfg.max_stretch_distance();
        let mut extra = 0.0;
        let mut steps = 0;
        while capacity(radius + extra) < want && extra < budget && steps < MAX_STRETCH_ITERATIONS {
            extra += cfg.stretch_step;
            steps += 1;
        }
        radius + extra
    }
}

/// How many children fit on a ring of `radius` across `width` radians.
fn ring_capacity(width: f64, full_circle: bool, radius: f64, min_chord: f64) -> usize {
    let delta = chord_angle(radius, min_chord);
    if delta <= 0.0 {
        return usize::MAX;
    }
    if full_circle {
        (TAU / delta).floor() as usize
    } else {
        ((width / delta).floor() as usize).saturating_add(1)
    }
}

/// Evenly spaced child angles across `usable`.
fn child_angles(usable: Sector, m: usize, full_circle: bool) -> Vec<f64> {
    if m == 1 {
        return vec![usable.mid()];
    }
    if full_circle {
        let step = TAU / m as f64;
        return (0..m).map(|i| i as f64 * step).collect();
    }
    let step = usable.width() / (m - 1) as f64;
    (0..m).map(|i| usable.start + i as f64 * step).collect()
}

/// Sectors forwarded to each child, split at the midpoints between neighbors.
fn child_sectors(usable: Sector, angles: &[f64], full_circle: bool, pad: f64) -> Vec<Sector> {
    let m = angles.len();
    if m == 1 {
        return vec![usable];
    }
    if full_circle {
        let half = PI / m as f64 - pad / 2.0;
        return angles
            .iter()
            .map(|&a| {
                if half > 0.0 {
                    Sector::new(a - half, a + half)
                } else {
                    Sector::point(a)
                }
            })
            .collect();
    }

    let mids: Vec<f64> = angles.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    (0..m)
        .map(|i| {
            let start = if i == 0 { usable.start } else { mids[i - 1] + pad / 2.0 };
            let end = if i == m - 1 { usable.end } else { mids[i] - pad / 2.0 };
            if end < start {
                Sector::point(angles[i])
            } else {
                Sector::new(start, end)
            }
        })
        .collect()
}
