//! Shared 2D geometry helpers.
//!
//! Angles are radians measured with `atan2` in scene coordinates. Every helper
//! that feeds a trigonometric call floors its input with a small epsilon so
//! coincident points and zero-width arcs never divide by zero or leave the
//! domain of `asin`.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Smallest arc width handed to trigonometry.
pub const ANGLE_EPSILON: f64 = 1e-3;

/// Tolerance for angular membership tests.
const MEMBERSHIP_TOLERANCE: f64 = 1e-9;

/// A point in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point at `radius` along `angle` from `self`.
    #[inline]
    pub fn polar_offset(self, angle: f64, radius: f64) -> Point2D {
        Point2D::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
    }

    /// Quantize to the nearest multiple of `step`.
    pub fn snapped(self, step: f64) -> Point2D {
        if step <= 0.0 {
            return self;
        }
        Point2D::new((self.x / step).round() * step, (self.y / step).round() * step)
    }
}

/// Normalize an angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(a: f64) -> f64 {
    let r = a.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU { 0.0 } else { r }
}

/// Direction from `from` to `to`, normalized into `[0, 2π)`.
#[inline]
pub fn angle_between(from: Point2D, to: Point2D) -> f64 {
    normalize_angle((to.y - from.y).atan2(to.x - from.x))
}

/// Smallest absolute angular distance between two directions, in `[0, π]`.
#[inline]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    d.min(TAU - d)
}

/// Radius at which a chord of length `min_chord` spans an arc of `width` radians.
///
/// `r = (chord / 2) / sin(width / 2)`, with `width` floored at [`ANGLE_EPSILON`].
/// Returns infinity when the sine collapses.
pub fn min_radius_for_chord(width: f64, min_chord: f64) -> f64 {
    let s = (width.max(ANGLE_EPSILON) / 2.0).sin();
    if s <= 1e-6 {
        return f64::INFINITY;
    }
    (min_chord / 2.0) / s
}

/// Angular pitch two nodes need at `radius` to keep `min_chord` between them.
pub fn chord_angle(radius: f64, min_chord: f64) -> f64 {
    let x = (min_chord / (2.0 * radius).max(1e-6)).clamp(0.0, 0.999_999);
    2.0 * x.asin()
}

/// Clamp the linear sector `[a0, a1]` to a cone of `cone_width` centered on `center`.
///
/// When the intersection is empty, returns a slice centered on the sector
/// midpoint with half-extent `min(cone_width, a1 - a0) / 4`.
pub fn clamp_sector_to_cone(a0: f64, a1: f64, center: f64, cone_width: f64) -> (f64, f64) {
    let half = cone_width / 2.0;
    let s = a0.max(center - half);
    let e = a1.min(center + half);
    if e > s {
        return (s, e);
    }
    let mid = (a0 + a1) / 2.0;
    let q = cone_width.min((a1 - a0).max(0.0)) * 0.25;
    (mid - q, mid + q)
}

/// A circular arc starting at `start` and sweeping `width` radians counterclockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub start: f64,
    pub width: f64,
}

impl Arc {
    pub fn new(start: f64, width: f64) -> Self {
        Self {
            start: normalize_angle(start),
            width: width.clamp(0.0, TAU),
        }
    }

    /// Arc of `width` centered on `center`.
    pub fn centered(center: f64, width: f64) -> Self {
        Self::new(center - width / 2.0, width)
    }

    pub fn center(&self) -> f64 {
        normalize_angle(self.start + self.width / 2.0)
    }

    pub fn contains(&self, angle: f64) -> bool {
        if self.width >= TAU - ANGLE_EPSILON {
            return true;
        }
        normalize_angle(angle - self.start) <= self.width + MEMBERSHIP_TOLERANCE
    }

    /// Intersect with a cone of `cone_width` centered on `center`.
    ///
    /// The wider of the (at most two) overlapping pieces is kept. If nothing
    /// usable remains, falls back to a quarter-width slice around this arc's
    /// midpoint.
    pub fn clamp_to_cone(&self, center: f64, cone_width: f64) -> Arc {
        if cone_width >= TAU {
            return *self;
        }
        let cone_start = normalize_angle(center - cone_width / 2.0);
        let d = normalize_angle(cone_start - self.start);
        let overlap = |lo: f64, hi: f64| (lo.max(0.0), hi.min(self.width));
        let (lo1, hi1) = overlap(d, d + cone_width);
        let (lo2, hi2) = overlap(d - TAU, d - TAU + cone_width);
        let (lo, hi) = if hi2 - lo2 > hi1 - lo1 { (lo2, hi2) } else { (lo1, hi1) };
        if hi - lo > ANGLE_EPSILON {
            Arc::new(self.start + lo, hi - lo)
        } else {
            let q = cone_width.min(self.width) * 0.25;
            Arc::new(self.center() - q, 2.0 * q)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < EPS);
        assert!((normalize_angle(TAU + 0.5) - 0.5).abs() < EPS);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!(normalize_angle(-1e-18) < TAU);
    }

    #[test]
    fn test_angle_between_coincident_points() {
        let p = Point2D::new(3.0, 4.0);
        assert_eq!(angle_between(p, p), 0.0);
    }

    #[test]
    fn test_snapped_rounds_to_step() {
        let p = Point2D::new(59.0, -61.0).snapped(40.0);
        assert_eq!(p, Point2D::new(40.0, -80.0));
        assert_eq!(Point2D::new(7.0, 9.0).snapped(0.0), Point2D::new(7.0, 9.0));
    }

    #[test]
    fn test_min_radius_for_chord() {
        // A half circle needs radius chord/2
        let r = min_radius_for_chord(PI, 100.0);
        assert!((r - 50.0).abs() < 1e-6);
        // Zero width is floored, not a division by zero
        assert!(min_radius_for_chord(0.0, 100.0).is_finite());
    }

    #[test]
    fn test_chord_angle_inverts_min_radius() {
        let width = 0.7;
        let r = min_radius_for_chord(width, 120.0);
        assert!((chord_angle(r, 120.0) - width).abs() < 1e-6);
        // Chord wider than the diameter saturates below π
        assert!(chord_angle(10.0, 1000.0) < PI);
    }

    #[test]
    fn test_clamp_sector_to_cone() {
        let (s, e) = clamp_sector_to_cone(0.0, PI, FRAC_PI_2, FRAC_PI_2);
        assert!((s - FRAC_PI_2 / 2.0).abs() < EPS);
        assert!((e - 3.0 * FRAC_PI_2 / 2.0).abs() < EPS);

        // Cone outside the sector collapses to a slice around the midpoint
        let (s, e) = clamp_sector_to_cone(0.0, 1.0, 3.0, 0.4);
        assert!(s >= 0.0 && e <= 1.0 && s < e);
        assert!(((s + e) / 2.0 - 0.5).abs() < EPS);
    }

    #[test]
    fn test_arc_contains_wraparound() {
        let arc = Arc::new(-0.5, 1.0);
        assert!(arc.contains(0.0));
        assert!(arc.contains(TAU - 0.4));
        assert!(!arc.contains(PI));
    }

    #[test]
    fn test_arc_clamp_to_cone_wraps() {
        // Gap from 300° to 60°, cone centered on 0° of width 60°
        let gap = Arc::new(300f64.to_radians(), 120f64.to_radians());
        let clamped = gap.clamp_to_cone(0.0, 60f64.to_radians());
        assert!((clamped.width - 60f64.to_radians()).abs() < 1e-9);
        assert!(angular_distance(clamped.center(), 0.0) < 1e-9);
    }

    #[test]
    fn test_arc_clamp_to_cone_degenerate_falls_back() {
        let gap = Arc::new(0.0, 0.4);
        let clamped = gap.clamp_to_cone(PI, 0.2);
        assert!((clamped.width - 0.1).abs() < 1e-9);
        assert!(angular_distance(clamped.center(), 0.2) < 1e-9);
    }
}
