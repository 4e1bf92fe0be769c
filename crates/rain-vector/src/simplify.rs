//! Ring simplification.
//!
//! Traced rings carry one corner per pixel step. [`remove_collinear`] strips
//! points sitting in the middle of a straight horizontal or vertical run,
//! then [`douglas_peucker`] thins the remaining corners in degree space.

use radar_common::PixelProjector;

use crate::contour::{GridPoint, Ring};

/// Drop every point whose incoming and outgoing steps are both vertical or
/// both horizontal. Neighbours wrap around the ring. Rings with fewer than
/// four points are returned unchanged.
pub fn remove_collinear(points: &[GridPoint]) -> Vec<GridPoint> {
    let n = points.len();
    if n < 4 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];

        let dx1 = cur.x as i64 - prev.x as i64;
        let dy1 = cur.y as i64 - prev.y as i64;
        let dx2 = next.x as i64 - cur.x as i64;
        let dy2 = next.y as i64 - cur.y as i64;

        let vertical = dx1 == 0 && dx2 == 0;
        let horizontal = dy1 == 0 && dy2 == 0;
        if !(vertical || horizontal) {
            out.push(cur);
        }
    }
    out
}

/// [`remove_collinear`] repeated until nothing more is removed.
fn remove_collinear_fully(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut current = remove_collinear(points);
    loop {
        let next = remove_collinear(&current);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// Douglas-Peucker over an open polyline. Returns the indices of the points
/// kept, always including the first and last.
///
/// Distances are measured to the chord segment (clamped at its endpoints).
/// The first point of maximum deviation splits the chain.
pub fn douglas_peucker(points: &[(f64, f64)], tolerance: f64) -> Vec<usize> {
    if points.len() < 3 {
        return (0..points.len()).collect();
    }
    let mut kept = Vec::new();
    dp_range(points, 0, points.len() - 1, tolerance, &mut kept);
    kept.push(points.len() - 1);
    kept
}

/// Push the kept indices of `first..=last`, excluding `last`.
fn dp_range(points: &[(f64, f64)], first: usize, last: usize, tolerance: f64, kept: &mut Vec<usize>) {
    let mut dmax = 0.0;
    let mut index = first;
    for i in first + 1..last {
        let d = segment_distance(points[i], points[first], points[last]);
        if d > dmax {
            dmax = d;
            index = i;
        }
    }

    if dmax > tolerance {
        dp_range(points, first, index, tolerance, kept);
        dp_range(points, index, last, tolerance, kept);
    } else {
        kept.push(first);
    }
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Full simplification of a traced ring.
///
/// Staircase removal and Douglas-Peucker (in lon/lat degrees) alternate
/// until neither changes the ring. If Douglas-Peucker would leave fewer than
/// three points, the staircase-free ring is kept. Applying this to its own
/// output returns the same ring.
pub fn simplify(ring: &Ring, tolerance_deg: f64, projector: &PixelProjector) -> Ring {
    let mut current = ring.points.clone();
    loop {
        let orthogonal = remove_collinear_fully(&current);
        if orthogonal.len() < 3 {
            return Ring::new(orthogonal);
        }

        let degrees: Vec<(f64, f64)> = orthogonal
            .iter()
            .map(|p| projector.to_lon_lat(p.x as f64, p.y as f64))
            .collect();
        let kept = douglas_peucker(&degrees, tolerance_deg);

        if kept.len() < 3 || kept.len() == orthogonal.len() {
            return Ring::new(orthogonal);
        }
        current = kept.into_iter().map(|i| orthogonal[i]).collect();
    }
}

/// Simplification settings applied to every ring of one extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplifier {
    pub tolerance_deg: f64,
    /// When false only staircase removal runs.
    pub douglas_peucker: bool,
}

impl Simplifier {
    pub fn new(tolerance_deg: f64, douglas_peucker: bool) -> Self {
        Self {
            tolerance_deg,
            douglas_peucker,
        }
    }

    /// Simplify one ring; `None` when fewer than three points survive.
    pub fn apply(&self, ring: &Ring, projector: &PixelProjector) -> Option<Ring> {
        let out = if self.douglas_peucker {
            simplify(ring, self.tolerance_deg, projector)
        } else {
            Ring::new(remove_collinear_fully(&ring.points))
        };
        (out.len() >= 3).then_some(out)
    }
}
