//! Contour tracing by boundary-edge assembly.
//!
//! Every filled cell contributes a unit edge for each side that borders an
//! empty cell or the raster boundary. Edges run clockwise around filled
//! regions (screen coordinates, y down):
//!
//! ```text
//!   (x,y) ----top----> (x+1,y)
//!     ^                   |
//!    left               right
//!     |                   v
//!   (x,y+1) <--bottom-- (x+1,y+1)
//! ```
//!
//! With that orientation the boundary of every connected region chains
//! head-to-tail, so rings fall out of following edges from corner to corner.
//! Regions that touch across a tile seam are one region in the stitched
//! mask and come out as one ring.
//!
//! A corner where two filled cells meet only diagonally has two outgoing
//! edges. The tracer takes the right turn there, which keeps it on the cell
//! it came from, so diagonal neighbours are separate regions. A walk that
//! still comes back through a corner is split there, and every ring visits
//! each corner at most once.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::mask::Mask;

/// A corner of the pixel grid, in raster-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// An oriented unit segment between two grid corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: GridPoint,
    pub to: GridPoint,
}

impl Edge {
    /// Unit step `(dx, dy)` from `from` to `to`.
    pub fn direction(&self) -> (i64, i64) {
        (
            self.to.x as i64 - self.from.x as i64,
            self.to.y as i64 - self.from.y as i64,
        )
    }
}

/// A closed loop of grid corners. The first point is not repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    pub points: Vec<GridPoint>,
}

impl Ring {
    pub fn new(points: Vec<GridPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed shoelace area in cell units. Outer boundaries are positive
    /// with the clockwise edge convention.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let mut acc = 0i64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            acc += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        acc as f64 / 2.0
    }
}

/// Emit the boundary edges of every filled cell in `mask`.
pub fn boundary_edges(mask: &Mask) -> Vec<Edge> {
    let mut edges = Vec::new();
    let edge = |fx, fy, tx, ty| Edge {
        from: GridPoint::new(fx, fy),
        to: GridPoint::new(tx, ty),
    };

    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let (xi, yi) = (x as i64, y as i64);
            if !mask.get(xi, yi) {
                continue;
            }
            let (x, y) = (x as u32, y as u32);
            if !mask.get(xi, yi - 1) {
                edges.push(edge(x, y, x + 1, y));
            }
            if !mask.get(xi + 1, yi) {
                edges.push(edge(x + 1, y, x + 1, y + 1));
            }
            if !mask.get(xi, yi + 1) {
                edges.push(edge(x + 1, y + 1, x, y + 1));
            }
            if !mask.get(xi - 1, yi) {
                edges.push(edge(x, y + 1, x, y));
            }
        }
    }
    edges
}

/// Trace all boundary rings of `mask`.
///
/// Rings are returned at full pixel-corner resolution; staircase removal and
/// simplification are separate steps. Chains that fail to close and rings
/// with fewer than three corners are dropped and logged.
pub fn trace(mask: &Mask) -> Vec<Ring> {
    let edges = boundary_edges(mask);
    if edges.is_empty() {
        return Vec::new();
    }

    let mut starts: HashMap<GridPoint, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, e) in edges.iter().enumerate() {
        starts.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    let mut broken = 0usize;
    let mut degenerate = 0usize;
    let mut pinched = 0usize;

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let start = edges[first].from;
        let mut points = vec![start];
        let mut at = edges[first].to;
        let mut heading = edges[first].direction();
        let mut closed = false;

        loop {
            if at == start {
                closed = true;
                break;
            }
            points.push(at);
            let next = starts.get(&at).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .filter(|&i| !used[i])
                    .min_by_key(|&i| turn_rank(heading, edges[i].direction()))
            });
            match next {
                Some(i) => {
                    used[i] = true;
                    at = edges[i].to;
                    heading = edges[i].direction();
                }
                None => break,
            }
        }

        if !closed {
            broken += 1;
            continue;
        }

        let loops = split_at_repeats(points);
        if loops.len() > 1 {
            pinched += 1;
        }
        for points in loops {
            if points.len() < 3 {
                degenerate += 1;
                continue;
            }
            rings.push(Ring::new(points));
        }
    }

    if broken > 0 || degenerate > 0 {
        warn!(broken, degenerate, "Dropped unusable contour chains");
    }
    debug!(edges = edges.len(), rings = rings.len(), pinched, "Contours traced");
    rings
}

/// Preference among outgoing edges at a corner: right turn, straight, left.
fn turn_rank(heading: (i64, i64), next: (i64, i64)) -> u8 {
    if next == (-heading.1, heading.0) {
        0
    } else if next == heading {
        1
    } else {
        2
    }
}

/// Split a closed walk into loops that each visit a corner once.
fn split_at_repeats(walk: Vec<GridPoint>) -> Vec<Vec<GridPoint>> {
    let mut loops = Vec::new();
    let mut stack: Vec<GridPoint> = Vec::with_capacity(walk.len());
    let mut position: HashMap<GridPoint, usize> = HashMap::with_capacity(walk.len());

    for p in walk {
        match position.get(&p) {
            Some(&k) => {
                let tail = stack.split_off(k + 1);
                for q in &tail {
                    position.remove(q);
                }
                let mut sub = Vec::with_capacity(tail.len() + 1);
                sub.push(p);
                sub.extend(tail);
                loops.push(sub);
            }
            None => {
                position.insert(p, stack.len());
                stack.push(p);
            }
        }
    }
    loops.push(stack);
    loops
}
