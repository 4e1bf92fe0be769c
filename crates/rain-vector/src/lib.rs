//! Raster-to-vector conversion for radar precipitation masks.
//!
//! - [`mask`]: stitches per-tile alpha channels into one boolean raster
//! - [`contour`]: boundary-edge assembly of the raster into closed rings
//! - [`simplify`]: staircase removal and Douglas-Peucker simplification

pub mod contour;
pub mod mask;
pub mod simplify;

pub use contour::{boundary_edges, trace, Edge, GridPoint, Ring};
pub use mask::Mask;
pub use simplify::{douglas_peucker, remove_collinear, simplify, Simplifier};
