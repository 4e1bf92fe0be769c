//! Slippy-map (XYZ) tile addressing.
//!
//! Tiles follow the standard Web Mercator scheme: `2^z` columns and rows at
//! zoom `z`, origin at the top-left (north-west) corner.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Edge length of a radar tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude where the Web Mercator square ends.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    /// Zoom level
    pub zoom: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileAddress {
    pub fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// `z/x/y` path fragment.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x, self.y)
    }

    /// Whether x and y lie inside the `2^zoom` grid.
    pub fn is_valid(&self) -> bool {
        let n = tiles_per_axis(self.zoom);
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Tile containing a lat/lon position, or `None` when the position is off
    /// the map (latitudes beyond the Mercator limit included).
    pub fn containing(lat: f64, lon: f64, zoom: u32) -> Option<Self> {
        let (fx, fy) = lat_lon_to_tile_fraction(lat, lon, zoom)?;
        let n = tiles_per_axis(zoom) as f64;
        if fx < 0.0 || fy < 0.0 || fx >= n || fy >= n {
            return None;
        }
        Some(Self::new(zoom, fx.floor() as u32, fy.floor() as u32))
    }
}

/// An inclusive rectangle of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub zoom: u32,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    pub fn columns(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn rows(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    /// Number of tiles covered by the range.
    pub fn tile_count(&self) -> u64 {
        self.columns() as u64 * self.rows() as u64
    }

    /// Tiles in row-major order (north to south, west to east).
    pub fn tiles(&self) -> impl Iterator<Item = TileAddress> + '_ {
        (self.y_min..=self.y_max)
            .flat_map(move |y| (self.x_min..=self.x_max).map(move |x| TileAddress::new(self.zoom, x, y)))
    }

    /// Pixel offset of a tile inside the stitched raster for this range.
    pub fn pixel_offset(&self, tile: &TileAddress, tile_size: u32) -> (usize, usize) {
        (
            (tile.x - self.x_min) as usize * tile_size as usize,
            (tile.y - self.y_min) as usize * tile_size as usize,
        )
    }

    pub fn contains(&self, tile: &TileAddress) -> bool {
        tile.zoom == self.zoom
            && (self.x_min..=self.x_max).contains(&tile.x)
            && (self.y_min..=self.y_max).contains(&tile.y)
    }
}

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u32) -> u64 {
    1u64 << zoom
}

/// Column index of the tile containing `lon`, clamped into the grid.
pub fn lon_to_tile_x(lon: f64, zoom: u32) -> u32 {
    let n = tiles_per_axis(zoom) as f64;
    let x = ((lon + 180.0) / 360.0 * n).floor();
    clamp_index(x, zoom)
}

/// Row index of the tile containing `lat`, clamped into the grid.
///
/// Uses `y = floor((1 - ln(tan φ + sec φ) / π) / 2 · 2^z)`; latitudes past the
/// Mercator limit map to the first and last rows.
pub fn lat_to_tile_y(lat: f64, zoom: u32) -> u32 {
    let n = tiles_per_axis(zoom) as f64;
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    clamp_index(y, zoom)
}

/// Fractional tile position of a lat/lon pair, or `None` when the input is
/// out of the valid coordinate range.
pub fn lat_lon_to_tile_fraction(lat: f64, lon: f64, zoom: u32) -> Option<(f64, f64)> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    let n = tiles_per_axis(zoom) as f64;
    let lat_rad = lat.to_radians();
    let fx = (lon + 180.0) / 360.0 * n;
    let fy = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    if !fx.is_finite() || !fy.is_finite() {
        return None;
    }
    Some((fx, fy))
}

fn clamp_index(v: f64, zoom: u32) -> u32 {
    let max = (tiles_per_axis(zoom) - 1) as f64;
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, max) as u32
}
