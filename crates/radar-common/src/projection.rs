//! Inverse Web Mercator: global pixel coordinates back to longitude/latitude.

use std::f64::consts::PI;

use crate::tile::{TileRange, TILE_SIZE};

/// Convert a global pixel position at `zoom` to `(lon, lat)` in degrees.
///
/// Pixel coordinates are in the global pixel space of the zoom level
/// (`tile index * tile_size + in-tile offset`), never tile-local.
pub fn pixel_to_lon_lat(pixel_x: f64, pixel_y: f64, zoom: u32, tile_size: u32) -> (f64, f64) {
    let map_size = tile_size as f64 * (1u64 << zoom) as f64;
    let lon = pixel_x / map_size * 360.0 - 180.0;
    let lat = (PI - 2.0 * PI * pixel_y / map_size).sinh().atan().to_degrees();
    (lon, lat)
}

/// Projects corner points of a stitched raster back to geographic space.
///
/// The raster's pixel (0, 0) is the top-left pixel of the range's first tile,
/// so local coordinates are shifted by that tile's global pixel origin before
/// the inverse projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelProjector {
    pub zoom: u32,
    pub tile_size: u32,
    origin_x: f64,
    origin_y: f64,
}

impl PixelProjector {
    pub fn new(zoom: u32, tile_size: u32, tile_x_min: u32, tile_y_min: u32) -> Self {
        Self {
            zoom,
            tile_size,
            origin_x: tile_x_min as f64 * tile_size as f64,
            origin_y: tile_y_min as f64 * tile_size as f64,
        }
    }

    /// Projector for the raster stitched from `range` at the default tile size.
    pub fn for_range(range: &TileRange) -> Self {
        Self::new(range.zoom, TILE_SIZE, range.x_min, range.y_min)
    }

    /// Raster-local position to `(lon, lat)`.
    pub fn to_lon_lat(&self, local_x: f64, local_y: f64) -> (f64, f64) {
        pixel_to_lon_lat(
            self.origin_x + local_x,
            self.origin_y + local_y,
            self.zoom,
            self.tile_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_corners() {
        let (lon, lat) = pixel_to_lon_lat(0.0, 0.0, 0, 256);
        assert!((lon + 180.0).abs() < 1e-9);
        assert!((lat - 85.0511287798).abs() < 1e-6);

        let (lon, lat) = pixel_to_lon_lat(128.0, 128.0, 0, 256);
        assert!(lon.abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_projector_applies_tile_origin() {
        let projector = PixelProjector::new(9, 256, 259, 176);
        let direct = pixel_to_lon_lat(259.0 * 256.0 + 10.0, 176.0 * 256.0 + 20.0, 9, 256);
        assert_eq!(projector.to_lon_lat(10.0, 20.0), direct);
    }
}
