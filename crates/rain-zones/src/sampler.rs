//! Single-point rain queries.
//!
//! Fetches only the tile containing the point at the sampling zoom and reads
//! one alpha value. No mask or contour work.

use radar_common::tile::{lat_lon_to_tile_fraction, tiles_per_axis};
use radar_common::{Catalog, Frame, FrameSelection, RadarResult, TileAddress};
use radar_source::tile_url;
use tracing::{debug, instrument};

use crate::engine::RainZoneEngine;
use crate::selector::select;

impl RainZoneEngine {
    /// Rain at a point in the oldest past frame.
    pub async fn is_raining_at(&self, lat: f64, lon: f64) -> RadarResult<bool> {
        self.is_raining(lat, lon, &FrameSelection::OldestPast).await
    }

    /// Rain at a point in the frame `selection` picks.
    ///
    /// Out-of-range coordinates, an unmatched selection, a missing tile and
    /// a transparent pixel all read as `false`. Catalog failures are errors.
    #[instrument(skip(self), fields(mode = %selection.mode()))]
    pub async fn is_raining(&self, lat: f64, lon: f64, selection: &FrameSelection) -> RadarResult<bool> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Ok(false);
        }

        let catalog = self.catalog.fetch().await?;
        let Some(frame) = select(&catalog, selection, self.now()) else {
            return Ok(false);
        };
        Ok(self.sample_frame(&catalog, frame, lat, lon).await)
    }

    async fn sample_frame(&self, catalog: &Catalog, frame: &Frame, lat: f64, lon: f64) -> bool {
        let zoom = self.config.sample_zoom;
        let Some((fx, fy)) = lat_lon_to_tile_fraction(lat, lon, zoom) else {
            return false;
        };
        let n = tiles_per_axis(zoom) as f64;
        let (tx, ty) = (fx.floor(), fy.floor());
        if tx < 0.0 || ty < 0.0 || tx >= n || ty >= n {
            return false;
        }

        let tile = TileAddress::new(zoom, tx as u32, ty as u32);
        let url = tile_url(&catalog.tile_host, frame, &tile, &self.render);
        let Some(alpha) = self.fetcher.fetch_tile(&url).await else {
            return false;
        };

        let value = alpha.sample(fx - tx, fy - ty);
        debug!(tile = %tile.path(), alpha = value, "Point sampled");
        value > 0
    }
}
