//! Tile URL construction.

use radar_common::{EngineConfig, Frame, TileAddress};
use serde::{Deserialize, Serialize};

/// Rendering options the tile host encodes in the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRenderParams {
    pub tile_size: u32,
    pub color_scheme: u32,
    pub smooth: u32,
    pub snow: u32,
    pub extension: String,
}

impl Default for TileRenderParams {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for TileRenderParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tile_size: config.tile_size,
            color_scheme: config.color_scheme,
            smooth: config.smooth,
            snow: config.snow,
            extension: config.extension.clone(),
        }
    }
}

impl TileRenderParams {
    /// Copy with any supplied override applied.
    pub fn with_overrides(&self, overrides: &TileRenderOverrides) -> Self {
        Self {
            tile_size: overrides.tile_size.unwrap_or(self.tile_size),
            color_scheme: overrides.color_scheme.unwrap_or(self.color_scheme),
            smooth: overrides.smooth.unwrap_or(self.smooth),
            snow: overrides.snow.unwrap_or(self.snow),
            extension: self.extension.clone(),
        }
    }
}

/// Optional per-request render parameters (e.g. from a tile endpoint's query string).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRenderOverrides {
    pub tile_size: Option<u32>,
    pub color_scheme: Option<u32>,
    pub smooth: Option<u32>,
    pub snow: Option<u32>,
}

/// `{host}{path}/{size}/{z}/{x}/{y}/{scheme}/{smooth}_{snow}.{ext}`
pub fn tile_url(host: &str, frame: &Frame, tile: &TileAddress, params: &TileRenderParams) -> String {
    format!(
        "{}{}/{}/{}/{}/{}/{}/{}_{}.{}",
        host,
        frame.path,
        params.tile_size,
        tile.zoom,
        tile.x,
        tile.y,
        params.color_scheme,
        params.smooth,
        params.snow,
        params.extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_layout() {
        let frame = Frame::new(1_700_000_000, "/v2/radar/1700000000");
        let url = tile_url(
            "https://tilecache.rainviewer.com",
            &frame,
            &TileAddress::new(6, 33, 22),
            &TileRenderParams::default(),
        );
        assert_eq!(
            url,
            "https://tilecache.rainviewer.com/v2/radar/1700000000/256/6/33/22/2/1_1.png"
        );
    }

    #[test]
    fn test_overrides_merge() {
        let params = TileRenderParams::default().with_overrides(&TileRenderOverrides {
            tile_size: Some(512),
            snow: Some(0),
            ..Default::default()
        });
        assert_eq!(params.tile_size, 512);
        assert_eq!(params.color_scheme, 2);
        assert_eq!(params.smooth, 1);
        assert_eq!(params.snow, 0);
    }
}
