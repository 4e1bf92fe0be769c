//! Engine configuration with environment overrides.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tile::TILE_SIZE;

pub const DEFAULT_CATALOG_URL: &str = "https://api.rainviewer.com/public/weather-maps.json";

/// Tunables for catalog access, tile download, grid planning and simplification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Catalog document listing the available frames
    pub catalog_url: String,
    /// Tile edge length requested from the tile host
    pub tile_size: u32,
    /// Provider colour scheme id (2 = "Universal Blue")
    pub color_scheme: u32,
    pub smooth: u32,
    pub snow: u32,
    /// Tile image extension
    pub extension: String,
    /// Upper bound on tiles fetched per extraction
    pub max_tiles: u64,
    /// Starting (finest) zoom for the grid planner
    pub max_zoom: u32,
    /// Coarsest zoom the planner will fall back to
    pub min_zoom: u32,
    /// Widest east-west span, in tiles, accepted at the starting zoom
    pub max_tiles_across: f64,
    /// Zoom used by single-point rain queries
    pub sample_zoom: u32,
    pub tile_timeout: Duration,
    pub catalog_timeout: Duration,
    /// Concurrent tile downloads per extraction
    pub tile_concurrency: usize,
    /// Douglas-Peucker tolerance in degrees
    pub simplify_tolerance_deg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            tile_size: TILE_SIZE,
            color_scheme: 2,
            smooth: 1,
            snow: 1,
            extension: "png".to_string(),
            max_tiles: 180,
            max_zoom: 9,
            min_zoom: 3,
            max_tiles_across: 12.0,
            sample_zoom: 9,
            tile_timeout: Duration::from_secs(5),
            catalog_timeout: Duration::from_secs(10),
            tile_concurrency: 8,
            simplify_tolerance_deg: 0.05,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `RADAR_*` environment variables.
    ///
    /// Unset or unparsable variables keep the default value.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            catalog_url: lookup("RADAR_CATALOG_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.catalog_url),
            tile_size: parse_var(&lookup, "RADAR_TILE_SIZE").unwrap_or(defaults.tile_size),
            color_scheme: parse_var(&lookup, "RADAR_COLOR_SCHEME").unwrap_or(defaults.color_scheme),
            smooth: parse_var(&lookup, "RADAR_SMOOTH").unwrap_or(defaults.smooth),
            snow: parse_var(&lookup, "RADAR_SNOW").unwrap_or(defaults.snow),
            extension: lookup("RADAR_TILE_EXT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.extension),
            max_tiles: parse_var(&lookup, "RADAR_MAX_TILES")
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.max_tiles),
            tile_timeout: parse_var(&lookup, "RADAR_TILE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.tile_timeout),
            catalog_timeout: parse_var(&lookup, "RADAR_CATALOG_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.catalog_timeout),
            tile_concurrency: parse_var(&lookup, "RADAR_TILE_CONCURRENCY")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.tile_concurrency),
            simplify_tolerance_deg: parse_var(&lookup, "RADAR_SIMPLIFY_TOLERANCE")
                .filter(|t: &f64| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.simplify_tolerance_deg),
            ..defaults
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("RADAR_MAX_TILES", "64"),
            ("RADAR_TILE_TIMEOUT_SECS", "2"),
            ("RADAR_SIMPLIFY_TOLERANCE", "0.01"),
            ("RADAR_CATALOG_URL", "http://localhost:9000/maps.json"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.max_tiles, 64);
        assert_eq!(config.tile_timeout, Duration::from_secs(2));
        assert_eq!(config.simplify_tolerance_deg, 0.01);
        assert_eq!(config.catalog_url, "http://localhost:9000/maps.json");
        assert_eq!(config.tile_size, 256);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = EngineConfig::from_lookup(|k| match k {
            "RADAR_MAX_TILES" => Some("lots".into()),
            "RADAR_TILE_CONCURRENCY" => Some("0".into()),
            "RADAR_SIMPLIFY_TOLERANCE" => Some("-1".into()),
            _ => None,
        });
        assert_eq!(config, EngineConfig::default());
    }
}
