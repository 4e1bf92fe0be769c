//! Extraction requests and results.

use std::time::Duration;

use radar_common::{BoundingBox, FrameSelection, PixelProjector, TimeMode};
use rain_vector::Ring;
use serde::{Deserialize, Serialize};

/// A rain area outline as `(lon, lat)` pairs. The ring is not closed: the
/// first point is not repeated at the end.
///
/// Serializes as `[[lon, lat], ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub points: Vec<[f64; 2]>,
}

impl Polygon {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Project a raster ring to geographic coordinates.
    pub fn from_ring(ring: &Ring, projector: &PixelProjector) -> Self {
        let points = ring
            .points
            .iter()
            .map(|p| {
                let (lon, lat) = projector.to_lon_lat(p.x as f64, p.y as f64);
                [lon, lat]
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Same points as `[lat, lon]`, for consumers that expect that order.
    pub fn to_lat_lon(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|&[lon, lat]| [lat, lon]).collect()
    }

    /// Geographic extent of the outline, if it has any points.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let [lon0, lat0] = *self.points.first()?;
        let mut b = BoundingBox {
            north: lat0,
            south: lat0,
            east: lon0,
            west: lon0,
        };
        for &[lon, lat] in &self.points[1..] {
            b.north = b.north.max(lat);
            b.south = b.south.min(lat);
            b.east = b.east.max(lon);
            b.west = b.west.min(lon);
        }
        Some(b)
    }
}

/// One polygon extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub selection: FrameSelection,
    /// Apply Douglas-Peucker on top of staircase removal
    #[serde(default)]
    pub simplify: bool,
    /// Bound on the whole call, catalog fetch included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
}

impl ExtractionRequest {
    pub fn new(bbox: BoundingBox, selection: FrameSelection) -> Self {
        Self {
            bbox,
            selection,
            simplify: false,
            deadline: None,
        }
    }

    pub fn simplified(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Polygons extracted from one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub polygons: Vec<Polygon>,
    /// UNIX seconds of the frame used; 0 for an empty route
    pub frame_timestamp: i64,
    pub selection_policy: TimeMode,
}

impl ExtractionResult {
    /// Result of a query that never reached a frame (an empty route).
    pub fn empty(selection_policy: TimeMode) -> Self {
        Self {
            polygons: Vec::new(),
            frame_timestamp: 0,
            selection_policy,
        }
    }

    pub fn is_dry(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().map(Polygon::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_serializes_as_nested_arrays() {
        let polygon = Polygon::new(vec![[2.1, 48.6], [2.5, 48.6], [2.5, 48.9]]);
        let json = serde_json::to_string(&polygon).unwrap();
        assert_eq!(json, "[[2.1,48.6],[2.5,48.6],[2.5,48.9]]");
    }

    #[test]
    fn test_to_lat_lon_swaps() {
        let polygon = Polygon::new(vec![[2.0, 48.0], [3.0, 49.0]]);
        assert_eq!(polygon.to_lat_lon(), vec![[48.0, 2.0], [49.0, 3.0]]);
    }

    #[test]
    fn test_bounds() {
        let polygon = Polygon::new(vec![[2.0, 48.0], [3.0, 49.0], [2.5, 47.5]]);
        let b = polygon.bounds().unwrap();
        assert_eq!((b.north, b.south, b.east, b.west), (49.0, 47.5, 3.0, 2.0));
        assert!(Polygon::new(vec![]).bounds().is_none());
    }

    #[test]
    fn test_result_json_contract() {
        let result = ExtractionResult {
            polygons: vec![Polygon::new(vec![[1.0, 2.0]])],
            frame_timestamp: 1_700_000_000,
            selection_policy: TimeMode::LatestPast,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["frame_timestamp"], 1_700_000_000);
        assert_eq!(value["selection_policy"], "LATEST_PAST");
        assert_eq!(value["polygons"][0][0][1], 2.0);
    }
}
