//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude, used for margin conversion.
const KM_PER_DEGREE: f64 = 111.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A geographic bounding box in degrees.
///
/// Callers may hand corners over in either order; [`BoundingBox::new`] swaps
/// them so that `north >= south` and `east >= west`. Anything that computes
/// tile indices must go through [`BoundingBox::normalized`] first, since the
/// fields are public and can be assigned directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Create a normalized bounding box from its four edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
        .normalized()
    }

    /// Create a bounding box from a top-left and bottom-right corner.
    pub fn from_corners(top_lat: f64, left_lon: f64, bottom_lat: f64, right_lon: f64) -> Self {
        Self::new(top_lat, bottom_lat, right_lon, left_lon)
    }

    /// Parse a `west,south,east,north` string (the usual BBOX ordering).
    pub fn from_bbox_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |v: &str| -> Result<f64, BboxParseError> {
            v.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| BboxParseError::InvalidNumber(v.to_string()))
        };

        let west = parse(parts[0])?;
        let south = parse(parts[1])?;
        let east = parse(parts[2])?;
        let north = parse(parts[3])?;

        Ok(Self::new(north, south, east, west))
    }

    /// Copy of this box with swapped edges put back in order.
    pub fn normalized(&self) -> Self {
        let (north, south) = if self.south > self.north {
            (self.south, self.north)
        } else {
            (self.north, self.south)
        };
        let (east, west) = if self.west > self.east {
            (self.west, self.east)
        } else {
            (self.east, self.west)
        };
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.north >= self.south && self.east >= self.west
    }

    /// East-west extent in degrees.
    pub fn lon_span(&self) -> f64 {
        (self.east - self.west).abs()
    }

    /// North-south extent in degrees.
    pub fn lat_span(&self) -> f64 {
        (self.north - self.south).abs()
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        let b = self.normalized();
        lat >= b.south && lat <= b.north && lon >= b.west && lon <= b.east
    }

    /// Grow the box by `margin_km` on every side.
    ///
    /// The longitude margin is widened by `1/cos(center latitude)` so the
    /// margin stays roughly the same ground distance away from the equator.
    pub fn expand_km(&self, margin_km: f64) -> Self {
        let b = self.normalized();
        let lat_center = (b.north + b.south) / 2.0;
        let lat_offset = margin_km / KM_PER_DEGREE;
        let lon_offset = margin_km / (KM_PER_DEGREE * lat_center.to_radians().cos());

        Self {
            north: b.north + lat_offset,
            south: b.south - lat_offset,
            east: b.east + lon_offset,
            west: b.west - lon_offset,
        }
    }

    /// Box spanned by a route's two endpoints, expanded by `margin_km`.
    pub fn around_route(start: GeoPoint, end: GeoPoint, margin_km: f64) -> Self {
        Self::new(start.lat, end.lat, start.lon, end.lon).expand_km(margin_km)
    }

    /// Box enclosing every point of a polyline, expanded by `margin_km`.
    ///
    /// Returns `None` for an empty point list.
    pub fn enclosing(points: &[GeoPoint], margin_km: f64) -> Option<Self> {
        let first = points.first()?;
        let mut b = Self {
            north: first.lat,
            south: first.lat,
            east: first.lon,
            west: first.lon,
        };
        for p in &points[1..] {
            b.north = b.north.max(p.lat);
            b.south = b.south.min(p.lat);
            b.east = b.east.max(p.lon);
            b.west = b.west.min(p.lon);
        }
        Some(b.expand_km(margin_km))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'west,south,east,north'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_swaps_inverted_corners() {
        let bbox = BoundingBox::new(48.6, 48.9, 2.1, 2.55);
        assert_eq!(bbox.north, 48.9);
        assert_eq!(bbox.south, 48.6);
        assert_eq!(bbox.east, 2.55);
        assert_eq!(bbox.west, 2.1);
        assert!(bbox.is_normalized());
    }

    #[test]
    fn test_parse_bbox_string() {
        let bbox = BoundingBox::from_bbox_string("2.1,48.6,2.55,48.9").unwrap();
        assert_eq!(bbox.west, 2.1);
        assert_eq!(bbox.south, 48.6);
        assert_eq!(bbox.east, 2.55);
        assert_eq!(bbox.north, 48.9);
    }

    #[test]
    fn test_expand_km_at_equator() {
        let bbox = BoundingBox::new(1.0, -1.0, 1.0, -1.0).expand_km(111.0);
        assert!((bbox.north - 2.0).abs() < 1e-9);
        assert!((bbox.south + 2.0).abs() < 1e-9);
        assert!((bbox.east - 2.0).abs() < 1e-9);
        assert!((bbox.west + 2.0).abs() < 1e-9);
    }
}
