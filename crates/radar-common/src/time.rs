//! Radar frames, the frame catalog, and time-selection policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One radar snapshot: a past observation or a nowcast frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// UNIX seconds
    pub timestamp: i64,
    /// Path fragment inserted after the tile host, e.g. `/v2/radar/1700000000`
    pub path: String,
}

impl Frame {
    pub fn new(timestamp: i64, path: impl Into<String>) -> Self {
        Self {
            timestamp,
            path: path.into(),
        }
    }
}

/// The set of frames currently offered by the radar provider.
///
/// Fetched fresh for every request; there is no caching across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub tile_host: String,
    /// Oldest to newest
    pub past_frames: Vec<Frame>,
    /// Soonest to furthest
    pub forecast_frames: Vec<Frame>,
    /// Provider generation time (UNIX seconds), when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<i64>,
}

impl Catalog {
    pub fn oldest_past(&self) -> Option<&Frame> {
        self.past_frames.first()
    }

    pub fn latest_past(&self) -> Option<&Frame> {
        self.past_frames.last()
    }

    pub fn first_forecast(&self) -> Option<&Frame> {
        self.forecast_frames.first()
    }

    /// Past frames then forecast frames, in ascending time order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.past_frames.iter().chain(self.forecast_frames.iter())
    }

    /// Earliest and latest timestamp across both lists.
    pub fn timestamp_range(&self) -> Option<(i64, i64)> {
        let mut iter = self.frames().map(|f| f.timestamp);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

/// Time-selection policy tag reported alongside extraction results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeMode {
    OldestPast,
    LatestPast,
    NearestToNow,
    PastIndex,
    FutureIndex,
    ClosestToTimestamp,
}

impl TimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeMode::OldestPast => "OLDEST_PAST",
            TimeMode::LatestPast => "LATEST_PAST",
            TimeMode::NearestToNow => "NEAREST_TO_NOW",
            TimeMode::PastIndex => "PAST_INDEX",
            TimeMode::FutureIndex => "FUTURE_INDEX",
            TimeMode::ClosestToTimestamp => "CLOSEST_TO_TIMESTAMP",
        }
    }
}

impl fmt::Display for TimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "OLDEST_PAST" => Ok(TimeMode::OldestPast),
            "LATEST_PAST" => Ok(TimeMode::LatestPast),
            "NEAREST_TO_NOW" => Ok(TimeMode::NearestToNow),
            "PAST_INDEX" => Ok(TimeMode::PastIndex),
            "FUTURE_INDEX" => Ok(TimeMode::FutureIndex),
            "CLOSEST_TO_TIMESTAMP" => Ok(TimeMode::ClosestToTimestamp),
            other => Err(format!("unknown time mode: {}", other)),
        }
    }
}

/// A time-selection policy together with the data it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameSelection {
    OldestPast,
    LatestPast,
    NearestToNow,
    /// Index into the past list; clamped into range, negatives become 0
    PastIndex(i64),
    /// Index into the forecast list; clamped into range, negatives become 0
    FutureIndex(i64),
    /// Target UNIX seconds; `None` means "now"
    ClosestToTimestamp(Option<i64>),
}

impl FrameSelection {
    pub fn mode(&self) -> TimeMode {
        match self {
            FrameSelection::OldestPast => TimeMode::OldestPast,
            FrameSelection::LatestPast => TimeMode::LatestPast,
            FrameSelection::NearestToNow => TimeMode::NearestToNow,
            FrameSelection::PastIndex(_) => TimeMode::PastIndex,
            FrameSelection::FutureIndex(_) => TimeMode::FutureIndex,
            FrameSelection::ClosestToTimestamp(_) => TimeMode::ClosestToTimestamp,
        }
    }

    /// Build a selection from a mode tag plus the optional index/timestamp
    /// parameters a query string would carry.
    pub fn from_parts(mode: TimeMode, index: Option<i64>, target: Option<i64>) -> Self {
        match mode {
            TimeMode::OldestPast => FrameSelection::OldestPast,
            TimeMode::LatestPast => FrameSelection::LatestPast,
            TimeMode::NearestToNow => FrameSelection::NearestToNow,
            TimeMode::PastIndex => FrameSelection::PastIndex(index.unwrap_or(0)),
            TimeMode::FutureIndex => FrameSelection::FutureIndex(index.unwrap_or(0)),
            TimeMode::ClosestToTimestamp => FrameSelection::ClosestToTimestamp(target),
        }
    }
}

impl Default for FrameSelection {
    fn default() -> Self {
        FrameSelection::LatestPast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog {
            tile_host: "https://tilecache.example.com".into(),
            past_frames: vec![Frame::new(100, "/p/100"), Frame::new(200, "/p/200")],
            forecast_frames: vec![Frame::new(300, "/n/300")],
            generated: None,
        }
    }

    #[test]
    fn test_timestamp_range() {
        assert_eq!(catalog().timestamp_range(), Some((100, 300)));
        assert_eq!(Catalog::default().timestamp_range(), None);
    }

    #[test]
    fn test_time_mode_parse_roundtrip() {
        for mode in [
            TimeMode::OldestPast,
            TimeMode::LatestPast,
            TimeMode::NearestToNow,
            TimeMode::PastIndex,
            TimeMode::FutureIndex,
            TimeMode::ClosestToTimestamp,
        ] {
            assert_eq!(mode.as_str().parse::<TimeMode>().unwrap(), mode);
        }
        assert_eq!("latest-past".parse::<TimeMode>().unwrap(), TimeMode::LatestPast);
        assert!("yesterday".parse::<TimeMode>().is_err());
    }

    #[test]
    fn test_selection_from_parts() {
        assert_eq!(
            FrameSelection::from_parts(TimeMode::PastIndex, Some(3), None),
            FrameSelection::PastIndex(3)
        );
        assert_eq!(
            FrameSelection::from_parts(TimeMode::ClosestToTimestamp, None, Some(42)),
            FrameSelection::ClosestToTimestamp(Some(42))
        );
        assert_eq!(FrameSelection::FutureIndex(1).mode(), TimeMode::FutureIndex);
    }

    #[test]
    fn test_mode_serializes_screaming_snake() {
        let json = serde_json::to_string(&TimeMode::NearestToNow).unwrap();
        assert_eq!(json, "\"NEAREST_TO_NOW\"");
    }
}
