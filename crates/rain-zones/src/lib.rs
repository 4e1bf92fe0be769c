//! Rain zone extraction from radar tiles.
//!
//! Turns a bounding box and a time-selection policy into vector polygons
//! outlining precipitation, for use as exclusion zones by route planning.
//!
//! # Example
//!
//! ```ignore
//! use radar_common::{BoundingBox, EngineConfig, FrameSelection};
//! use rain_zones::{ExtractionRequest, RainZoneEngine};
//!
//! let engine = RainZoneEngine::with_reqwest(EngineConfig::from_env())?;
//! let bbox = BoundingBox::new(48.9, 48.6, 2.55, 2.1);
//! let result = engine
//!     .extract(&ExtractionRequest::new(bbox, FrameSelection::LatestPast).simplified(true))
//!     .await?;
//! ```

mod aggregator;
pub mod engine;
pub mod planner;
pub mod polygon;
mod sampler;
pub mod selector;

pub use engine::{vectorize, RainZoneEngine, DEFAULT_CORRIDOR_MARGIN_KM};
pub use planner::plan;
pub use polygon::{ExtractionRequest, ExtractionResult, Polygon};
pub use selector::select;
