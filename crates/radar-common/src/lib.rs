//! Common types and utilities shared across the rain-zones crates.

pub mod bbox;
pub mod config;
pub mod error;
pub mod projection;
pub mod raster;
pub mod tile;
pub mod time;

pub use bbox::{BoundingBox, GeoPoint};
pub use config::EngineConfig;
pub use error::{RadarError, RadarResult, Stage};
pub use projection::PixelProjector;
pub use raster::AlphaTile;
pub use tile::{TileAddress, TileRange, TILE_SIZE};
pub use time::{Catalog, Frame, FrameSelection, TimeMode};
