//! Network side of radar polygon extraction.
//!
//! - [`catalog`]: fetches and parses the frame catalog
//! - [`url`]: tile URL template and render parameters
//! - [`fetcher`]: bounded-concurrency tile download and alpha decoding
//! - [`http`]: the HTTP seam, with a reqwest-backed implementation

pub mod catalog;
pub mod fetcher;
pub mod http;
pub mod url;

pub use catalog::{parse_catalog, CatalogClient};
pub use fetcher::{decode_alpha, TileBatch, TileError, TileFetcher};
pub use http::{FetchError, HttpFetch, HttpResponse, ReqwestFetch};
pub use radar_common::AlphaTile;
pub use url::{tile_url, TileRenderOverrides, TileRenderParams};
