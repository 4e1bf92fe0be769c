//! Rain zone command-line tool.
//!
//! Queries the radar catalog and prints extraction results as JSON:
//! - `zones`: polygons inside a bounding box for one frame
//! - `corridor`: simplified polygons around a route between two points
//! - `check`: whether it is raining at one point
//! - `timeline`: polygons for every frame in the catalog
//! - `tile`: save one raw tile of the oldest past frame

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use radar_common::{BoundingBox, EngineConfig, FrameSelection, GeoPoint, TimeMode};
use radar_source::TileRenderOverrides;
use rain_zones::{ExtractionRequest, ExtractionResult, RainZoneEngine, DEFAULT_CORRIDOR_MARGIN_KM};
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rain-zones")]
#[command(about = "Extract rain zone polygons from radar tiles")]
struct Args {
    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Give up on the whole command after this many seconds
    #[arg(long, env = "RADAR_DEADLINE_SECS")]
    deadline_secs: Option<u64>,

    /// Catalog document URL (overrides RADAR_CATALOG_URL from the environment)
    #[arg(long)]
    catalog_url: Option<String>,

    /// Maximum tiles fetched per extraction
    #[arg(long)]
    max_tiles: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

/// Frame selection flags shared by the extraction commands.
#[derive(clap::Args, Debug, Clone)]
struct TimeArgs {
    /// Selection policy: oldest-past, latest-past, nearest-to-now,
    /// past-index, future-index or closest-to-timestamp
    #[arg(long, default_value = "latest-past")]
    mode: TimeMode,

    /// Frame index for past-index and future-index
    #[arg(long)]
    index: Option<i64>,

    /// Target UNIX seconds for closest-to-timestamp (defaults to now)
    #[arg(long)]
    timestamp: Option<i64>,
}

impl TimeArgs {
    fn selection(&self) -> FrameSelection {
        FrameSelection::from_parts(self.mode, self.index, self.timestamp)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rain polygons inside a bounding box
    Zones {
        /// west,south,east,north in degrees
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,

        #[command(flatten)]
        time: TimeArgs,

        /// Apply Douglas-Peucker simplification
        #[arg(long)]
        simplify: bool,

        /// Emit polygon points as [lat, lon] instead of [lon, lat]
        #[arg(long)]
        lat_lon: bool,
    },

    /// Simplified rain polygons around the route between two points
    Corridor {
        /// Start point as lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: GeoPoint,

        /// End point as lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: GeoPoint,

        /// Margin around the route in kilometres
        #[arg(long, default_value_t = DEFAULT_CORRIDOR_MARGIN_KM)]
        margin_km: f64,

        #[command(flatten)]
        time: TimeArgs,
    },

    /// Is it raining at a point
    Check {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[command(flatten)]
        time: TimeArgs,
    },

    /// Polygons for every past and forecast frame, oldest first
    Timeline {
        /// west,south,east,north in degrees
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Apply Douglas-Peucker simplification
        #[arg(long)]
        simplify: bool,
    },

    /// Download one tile of the oldest past frame
    Tile {
        #[arg(long)]
        z: u32,

        #[arg(long)]
        x: u32,

        #[arg(long)]
        y: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        tile_size: Option<u32>,

        #[arg(long)]
        color_scheme: Option<u32>,

        #[arg(long)]
        smooth: Option<u32>,

        #[arg(long)]
        snow: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout stays clean JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = engine_config(&args);
    info!(catalog = %config.catalog_url, max_tiles = config.max_tiles, "Starting rain-zones");

    let engine = RainZoneEngine::with_reqwest(config).context("Failed to create HTTP client")?;
    let deadline = args.deadline_secs.map(Duration::from_secs);

    run(&engine, args.command, deadline).await
}

fn engine_config(args: &Args) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(url) = &args.catalog_url {
        config.catalog_url = url.clone();
    }
    if let Some(max_tiles) = args.max_tiles.filter(|n| *n > 0) {
        config.max_tiles = max_tiles;
    }
    config
}

async fn run(engine: &RainZoneEngine, command: Command, deadline: Option<Duration>) -> Result<()> {
    match command {
        Command::Zones {
            bbox,
            time,
            simplify,
            lat_lon,
        } => {
            let mut request = ExtractionRequest::new(bbox, time.selection()).simplified(simplify);
            if let Some(d) = deadline {
                request = request.with_deadline(d);
            }
            let result = engine.extract(&request).await.context("Extraction failed")?;
            if lat_lon {
                print_json(&lat_lon_view(&result))
            } else {
                print_json(&result)
            }
        }

        Command::Corridor {
            from,
            to,
            margin_km,
            time,
        } => {
            let result = bounded(deadline, engine.corridor(from, to, margin_km, time.selection()))
                .await
                .context("Corridor extraction failed")?;
            print_json(&result)
        }

        Command::Check { lat, lon, time } => {
            let selection = time.selection();
            let raining = bounded(deadline, engine.is_raining(lat, lon, &selection))
                .await
                .context("Point query failed")?;
            print_json(&json!({
                "lat": lat,
                "lon": lon,
                "selection_policy": selection.mode(),
                "raining": raining,
            }))
        }

        Command::Timeline { bbox, simplify } => {
            let results = engine
                .extract_timeline(&bbox, simplify, deadline)
                .await
                .context("Timeline extraction failed")?;
            print_json(&results)
        }

        Command::Tile {
            z,
            x,
            y,
            output,
            tile_size,
            color_scheme,
            smooth,
            snow,
        } => {
            let overrides = TileRenderOverrides {
                tile_size,
                color_scheme,
                smooth,
                snow,
            };
            let bytes = bounded(deadline, engine.fetch_oldest_past_tile(z, x, y, &overrides))
                .await
                .context("Tile request failed")?;
            match bytes {
                Some(bytes) => {
                    write_tile(&output, &bytes).await?;
                    info!(path = %output.display(), bytes = bytes.len(), "Tile saved");
                    Ok(())
                }
                None => {
                    warn!(z, x, y, "Tile not available");
                    Err(anyhow!("tile {}/{}/{} is not available", z, x, y))
                }
            }
        }
    }
}

/// Apply the command-wide deadline to a single engine call.
async fn bounded<T, F>(deadline: Option<Duration>, work: F) -> Result<T>
where
    F: Future<Output = radar_common::RadarResult<T>>,
{
    match deadline {
        Some(after) => tokio::time::timeout(after, work)
            .await
            .map_err(|_| anyhow!("deadline of {:?} exceeded", after))?
            .map_err(Into::into),
        None => Ok(work.await?),
    }
}

async fn write_tile(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn lat_lon_view(result: &ExtractionResult) -> serde_json::Value {
    let polygons: Vec<Vec<[f64; 2]>> = result.polygons.iter().map(|p| p.to_lat_lon()).collect();
    json!({
        "polygons": polygons,
        "frame_timestamp": result.frame_timestamp,
        "selection_policy": result.selection_policy,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_bbox_string(s).map_err(|e| e.to_string())
}

fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lon, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("invalid coordinate '{}'", v))
    };
    Ok(GeoPoint::new(parse(lat)?, parse(lon)?))
}
