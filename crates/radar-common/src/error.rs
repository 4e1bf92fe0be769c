//! Error types for radar polygon extraction.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Catalog,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Catalog => "catalog",
            Stage::Extraction => "extraction",
        };
        f.write_str(name)
    }
}

/// Caller-visible failures of the extraction engine.
///
/// Tile-level failures never show up here: a tile that cannot be fetched or
/// decoded is treated as "no rain" where it is consumed.
#[derive(Debug, Error)]
pub enum RadarError {
    #[error("[{stage}] network error: {message}")]
    Network { stage: Stage, message: String },

    #[error("[{stage}] parse error: {message}")]
    Parse { stage: Stage, message: String },

    #[error("[catalog] no data: {0}")]
    NoData(String),

    #[error("[{stage}] deadline of {after:?} exceeded")]
    Timeout { stage: Stage, after: Duration },

    #[error("[{stage}] internal error: {message}")]
    Internal { stage: Stage, message: String },
}

impl RadarError {
    pub fn network(stage: Stage, message: impl Into<String>) -> Self {
        RadarError::Network {
            stage,
            message: message.into(),
        }
    }

    pub fn parse(stage: Stage, message: impl Into<String>) -> Self {
        RadarError::Parse {
            stage,
            message: message.into(),
        }
    }

    /// Stage the failure is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            RadarError::Network { stage, .. }
            | RadarError::Parse { stage, .. }
            | RadarError::Timeout { stage, .. }
            | RadarError::Internal { stage, .. } => *stage,
            RadarError::NoData(_) => Stage::Catalog,
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RadarError::Network { .. } | RadarError::Timeout { .. })
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::parse(Stage::Catalog, format!("JSON error: {}", err))
    }
}
