//! Error types for Krocan

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing or analyzing a track
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Cannot read track file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing calibration parameter: {0}")]
    MissingCalibration(&'static str),

    #[error("Malformed data line {line}: {reason}")]
    MalformedFrame { line: usize, reason: String },

    #[error("Track has no trackable frames")]
    EmptyTrack,

    #[error("Track too short for {metric}: {trackable} trackable frame(s)")]
    DegenerateTrack { metric: &'static str, trackable: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackError {
    /// Short machine-readable code for reports
    pub fn code(&self) -> &'static str {
        match self {
            TrackError::Io { .. } => "IO_ERROR",
            TrackError::MissingCalibration(_) => "MISSING_CALIBRATION",
            TrackError::MalformedFrame { .. } => "MALFORMED_FRAME",
            TrackError::EmptyTrack => "EMPTY_TRACK",
            TrackError::DegenerateTrack { .. } => "DEGENERATE_TRACK",
            TrackError::InvalidConfig(_) => "INVALID_CONFIG",
            TrackError::Csv(_) => "CSV_ERROR",
            TrackError::Json(_) => "JSON_ERROR",
        }
    }
}
