//! Krocan - metric extraction engine for arena place-avoidance tracking logs
//!
//! Krocan turns tracker log files into per-track behavioral metrics through a
//! deterministic pipeline: log parsing → calibration normalization → frame
//! filtering → metric derivation → CSV/JSON encoding.
//!
//! ## Modules
//!
//! - **Parsing**: header calibration scanning and frame tokenizing
//! - **Analysis**: entrances, path length, avoidance runs, shocks, center time
//! - **Output**: CSV table, JSON batch report, trajectory export for plotting

pub mod analyzer;
pub mod calibration;
pub mod config;
pub mod encoder;
pub mod error;
pub mod header;
pub mod parser;
pub mod pipeline;
pub mod scan;
pub mod trajectory;
pub mod types;

pub use analyzer::TrackAnalyzer;
pub use config::AnalyzerConfig;
pub use encoder::{BatchReport, ReportEncoder, CSV_HEADER};
pub use error::TrackError;
pub use parser::LogParser;
pub use pipeline::{analyze_file, collect_track_files, FileOutcome, TrackProcessor, TrackSummary};
pub use trajectory::Trajectory;
pub use types::{
    CalibrationParams, DistanceMode, FileVariant, Frame, MetricVector, Position, StateCode, Track,
};

/// Krocan version embedded in all reports
pub const KROCAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "krocan";
