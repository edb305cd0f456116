//! Core types for the Krocan engine
//!
//! This module defines the data structures that flow from the log parser into
//! the track analyzer: frames, calibration parameters, tracks and metrics.

use serde::{Deserialize, Serialize};

/// Tracked position in raw tracker coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Per-frame classification reported by the rig
///
/// Raw codes: `"0"` is outside the reinforced region, `"2"` means the stimulus
/// is active, every other code means the subject is inside/avoiding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCode {
    Outside,
    Inside,
    Shock,
}

impl StateCode {
    /// Classify a raw state token
    pub fn from_token(token: &str) -> Self {
        match token {
            "0" => StateCode::Outside,
            "2" => StateCode::Shock,
            _ => StateCode::Inside,
        }
    }

    /// Any non-zero code counts as inside, including an active shock
    pub fn is_inside(&self) -> bool {
        !matches!(self, StateCode::Outside)
    }

    pub fn is_shock(&self) -> bool {
        matches!(self, StateCode::Shock)
    }
}

/// One sample row of a track log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame counter as written by the rig (opaque)
    pub index: String,
    /// Rig timestamp, non-decreasing across the file
    pub timestamp: i64,
    /// `None` when the tracker lost the subject for this frame
    pub position: Option<Position>,
    /// Region/stimulus state
    pub state: StateCode,
    /// Passthrough columns not used by the metrics
    pub extra: Vec<String>,
}

impl Frame {
    pub fn is_trackable(&self) -> bool {
        self.position.is_some()
    }
}

/// Log format variant, resolved from which calibration headers are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileVariant {
    /// No pixel calibration; diameter is kept as written
    Legacy,
    /// Pixel calibration present; diameter is stored in meters
    Calibrated,
    /// Pixel calibration and a reinforced sector present
    Reinforced,
}

impl FileVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileVariant::Legacy => "legacy",
            FileVariant::Calibrated => "calibrated",
            FileVariant::Reinforced => "reinforced",
        }
    }
}

/// Arena geometry and calibration recovered from a log header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Arena center X (raw coordinate units)
    pub arena_x: f64,
    /// Arena center Y (raw coordinate units)
    pub arena_y: f64,
    /// Arena diameter after unit normalization
    pub diameter: f64,
    /// Arena diameter exactly as written in the header
    pub raw_diameter: f64,
    /// Reinforced sector radius (robot-frame units)
    pub shock_radius: Option<f64>,
    /// Tracker resolution in pixels per centimeter
    pub pix_per_cm: Option<f64>,
    pub variant: FileVariant,
}

impl CalibrationParams {
    /// Radius of the center region: half-diagonal of the inscribed square
    pub fn center_radius(&self) -> f64 {
        (self.diameter / 2.0) / std::f64::consts::SQRT_2
    }

    pub fn arena_center(&self) -> Position {
        Position::new(self.arena_x, self.arena_y)
    }
}

/// A fully parsed track log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Name of the source (file name or caller-provided label)
    pub source: String,
    pub frames: Vec<Frame>,
    pub params: CalibrationParams,
}

impl Track {
    /// Frames with a captured position, in file order
    pub fn trackable_frames(&self) -> Vec<&Frame> {
        self.frames.iter().filter(|f| f.is_trackable()).collect()
    }
}

/// Path length computation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Subsampled Euclidean path, converted to centimeters
    Calibrated,
    /// Absolute X deltas between every consecutive frame, raw units
    LegacyXDelta,
}

impl DistanceMode {
    /// Mode historically used for a given file variant
    pub fn for_variant(variant: FileVariant) -> Self {
        match variant {
            FileVariant::Legacy => DistanceMode::LegacyXDelta,
            FileVariant::Calibrated | FileVariant::Reinforced => DistanceMode::Calibrated,
        }
    }
}

/// Behavioral metrics for one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricVector {
    /// Number of Outside -> Inside transitions
    pub entrances: u32,
    /// Path length (cm, or raw units in legacy mode), 2 decimals.
    /// `None` when fewer than two points remain to measure between.
    pub distance: Option<f64>,
    /// Longest avoidance run (timestamp units)
    pub max_time_avoided: i64,
    /// Timestamp of the first Inside frame, 0 if never entered
    pub time_first_entrance: i64,
    /// Number of stimulus onsets
    pub shocks: u32,
    /// Fraction of trackable frames in the center region, 3 decimals
    pub center_fraction: f64,
}
