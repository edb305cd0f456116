//! Trajectory export for plotting
//!
//! Plotting tools draw the subject's path over the arena outline and, when the
//! log has one, the reinforced sector. This module hands them exactly that.

use crate::error::TrackError;
use crate::types::{Position, Track};
use serde::{Deserialize, Serialize};

/// Trackable path plus arena geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub source: String,
    /// Trackable positions in file order
    pub points: Vec<Position>,
    pub arena_x: f64,
    pub arena_y: f64,
    pub diameter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shock_radius: Option<f64>,
}

impl Trajectory {
    pub fn from_track(track: &Track) -> Self {
        Self {
            source: track.source.clone(),
            points: track.frames.iter().filter_map(|f| f.position).collect(),
            arena_x: track.params.arena_x,
            arena_y: track.params.arena_y,
            diameter: track.params.diameter,
            shock_radius: track.params.shock_radius,
        }
    }

    /// Sector radius for an overlay circle
    pub fn require_shock_radius(&self) -> Result<f64, TrackError> {
        self.shock_radius
            .ok_or(TrackError::MissingCalibration("shock_radius"))
    }

    pub fn to_json(&self) -> Result<String, TrackError> {
        Ok(serde_json::to_string(self)?)
    }
}
