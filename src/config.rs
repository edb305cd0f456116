//! Analyzer configuration

use crate::error::TrackError;
use crate::types::{DistanceMode, FileVariant};
use serde::{Deserialize, Serialize};

/// Default subsampling stride for calibrated path length
pub const DEFAULT_SAMPLE_STRIDE: usize = 5;

/// Settings controlling metric computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Forced distance mode; `None` picks the mode matching the file variant
    pub distance_mode: Option<DistanceMode>,
    /// Every n-th trackable frame is used for calibrated path length
    pub sample_stride: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            distance_mode: None,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from JSON, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let config: AnalyzerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, TrackError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        if self.sample_stride == 0 {
            return Err(TrackError::InvalidConfig(
                "sample_stride must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Distance mode to use for a track of the given variant
    pub fn distance_mode_for(&self, variant: FileVariant) -> DistanceMode {
        self.distance_mode
            .unwrap_or_else(|| DistanceMode::for_variant(variant))
    }
}
