//! Calibration normalization
//!
//! Turns raw header values into [`CalibrationParams`]:
//! - the file variant is resolved from which optional headers are present
//! - the arena diameter is converted to pixels when the variant stores meters
//! - required fields are checked

use crate::error::TrackError;
use crate::header::HeaderValues;
use crate::types::{CalibrationParams, FileVariant};

const CM_PER_M: f64 = 100.0;

/// Calibrator for converting header values into calibration parameters
pub struct Calibrator;

impl Calibrator {
    /// Build calibration parameters from scanned header values
    pub fn calibrate(values: &HeaderValues) -> Result<CalibrationParams, TrackError> {
        let (arena_x, arena_y) = values
            .arena_center
            .ok_or(TrackError::MissingCalibration("arena_x/arena_y"))?;
        let raw_diameter = values
            .diameter
            .ok_or(TrackError::MissingCalibration("diameter"))?;

        let variant = resolve_variant(values);
        let diameter = normalize_diameter(raw_diameter, variant, values.pix_per_cm);

        Ok(CalibrationParams {
            arena_x,
            arena_y,
            diameter,
            raw_diameter,
            shock_radius: values.shock_radius,
            pix_per_cm: values.pix_per_cm,
            variant,
        })
    }
}

/// Resolve the file variant from header presence
pub fn resolve_variant(values: &HeaderValues) -> FileVariant {
    match (values.pix_per_cm, values.shock_radius) {
        (None, _) => FileVariant::Legacy,
        (Some(_), None) => FileVariant::Calibrated,
        (Some(_), Some(_)) => FileVariant::Reinforced,
    }
}

/// Diameter in tracker pixels for calibrated variants, untouched for legacy logs
pub fn normalize_diameter(raw: f64, variant: FileVariant, pix_per_cm: Option<f64>) -> f64 {
    match (variant, pix_per_cm) {
        (FileVariant::Calibrated | FileVariant::Reinforced, Some(ppcm)) => raw * CM_PER_M * ppcm,
        _ => raw,
    }
}
