//! Header scanning
//!
//! Header lines carry labeled value groups of the form `Label.N ( v1 v2 ... )`.
//! The scanner picks out the handful of labels the engine cares about and
//! records their values. Later occurrences overwrite earlier ones.

use log::warn;
use regex::Regex;
use std::sync::OnceLock;

const ARENA_CENTER: &str = "ArenaCenterXY";
const ARENA_DIAMETER: &str = "ArenaDiameter_m";
const REINFORCED_SECTOR: &str = "ReinforcedSector";
const TRACKER_RESOLUTION: &str = "TrackerResolution_PixPerCM";

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(ArenaCenterXY|ArenaDiameter_m|ReinforcedSector|TrackerResolution_PixPerCM)(?:\.\d+)?\s*\(([^)]*)\)",
        )
        .expect("header label pattern is valid")
    })
}

/// Returns true for `%` and `//` annotation lines
pub fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('%') || trimmed.starts_with("//")
}

/// Calibration values collected from header lines, before unit normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderValues {
    pub arena_center: Option<(f64, f64)>,
    pub diameter: Option<f64>,
    pub shock_radius: Option<f64>,
    pub pix_per_cm: Option<f64>,
}

impl HeaderValues {
    /// Scan one header line and record every recognized label on it
    pub fn scan_line(&mut self, line: &str) {
        for caps in label_pattern().captures_iter(line) {
            let label = &caps[1];
            let values = match parse_values(&caps[2]) {
                Some(values) => values,
                None => {
                    warn!("Ignoring {label}: non-numeric values in {:?}", &caps[2]);
                    continue;
                }
            };

            match (label, values.as_slice()) {
                (ARENA_CENTER, [x, y, ..]) => self.arena_center = Some((*x, *y)),
                (ARENA_DIAMETER, [d, ..]) => self.diameter = Some(*d),
                (REINFORCED_SECTOR, [r, ..]) => self.shock_radius = Some(*r),
                (TRACKER_RESOLUTION, [p, ..]) => self.pix_per_cm = Some(*p),
                _ => warn!("Ignoring {label}: expected more values, got {}", values.len()),
            }
        }
    }
}

fn parse_values(raw: &str) -> Option<Vec<f64>> {
    raw.split_whitespace()
        .map(|token| token.parse::<f64>().ok())
        .collect()
}
