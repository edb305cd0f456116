//! Track analysis
//!
//! This module derives the behavioral metrics from a parsed track:
//! - entrances into and shocks inside the reinforced region
//! - path length
//! - longest avoidance run and latency to first entrance
//! - fraction of time spent near the arena center
//!
//! Every metric is computed over the trackable frames only. A path too short
//! to measure leaves `distance` unset instead of reporting zero.

use crate::config::AnalyzerConfig;
use crate::error::TrackError;
use crate::scan::{count_rising_edges, longest_avoidance_run};
use crate::types::{CalibrationParams, DistanceMode, Frame, MetricVector, Position, Track};
use log::warn;

/// Track analyzer for computing metric vectors
#[derive(Debug, Clone, Default)]
pub struct TrackAnalyzer {
    config: AnalyzerConfig,
}

impl TrackAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a parsed track
    pub fn analyze(&self, track: &Track) -> Result<MetricVector, TrackError> {
        self.analyze_frames(&track.frames, &track.params)
    }

    /// Analyze frames against calibration parameters
    pub fn analyze_frames(
        &self,
        frames: &[Frame],
        params: &CalibrationParams,
    ) -> Result<MetricVector, TrackError> {
        let trackable: Vec<&Frame> = frames.iter().filter(|f| f.is_trackable()).collect();

        if trackable.is_empty() {
            return Err(TrackError::EmptyTrack);
        }

        let mode = self.config.distance_mode_for(params.variant);
        let stride = self.config.sample_stride;
        let distance = match compute_distance(&trackable, params, mode, stride) {
            Ok(distance) => Some(round_to(distance, 2)),
            Err(TrackError::DegenerateTrack { metric, trackable: points }) => {
                warn!("No {metric} computed: {points} point(s) left after sampling");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(MetricVector {
            entrances: count_rising_edges(trackable.iter().copied(), |f| f.state.is_inside()),
            distance,
            max_time_avoided: longest_avoidance_run(&trackable),
            time_first_entrance: compute_time_first_entrance(&trackable),
            shocks: count_rising_edges(trackable.iter().copied(), |f| f.state.is_shock()),
            center_fraction: round_to(compute_center_fraction(&trackable, params)?, 3),
        })
    }
}

/// Path length in the requested mode
///
/// Fails with `DegenerateTrack` when fewer than two points remain to measure
/// between, which in calibrated mode includes tracks no longer than the stride.
pub fn compute_distance(
    frames: &[&Frame],
    params: &CalibrationParams,
    mode: DistanceMode,
    stride: usize,
) -> Result<f64, TrackError> {
    let points: Vec<Position> = frames.iter().filter_map(|f| f.position).collect();

    let (points, scale) = match mode {
        DistanceMode::Calibrated => {
            // Zero or negative resolution counts as missing
            let pix_per_cm = params
                .pix_per_cm
                .filter(|p| *p > 0.0)
                .ok_or(TrackError::MissingCalibration("pix_per_cm"))?;
            let sampled: Vec<Position> = points.into_iter().step_by(stride.max(1)).collect();
            (sampled, pix_per_cm)
        }
        DistanceMode::LegacyXDelta => (points, 1.0),
    };

    if points.len() < 2 {
        return Err(TrackError::DegenerateTrack {
            metric: "distance",
            trackable: points.len(),
        });
    }

    // An empty f64 sum() yields -0.0, so fold from a positive zero
    let length = points.windows(2).fold(0.0, |acc, w| match mode {
        DistanceMode::Calibrated => acc + w[0].distance_to(&w[1]),
        DistanceMode::LegacyXDelta => acc + (w[1].x - w[0].x).abs(),
    });

    Ok(length / scale)
}

/// Timestamp of the first inside frame, 0 when the subject never entered
pub fn compute_time_first_entrance(frames: &[&Frame]) -> i64 {
    frames
        .iter()
        .find(|f| f.state.is_inside())
        .map(|f| f.timestamp)
        .unwrap_or(0)
}

/// Share of frames strictly inside the center region
pub fn compute_center_fraction(
    frames: &[&Frame],
    params: &CalibrationParams,
) -> Result<f64, TrackError> {
    if frames.is_empty() {
        return Err(TrackError::EmptyTrack);
    }

    let center = params.arena_center();
    let radius = params.center_radius();
    let in_center = frames
        .iter()
        .filter_map(|f| f.position)
        .filter(|p| p.distance_to(&center) < radius)
        .count();

    Ok(in_center as f64 / frames.len() as f64)
}

/// Rounds exact halves away from zero (0.125 -> 0.13), not to even
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileVariant, StateCode};
    use pretty_assertions::assert_eq;

    fn frame(timestamp: i64, x: f64, y: f64, state: &str) -> Frame {
        Frame {
            index: timestamp.to_string(),
            timestamp,
            position: Some(Position::new(x, y)),
            state: StateCode::from_token(state),
            extra: vec!["0".to_string()],
        }
    }

    fn untracked(timestamp: i64, state: &str) -> Frame {
        Frame {
            position: None,
            ..frame(timestamp, 0.0, 0.0, state)
        }
    }

    fn params(variant: FileVariant) -> CalibrationParams {
        CalibrationParams {
            arena_x: 10.0,
            arena_y: 20.0,
            diameter: 4.0,
            raw_diameter: 4.0,
            shock_radius: None,
            pix_per_cm: Some(1.0),
            variant,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let frames = vec![
            frame(0, 10.0, 20.0, "0"),
            frame(1, 10.0, 20.0, "1"),
            frame(2, 10.0, 20.0, "0"),
            frame(3, 10.0, 20.0, "1"),
        ];
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();

        assert_eq!(metrics.entrances, 2);
        assert_eq!(metrics.time_first_entrance, 1);
        assert_eq!(metrics.shocks, 0);
        assert_eq!(metrics.center_fraction, 1.0);
        // Four frames at stride 5 leave one sample, nothing to measure
        assert_eq!(metrics.distance, None);
        // Seeded at 0, reset to 2 on exit, inside again at 3
        assert_eq!(metrics.max_time_avoided, 1);
    }

    #[test]
    fn test_all_untracked_is_empty_track() {
        let frames = vec![untracked(0, "0"), untracked(1, "1"), untracked(2, "2")];
        let result = TrackAnalyzer::default().analyze_frames(&frames, &params(FileVariant::Legacy));

        assert!(matches!(result, Err(TrackError::EmptyTrack)));
    }

    #[test]
    fn test_single_frame_leaves_distance_unset() {
        let frames = vec![untracked(0, "0"), frame(1, 10.0, 20.0, "1")];
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Legacy))
            .unwrap();

        assert_eq!(metrics.distance, None);
        assert_eq!(metrics.entrances, 1);
        assert_eq!(metrics.time_first_entrance, 1);
    }

    #[test]
    fn test_short_calibrated_track_is_degenerate() {
        // Three frames at stride 5 sample only the first one
        let frames = vec![
            frame(0, 0.0, 0.0, "0"),
            frame(1, 30.0, 40.0, "0"),
            frame(2, 60.0, 80.0, "0"),
        ];
        let refs: Vec<&Frame> = frames.iter().collect();

        assert!(matches!(
            compute_distance(&refs, &params(FileVariant::Calibrated), DistanceMode::Calibrated, 5),
            Err(TrackError::DegenerateTrack {
                metric: "distance",
                trackable: 1
            })
        ));
        assert_eq!(
            compute_distance(&refs, &params(FileVariant::Calibrated), DistanceMode::Calibrated, 1)
                .unwrap(),
            100.0
        );
    }

    #[test]
    fn test_stationary_distance_is_positive_zero() {
        let frames: Vec<Frame> = (0..6).map(|i| frame(i, 10.0, 20.0, "0")).collect();
        let refs: Vec<&Frame> = frames.iter().collect();

        for mode in [DistanceMode::Calibrated, DistanceMode::LegacyXDelta] {
            let distance = compute_distance(&refs, &params(FileVariant::Calibrated), mode, 5)
                .unwrap();
            assert_eq!(distance, 0.0);
            assert!(distance.is_sign_positive());
        }

        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();
        assert!(metrics.distance.unwrap().is_sign_positive());
    }

    #[test]
    fn test_untracked_frames_are_filtered() {
        // The untracked inside frame must not count as an entrance
        let frames = vec![
            frame(0, 10.0, 20.0, "0"),
            untracked(5, "1"),
            frame(10, 10.0, 20.0, "0"),
            frame(15, 10.0, 20.0, "0"),
        ];
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();

        assert_eq!(metrics.entrances, 0);
        assert_eq!(metrics.shocks, 0);
        assert_eq!(metrics.time_first_entrance, 0);
        assert_eq!(metrics.max_time_avoided, 0);
    }

    #[test]
    fn test_untracked_shock_is_not_counted() {
        let frames = vec![
            frame(0, 10.0, 20.0, "0"),
            untracked(5, "2"),
            untracked(6, "2"),
            frame(10, 10.0, 20.0, "0"),
            frame(15, 10.0, 20.0, "2"),
        ];
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();

        assert_eq!(metrics.shocks, 1);
        assert_eq!(metrics.entrances, 1);
        assert_eq!(metrics.time_first_entrance, 15);
    }

    #[test]
    fn test_all_outside_track() {
        let frames: Vec<Frame> = (0..8)
            .map(|i| frame(i * 100, i as f64, 0.0, "0"))
            .collect();
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();

        assert_eq!(metrics.entrances, 0);
        assert_eq!(metrics.shocks, 0);
        assert_eq!(metrics.time_first_entrance, 0);
        assert_eq!(metrics.max_time_avoided, 0);
        assert_eq!(metrics.distance, Some(5.0));
    }

    #[test]
    fn test_shock_counting() {
        let frames = vec![
            frame(0, 10.0, 20.0, "0"),
            frame(1, 10.0, 20.0, "1"),
            frame(2, 10.0, 20.0, "2"),
            frame(3, 10.0, 20.0, "1"),
            frame(4, 10.0, 20.0, "2"),
            frame(5, 10.0, 20.0, "2"),
        ];
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();

        assert_eq!(metrics.entrances, 1);
        assert_eq!(metrics.shocks, 2);
        assert_eq!(metrics.max_time_avoided, 5);
    }

    #[test]
    fn test_calibrated_distance_subsamples() {
        // 11 frames moving 1 px per frame along x; samples at 0, 5, 10
        let frames: Vec<Frame> = (0..11).map(|i| frame(i, i as f64, 0.0, "0")).collect();
        let mut p = params(FileVariant::Calibrated);
        p.pix_per_cm = Some(2.0);

        let metrics = TrackAnalyzer::default().analyze_frames(&frames, &p).unwrap();
        assert_eq!(metrics.distance, Some(5.0));
    }

    #[test]
    fn test_calibrated_distance_is_euclidean() {
        let frames = vec![frame(0, 0.0, 0.0, "0"), frame(1, 3.0, 4.0, "0")];
        let refs: Vec<&Frame> = frames.iter().collect();

        let distance =
            compute_distance(&refs, &params(FileVariant::Calibrated), DistanceMode::Calibrated, 1)
                .unwrap();
        assert_eq!(distance, 5.0);
    }

    #[test]
    fn test_calibrated_distance_requires_resolution() {
        let frames = vec![frame(0, 0.0, 0.0, "0"), frame(1, 3.0, 4.0, "0")];
        let refs: Vec<&Frame> = frames.iter().collect();
        let mut p = params(FileVariant::Calibrated);
        p.pix_per_cm = None;

        assert!(matches!(
            compute_distance(&refs, &p, DistanceMode::Calibrated, 5),
            Err(TrackError::MissingCalibration("pix_per_cm"))
        ));
    }

    #[test]
    fn test_legacy_distance_uses_x_deltas() {
        let frames = vec![
            frame(0, 1.0, 0.0, "0"),
            frame(1, 4.0, 100.0, "0"),
            frame(2, 2.0, 50.0, "0"),
        ];
        let mut p = params(FileVariant::Legacy);
        p.pix_per_cm = None;

        let metrics = TrackAnalyzer::default().analyze_frames(&frames, &p).unwrap();
        assert_eq!(metrics.distance, Some(5.0));
    }

    #[test]
    fn test_distance_non_decreasing_when_appending() {
        let analyzer = TrackAnalyzer::default();
        let p = params(FileVariant::Calibrated);
        let mut frames = vec![frame(0, 0.0, 0.0, "0")];
        let mut previous = 0.0;

        for i in 1..30 {
            frames.push(frame(i, (i * i) as f64, 0.0, "0"));
            let distance = analyzer
                .analyze_frames(&frames, &p)
                .unwrap()
                .distance
                .unwrap_or(0.0);
            assert!(distance >= previous);
            assert!(distance >= 0.0);
            previous = distance;
        }
    }

    #[test]
    fn test_center_fraction() {
        // Radius = (4 / 2) / sqrt(2) ~= 1.414
        let frames = vec![
            frame(0, 10.0, 20.0, "0"),
            frame(1, 10.5, 20.5, "0"),
            frame(2, 12.0, 20.0, "0"),
        ];
        let metrics = TrackAnalyzer::default()
            .analyze_frames(&frames, &params(FileVariant::Calibrated))
            .unwrap();

        assert_eq!(metrics.center_fraction, 0.667);
        assert!((0.0..=1.0).contains(&metrics.center_fraction));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let frames = vec![
            frame(0, 10.0, 20.0, "0"),
            frame(7, 13.0, 22.0, "2"),
            frame(9, 8.0, 18.0, "0"),
        ];
        let track = Track {
            source: "t".to_string(),
            frames: frames.clone(),
            params: params(FileVariant::Calibrated),
        };
        let analyzer = TrackAnalyzer::default();

        let first = analyzer.analyze(&track).unwrap();
        let second = analyzer.analyze(&track).unwrap();
        assert_eq!(first, second);
        assert_eq!(track.frames, frames);
    }
}
