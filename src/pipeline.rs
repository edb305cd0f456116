//! Pipeline orchestration
//!
//! This module provides the public API for Krocan.
//! It runs track files through the parser and analyzer, one file at a time,
//! and keeps going when a single file fails.

use crate::analyzer::TrackAnalyzer;
use crate::config::AnalyzerConfig;
use crate::error::TrackError;
use crate::parser::LogParser;
use crate::types::{FileVariant, MetricVector};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of tracker log files
pub const TRACK_EXTENSION: &str = "dat";

/// Metrics of one successfully analyzed file
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    /// Base name of the source file
    pub file_name: String,
    pub variant: FileVariant,
    pub frames: usize,
    pub trackable_frames: usize,
    pub metrics: MetricVector,
}

/// Result for one file of a batch
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<TrackSummary, TrackError>,
}

impl FileOutcome {
    /// Base name used in the `Filename` column
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Parse and analyze one track file.
///
/// # Example
/// ```ignore
/// let summary = analyze_file(Path::new("rat01.dat"), &AnalyzerConfig::default())?;
/// println!("{} entrances", summary.metrics.entrances);
/// ```
pub fn analyze_file(path: &Path, config: &AnalyzerConfig) -> Result<TrackSummary, TrackError> {
    TrackProcessor::new(config.clone())?.process_file(path)
}

/// Processor holding a validated configuration for batch runs
#[derive(Debug, Clone, Default)]
pub struct TrackProcessor {
    analyzer: TrackAnalyzer,
}

impl TrackProcessor {
    pub fn new(config: AnalyzerConfig) -> Result<Self, TrackError> {
        config.validate()?;
        Ok(Self {
            analyzer: TrackAnalyzer::new(config),
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        self.analyzer.config()
    }

    /// Parse and analyze one file
    pub fn process_file(&self, path: &Path) -> Result<TrackSummary, TrackError> {
        let track = LogParser::parse(path)?;
        let metrics = self.analyzer.analyze(&track)?;

        Ok(TrackSummary {
            file_name: file_name_of(path),
            variant: track.params.variant,
            frames: track.frames.len(),
            trackable_frames: track.trackable_frames().len(),
            metrics,
        })
    }

    /// Process every file in order, recording failures instead of stopping
    pub fn process_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<FileOutcome> {
        let outcomes: Vec<FileOutcome> = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let result = self.process_file(path);
                if let Err(e) = &result {
                    warn!("Skipping {}: {}", path.display(), e);
                }
                FileOutcome {
                    path: path.to_path_buf(),
                    result,
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            "Processed {} track files ({} failed)",
            outcomes.len(),
            failed
        );

        outcomes
    }
}

/// List the `.dat` files of a directory, sorted by path
pub fn collect_track_files(dir: &Path) -> Result<Vec<PathBuf>, TrackError> {
    let io_err = |source: std::io::Error| TrackError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_track = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(TRACK_EXTENSION))
            .unwrap_or(false);
        if path.is_file() && is_track {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
