//! Report encoding
//!
//! This module writes batch results as the CSV table consumed by spreadsheets
//! and as a JSON report carrying producer and provenance metadata.

use crate::config::AnalyzerConfig;
use crate::error::TrackError;
use crate::pipeline::{FileOutcome, TrackSummary};
use crate::types::MetricVector;
use crate::{KROCAN_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// Column names of the CSV table
pub const CSV_HEADER: [&str; 7] = [
    "Filename",
    "Entrances",
    "Distance",
    "Maximum Time Avoided",
    "Time to first entrance",
    "Shocks",
    "Time spent in center",
];

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Status of one file in a batch report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Ok,
    Error,
}

/// Error detail for a failed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub code: String,
    pub message: String,
}

/// One file entry of a batch report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trackable_frames: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

/// Complete batch report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub config: AnalyzerConfig,
    pub succeeded: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

/// Report encoder for CSV and JSON output
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// CSV fields of one analyzed track; an unmeasurable distance is an empty cell
    pub fn csv_row(summary: &TrackSummary) -> [String; 7] {
        let m: &MetricVector = &summary.metrics;
        [
            summary.file_name.clone(),
            m.entrances.to_string(),
            m.distance.map(|d| format!("{:.2}", d)).unwrap_or_default(),
            m.max_time_avoided.to_string(),
            m.time_first_entrance.to_string(),
            m.shocks.to_string(),
            format!("{:.3}", m.center_fraction),
        ]
    }

    /// Write the CSV table; failed files get no row. Returns the row count.
    pub fn write_csv<W: Write>(
        &self,
        writer: W,
        outcomes: &[FileOutcome],
    ) -> Result<usize, TrackError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADER)?;

        let mut rows = 0;
        for summary in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
            wtr.write_record(Self::csv_row(summary))?;
            rows += 1;
        }

        wtr.flush().map_err(|e| TrackError::Csv(e.into()))?;
        Ok(rows)
    }

    /// Build a JSON-ready report of a batch
    pub fn encode_batch(&self, outcomes: &[FileOutcome], config: &AnalyzerConfig) -> BatchReport {
        let files: Vec<FileReport> = outcomes.iter().map(file_report).collect();
        let succeeded = files.iter().filter(|f| f.status == FileStatus::Ok).count();

        BatchReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: KROCAN_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            config: config.clone(),
            succeeded,
            failed: files.len() - succeeded,
            files,
        }
    }

    /// Encode to JSON string
    pub fn encode_batch_to_json(
        &self,
        outcomes: &[FileOutcome],
        config: &AnalyzerConfig,
        pretty: bool,
    ) -> Result<String, TrackError> {
        let report = self.encode_batch(outcomes, config);
        let json = if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }
}

fn file_report(outcome: &FileOutcome) -> FileReport {
    match &outcome.result {
        Ok(summary) => FileReport {
            file: summary.file_name.clone(),
            status: FileStatus::Ok,
            variant: Some(summary.variant.as_str().to_string()),
            frames: Some(summary.frames),
            trackable_frames: Some(summary.trackable_frames),
            metrics: Some(summary.metrics),
            error: None,
        },
        Err(e) => FileReport {
            file: outcome.file_name(),
            status: FileStatus::Error,
            variant: None,
            frames: None,
            trackable_frames: None,
            metrics: None,
            error: Some(FileError {
                code: e.code().to_string(),
                message: e.to_string(),
            }),
        },
    }
}
