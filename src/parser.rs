//! Track log parser
//!
//! Reads one tracker log, separating header lines from data lines. Header
//! lines feed the calibration scanner, data lines become [`Frame`] records.

use crate::calibration::Calibrator;
use crate::error::TrackError;
use crate::header::{is_header_line, HeaderValues};
use crate::types::{Frame, Position, StateCode, Track};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Token marking a coordinate the tracker failed to capture
pub const UNTRACKED_SENTINEL: &str = "0";

/// Minimum token count of a data line (index, timestamp, x, y, -, state)
const MIN_FRAME_TOKENS: usize = 6;

/// Parser for tracker log files
pub struct LogParser;

impl LogParser {
    /// Parse a track log from disk
    pub fn parse(path: &Path) -> Result<Track, TrackError> {
        let file = File::open(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::parse_reader(BufReader::new(file), &source).map_err(|e| match e {
            TrackError::Io { source, .. } => TrackError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a track log held in memory
    pub fn parse_str(content: &str, source: &str) -> Result<Track, TrackError> {
        Self::parse_reader(content.as_bytes(), source)
    }

    /// Parse a track log from any buffered reader.
    ///
    /// Lines are decoded lossily: header comments written in a legacy
    /// code page must not fail the file, and invalid bytes in a data line
    /// surface as `MalformedFrame` for that line.
    pub fn parse_reader<R: BufRead>(mut reader: R, source: &str) -> Result<Track, TrackError> {
        let mut header = HeaderValues::default();
        let mut frames = Vec::new();
        let mut buf = Vec::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source_err| TrackError::Io {
                    path: source.into(),
                    source: source_err,
                })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end_matches(|c| c == '\n' || c == '\r');

            if is_header_line(line) {
                header.scan_line(line);
            } else if !line.trim().is_empty() {
                frames.push(parse_frame(line, line_no)?);
            }
        }

        let params = Calibrator::calibrate(&header)?;

        debug!(
            "Parsed {}: {} frames, variant {}",
            source,
            frames.len(),
            params.variant.as_str()
        );

        Ok(Track {
            source: source.to_string(),
            frames,
            params,
        })
    }
}

/// Build a frame from one data line; `line` is 1-based for error reporting
fn parse_frame(line: &str, line_no: usize) -> Result<Frame, TrackError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let malformed = |reason: String| TrackError::MalformedFrame {
        line: line_no,
        reason,
    };

    if tokens.len() < MIN_FRAME_TOKENS {
        return Err(malformed(format!(
            "expected at least {} columns, found {}",
            MIN_FRAME_TOKENS,
            tokens.len()
        )));
    }

    let timestamp = tokens[1]
        .parse::<i64>()
        .map_err(|_| malformed(format!("invalid timestamp {:?}", tokens[1])))?;

    let position = if tokens[2] == UNTRACKED_SENTINEL || tokens[3] == UNTRACKED_SENTINEL {
        None
    } else {
        let coordinate = |token: &str| {
            token
                .parse::<f64>()
                .map_err(|_| malformed(format!("invalid coordinate {:?}", token)))
        };
        Some(Position::new(coordinate(tokens[2])?, coordinate(tokens[3])?))
    };

    let extra = std::iter::once(tokens[4])
        .chain(tokens[MIN_FRAME_TOKENS..].iter().copied())
        .map(str::to_string)
        .collect();

    Ok(Frame {
        index: tokens[0].to_string(),
        timestamp,
        position,
        state: StateCode::from_token(tokens[5]),
        extra,
    })
}
