//! Krocan CLI - Command-line interface for the Krocan track evaluator
//!
//! Commands:
//! - analyze: Compute metrics for a batch of track logs (CSV or JSON)
//! - inspect: Show calibration and frame counts of one log
//! - trajectory: Export the trackable path of one log for plotting
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use krocan::config::AnalyzerConfig;
use krocan::encoder::ReportEncoder;
use krocan::pipeline::{collect_track_files, TrackProcessor};
use krocan::trajectory::Trajectory;
use krocan::types::DistanceMode;
use krocan::{LogParser, TrackError, KROCAN_VERSION, PRODUCER_NAME};

/// Krocan - behavioral metrics from arena tracking logs
#[derive(Parser)]
#[command(name = "krocan")]
#[command(version = KROCAN_VERSION)]
#[command(about = "Compute place-avoidance metrics from tracker logs", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for track logs (files or directories of .dat files)
    Analyze {
        /// Track files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,

        /// Analyzer configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force a distance mode instead of the per-variant default
        #[arg(long)]
        distance_mode: Option<DistanceModeArg>,

        /// Subsampling stride for calibrated distance
        #[arg(long)]
        stride: Option<usize>,
    },

    /// Show calibration and frame counts of one track log
    Inspect {
        /// Track file
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the trackable path of one log as JSON
    Trajectory {
        /// Track file
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Fail when the log has no reinforced sector to overlay
        #[arg(long)]
        require_sector: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check analyzer configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// CSV table, one row per track
    Csv,
    /// JSON batch report
    Json,
    /// Pretty-printed JSON batch report
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum DistanceModeArg {
    /// Subsampled Euclidean path in centimeters
    Calibrated,
    /// X deltas of every frame pair, raw units
    LegacyXDelta,
}

impl From<DistanceModeArg> for DistanceMode {
    fn from(arg: DistanceModeArg) -> Self {
        match arg {
            DistanceModeArg::Calibrated => DistanceMode::Calibrated,
            DistanceModeArg::LegacyXDelta => DistanceMode::LegacyXDelta,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: Cli) -> Result<(), KrocanCliError> {
    match cli.command {
        Commands::Analyze {
            inputs,
            output,
            format,
            config,
            distance_mode,
            stride,
        } => cmd_analyze(
            &inputs,
            &output,
            format,
            config.as_deref(),
            distance_mode,
            stride,
        ),

        Commands::Inspect { input, json } => cmd_inspect(&input, json),

        Commands::Trajectory {
            input,
            output,
            require_sector,
        } => cmd_trajectory(&input, &output, require_sector),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn load_config(
    path: Option<&Path>,
    distance_mode: Option<DistanceModeArg>,
    stride: Option<usize>,
) -> Result<AnalyzerConfig, KrocanCliError> {
    let mut config = match path {
        Some(path) => AnalyzerConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalyzerConfig::default(),
    };

    if let Some(mode) = distance_mode {
        config.distance_mode = Some(mode.into());
    }
    if let Some(stride) = stride {
        config.sample_stride = stride;
    }

    config.validate()?;
    Ok(config)
}

fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, KrocanCliError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = collect_track_files(input)?;
            debug!("Found {} track files in {}", found.len(), input.display());
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn cmd_analyze(
    inputs: &[PathBuf],
    output: &Path,
    format: OutputFormat,
    config_path: Option<&Path>,
    distance_mode: Option<DistanceModeArg>,
    stride: Option<usize>,
) -> Result<(), KrocanCliError> {
    let config = load_config(config_path, distance_mode, stride)?;
    let files = expand_inputs(inputs)?;

    if files.is_empty() {
        return Err(KrocanCliError::NoTracks);
    }

    let processor = TrackProcessor::new(config)?;
    let outcomes = processor.process_batch(&files);
    let encoder = ReportEncoder::new();

    let data = match format {
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            encoder.write_csv(&mut buffer, &outcomes)?;
            buffer
        }
        OutputFormat::Json => encoder
            .encode_batch_to_json(&outcomes, processor.config(), false)?
            .into_bytes(),
        OutputFormat::JsonPretty => encoder
            .encode_batch_to_json(&outcomes, processor.config(), true)?
            .into_bytes(),
    };

    write_output(output, &data)?;

    // Per-file failures were already logged by the processor
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(KrocanCliError::TracksFailed {
            failed,
            total: outcomes.len(),
        })
    }
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), KrocanCliError> {
    let track = LogParser::parse(input)?;
    let trackable = track.trackable_frames().len();

    let report = InspectReport {
        source: track.source.clone(),
        variant: track.params.variant.as_str().to_string(),
        frames: track.frames.len(),
        trackable_frames: trackable,
        first_timestamp: track.frames.first().map(|f| f.timestamp),
        last_timestamp: track.frames.last().map(|f| f.timestamp),
        params: track.params.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let p = &report.params;
        println!("Track Inspection");
        println!("================");
        println!("Source:           {}", report.source);
        println!("Variant:          {}", report.variant);
        println!("Frames:           {}", report.frames);
        println!("Trackable frames: {}", report.trackable_frames);
        println!("Arena center:     ({}, {})", p.arena_x, p.arena_y);
        println!("Diameter:         {} (raw {})", p.diameter, p.raw_diameter);
        println!("Pixels per cm:    {}", format_optional(p.pix_per_cm));
        println!("Sector radius:    {}", format_optional(p.shock_radius));
        if let (Some(first), Some(last)) = (report.first_timestamp, report.last_timestamp) {
            println!("Timestamps:       {} .. {}", first, last);
        }
    }

    Ok(())
}

fn cmd_trajectory(input: &Path, output: &Path, require_sector: bool) -> Result<(), KrocanCliError> {
    let track = LogParser::parse(input)?;
    let trajectory = Trajectory::from_track(&track);

    if require_sector {
        trajectory.require_shock_radius()?;
    }
    if trajectory.points.is_empty() {
        return Err(TrackError::EmptyTrack.into());
    }

    write_output(output, trajectory.to_json()?.as_bytes())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), KrocanCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "krocan_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Krocan version {}", KROCAN_VERSION),
    });

    // Check configuration file if provided
    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Configuration file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match AnalyzerConfig::from_json(&content) {
                    Ok(parsed) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Configuration valid (stride {}, distance mode {})",
                            parsed.sample_stride,
                            parsed
                                .distance_mode
                                .map(|m| format!("{:?}", m))
                                .unwrap_or_else(|| "per variant".to_string())
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid configuration: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read configuration file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    // Check where stdout goes
    let stdout_check = if atty::is(atty::Stream::Stdout) {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Warning,
            message: "stdout is a TTY; pass --output to write reports to a file".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is redirected".to_string(),
        }
    };
    checks.push(stdout_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: KROCAN_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Krocan Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(KrocanCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn write_output(output: &Path, data: &[u8]) -> Result<(), KrocanCliError> {
    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        stdout.write_all(data)?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_optional(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Debug)]
enum KrocanCliError {
    Io(io::Error),
    Track(TrackError),
    Json(serde_json::Error),
    NoTracks,
    TracksFailed { failed: usize, total: usize },
    DoctorFailed,
}

impl From<io::Error> for KrocanCliError {
    fn from(e: io::Error) -> Self {
        KrocanCliError::Io(e)
    }
}

impl From<TrackError> for KrocanCliError {
    fn from(e: TrackError) -> Self {
        KrocanCliError::Track(e)
    }
}

impl From<serde_json::Error> for KrocanCliError {
    fn from(e: serde_json::Error) -> Self {
        KrocanCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<KrocanCliError> for CliError {
    fn from(e: KrocanCliError) -> Self {
        match e {
            KrocanCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            KrocanCliError::Track(e) => {
                let hint = match &e {
                    TrackError::MissingCalibration(_) => {
                        "Check the ArenaCenterXY / ArenaDiameter_m header lines"
                    }
                    TrackError::MalformedFrame { .. } => "The capture may be truncated or corrupt",
                    TrackError::InvalidConfig(_) => "Run 'krocan doctor --config <file>'",
                    _ => "Check the track file",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            KrocanCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            KrocanCliError::NoTracks => CliError {
                code: "NO_TRACKS".to_string(),
                message: "No track files found in input".to_string(),
                hint: Some("Directories are scanned for *.dat files".to_string()),
            },
            KrocanCliError::TracksFailed { failed, total } => CliError {
                code: "TRACKS_FAILED".to_string(),
                message: format!("{} of {} track files failed", failed, total),
                hint: Some("Failed files are logged on stderr; other results were written".to_string()),
            },
            KrocanCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct InspectReport {
    source: String,
    variant: String,
    frames: usize,
    trackable_frames: usize,
    first_timestamp: Option<i64>,
    last_timestamp: Option<i64>,
    params: krocan::CalibrationParams,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
