//! Check command - gate captured photos before submission.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use selfie_gate_adapters::{
    model_path, set_models_dir, FsPhotoSource, SeetaFaceConfig, SeetaFaceDetector, FACE_MODEL,
};
use selfie_gate_core::{
    FaceDetector, GateConfig, GateThresholds, PhotoReport, PhotoSource, ProgressEvent,
    ProgressSink, QualityGate, ReportOutput,
};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Hardcoded defaults for values not set on the command line or in config.
mod defaults {
    pub const DECODE_TIMEOUT_MS: u64 = 5_000;
    pub const FACE_TIMEOUT_MS: u64 = 5_000;
}

/// Shared arguments for photo checks.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckArgs {
    /// Photo files or directories to check
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Disable face detection (resolution, lighting and blur only)
    #[arg(long)]
    pub no_face: bool,

    /// Deadline for decoding and pixel statistics, in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub decode_timeout_ms: Option<u64>,

    /// Deadline for face detection, in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub face_timeout_ms: Option<u64>,

    /// Long edge of the analysis thumbnail in pixels (0 analyses at full size)
    #[arg(long, value_name = "PX")]
    pub downscale: Option<u32>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl CheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    ///
    /// For boolean flags the CLI can only switch a behavior on; config
    /// applies when the flag wasn't passed.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        // CLI --no-face wins, then config, then default (enabled)
        if !args.no_face {
            if let Some(enabled) = config.face.enabled {
                args.no_face = !enabled;
            }
        }

        args.decode_timeout_ms = args.decode_timeout_ms.or(config.timeouts.decode_ms);
        args.face_timeout_ms = args.face_timeout_ms.or(config.timeouts.face_ms);
        args.downscale = args.downscale.or(config.gate.downscale);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        // Thresholds and detector tuning are read from here when building the gate
        args.config = Some(config.clone());

        args
    }

    /// Gate thresholds from config, falling back to built-in defaults.
    fn thresholds(&self) -> GateThresholds {
        let mut t = GateThresholds::default();
        let Some(gate) = self.config.as_ref().map(|c| &c.gate) else {
            return t;
        };
        t.min_short_side = gate.min_short_side.unwrap_or(t.min_short_side);
        t.min_face_area_ratio = gate.min_face_area_ratio.unwrap_or(t.min_face_area_ratio);
        t.max_face_area_ratio = gate.max_face_area_ratio.unwrap_or(t.max_face_area_ratio);
        t.max_yaw_degrees = gate.max_yaw_degrees.unwrap_or(t.max_yaw_degrees);
        t.max_roll_degrees = gate.max_roll_degrees.unwrap_or(t.max_roll_degrees);
        t.min_brightness = gate.min_brightness.unwrap_or(t.min_brightness);
        t.max_brightness = gate.max_brightness.unwrap_or(t.max_brightness);
        t.min_contrast = gate.min_contrast.unwrap_or(t.min_contrast);
        t.min_blur_variance = gate.min_blur_variance.unwrap_or(t.min_blur_variance);
        t
    }

    /// Detector tuning from config, falling back to built-in defaults.
    fn face_config(&self) -> SeetaFaceConfig {
        let mut face = SeetaFaceConfig::default();
        if let Some(config) = &self.config {
            face.min_face_size = config.face.min_face_size.unwrap_or(face.min_face_size);
            face.score_threshold = config.face.score_threshold.unwrap_or(face.score_threshold);
        }
        face
    }

    fn gate_config(&self) -> GateConfig {
        let base = GateConfig::default();
        GateConfig {
            thresholds: self.thresholds(),
            downscale_long_edge: self.downscale.unwrap_or(base.downscale_long_edge),
            decode_timeout: Some(Duration::from_millis(
                self.decode_timeout_ms.unwrap_or(defaults::DECODE_TIMEOUT_MS),
            )),
            face_timeout: Some(Duration::from_millis(
                self.face_timeout_ms.unwrap_or(defaults::FACE_TIMEOUT_MS),
            )),
        }
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }
}

/// Result of running the check command.
pub struct CheckResult {
    /// Number of photos checked.
    pub processed: usize,
    /// Number of photos skipped.
    pub skipped: usize,
    /// Number of photos rejected by the gate.
    pub rejected: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the check command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &CheckArgs) -> Result<CheckResult> {
    info!("Running check command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    if let Some(ref models_dir) = args.models_dir {
        debug!("Using custom models directory: {}", models_dir.display());
        set_models_dir(Some(models_dir.clone()));
    }

    let source = FsPhotoSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let output = match args.format() {
        OutputFormat::Jsonl => JsonOutput::stdout(),
        OutputFormat::Json => JsonOutput::stdout().into_array(args.pretty),
    };

    let mut gate = QualityGate::new(args.gate_config());
    if let Some(detector) = build_face_detector(args) {
        gate = gate.with_face_detector(detector);
    }

    let result = process_photos(&source, &gate, &output, &progress_bar)?;
    info!(
        "Checked {} photos: {} rejected, {} skipped",
        result.processed, result.rejected, result.skipped
    );
    Ok(result)
}

/// Loads the face detector unless disabled or its model is missing.
fn build_face_detector(args: &CheckArgs) -> Option<Arc<dyn FaceDetector>> {
    if args.no_face {
        debug!("Face detection disabled");
        return None;
    }

    let Some(path) = model_path(FACE_MODEL) else {
        info!("Face detection disabled: unknown model configuration.");
        return None;
    };
    if !path.exists() {
        info!(
            "Face detection disabled: {} not found. Run `selfie-gate models fetch`.",
            path.display()
        );
        return None;
    }

    match SeetaFaceDetector::from_model_file(&path, args.face_config()) {
        Ok(detector) => Some(Arc::new(detector)),
        Err(e) => {
            warn!("Face detection disabled: {e:#}");
            None
        }
    }
}

/// Evaluate every photo from the source and write a report for each.
fn process_photos(
    source: &dyn PhotoSource,
    gate: &QualityGate,
    output: &dyn ReportOutput,
    progress: &dyn ProgressSink,
) -> Result<CheckResult> {
    let total = source.count_hint();
    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut rejected = 0usize;

    for photo_result in source.photos() {
        let photo = match photo_result {
            Ok(photo) => photo,
            Err(e) => {
                debug!("Skipping {}: {:#}", e.path, e.error);
                progress.on_event(ProgressEvent::Skipped {
                    path: e.path,
                    reason: format!("{:#}", e.error),
                });
                skipped += 1;
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            path: photo.path.clone(),
            index: processed,
            total,
        });

        let result = gate.evaluate_photo(&photo);
        if !result.ok() {
            rejected += 1;
        }

        let report = PhotoReport::new(photo.path, iso_timestamp(), photo.dimensions, result);
        output.write(&report)?;

        progress.on_event(ProgressEvent::Completed { report });
        processed += 1;
    }

    output.flush()?;

    progress.on_event(ProgressEvent::Finished { processed, skipped });

    // An unreadable photo was not accepted either
    let exit_code = if rejected > 0 || skipped > 0 {
        ExitCode::Rejected
    } else {
        ExitCode::Success
    };

    Ok(CheckResult {
        processed,
        skipped,
        rejected,
        exit_code,
    })
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
