//! Configuration file support for selfie-gate.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/selfie-gate/config.toml` (lowest priority)
//! - Project-local: `.selfie-gate.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Gate thresholds and analysis size.
    pub gate: GateSection,
    /// Face detection settings.
    pub face: FaceConfig,
    /// Stage deadlines.
    pub timeouts: TimeoutsConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Gate thresholds. Unset values keep the built-in defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GateSection {
    /// Minimum short side in pixels.
    pub min_short_side: Option<u32>,
    /// Face area ratio below which the face is too far (0.0-1.0).
    pub min_face_area_ratio: Option<f64>,
    /// Face area ratio above which the face is too close (0.0-1.0).
    pub max_face_area_ratio: Option<f64>,
    /// Maximum absolute yaw in degrees.
    pub max_yaw_degrees: Option<f64>,
    /// Maximum absolute roll in degrees.
    pub max_roll_degrees: Option<f64>,
    /// Minimum mean luminance (0-255).
    pub min_brightness: Option<f64>,
    /// Maximum mean luminance (0-255).
    pub max_brightness: Option<f64>,
    /// Minimum luminance standard deviation.
    pub min_contrast: Option<f64>,
    /// Minimum Laplacian variance.
    pub min_blur_variance: Option<f64>,
    /// Long edge of the analysis thumbnail.
    pub downscale: Option<u32>,
}

/// Face detection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Enable/disable face detection.
    pub enabled: Option<bool>,
    /// Smallest face side in detection pixels (at least 20).
    pub min_face_size: Option<u32>,
    /// Detector score threshold.
    pub score_threshold: Option<f64>,
}

/// Stage deadline configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Decode and pixel statistics deadline in milliseconds.
    pub decode_ms: Option<u64>,
    /// Face detection deadline in milliseconds.
    pub face_ms: Option<u64>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/selfie-gate/config.toml`
    /// 2. Project-local: `.selfie-gate.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Unparseable files are skipped with a
    /// warning; if the merged values fail validation, all files are ignored.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}; ignoring configuration files");
            return Self::default();
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        let gate = &self.gate;

        for (name, value) in [
            ("gate.min_face_area_ratio", gate.min_face_area_ratio),
            ("gate.max_face_area_ratio", gate.max_face_area_ratio),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(format!("{name} must be 0.0-1.0, got {v}"));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (gate.min_face_area_ratio, gate.max_face_area_ratio) {
            if lo >= hi {
                return Err(format!(
                    "gate.min_face_area_ratio ({lo}) must be below gate.max_face_area_ratio ({hi})"
                ));
            }
        }

        for (name, value) in [
            ("gate.min_brightness", gate.min_brightness),
            ("gate.max_brightness", gate.max_brightness),
        ] {
            if let Some(v) = value {
                if !(0.0..=255.0).contains(&v) {
                    return Err(format!("{name} must be 0-255, got {v}"));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (gate.min_brightness, gate.max_brightness) {
            if lo >= hi {
                return Err(format!(
                    "gate.min_brightness ({lo}) must be below gate.max_brightness ({hi})"
                ));
            }
        }

        for (name, value) in [
            ("gate.max_yaw_degrees", gate.max_yaw_degrees),
            ("gate.max_roll_degrees", gate.max_roll_degrees),
        ] {
            if let Some(v) = value {
                if !(0.0..=180.0).contains(&v) {
                    return Err(format!("{name} must be 0-180, got {v}"));
                }
            }
        }

        for (name, value) in [
            ("gate.min_contrast", gate.min_contrast),
            ("gate.min_blur_variance", gate.min_blur_variance),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{name} must be a non-negative number, got {v}"));
                }
            }
        }

        if let Some(size) = self.face.min_face_size {
            if size < 20 {
                return Err(format!("face.min_face_size must be at least 20, got {size}"));
            }
        }

        for (name, value) in [
            ("timeouts.decode_ms", self.timeouts.decode_ms),
            ("timeouts.face_ms", self.timeouts.face_ms),
        ] {
            if value == Some(0) {
                return Err(format!("{name} must be greater than 0"));
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        // Gate
        let (gate, theirs) = (&mut self.gate, other.gate);
        gate.min_short_side = theirs.min_short_side.or(gate.min_short_side);
        gate.min_face_area_ratio = theirs.min_face_area_ratio.or(gate.min_face_area_ratio);
        gate.max_face_area_ratio = theirs.max_face_area_ratio.or(gate.max_face_area_ratio);
        gate.max_yaw_degrees = theirs.max_yaw_degrees.or(gate.max_yaw_degrees);
        gate.max_roll_degrees = theirs.max_roll_degrees.or(gate.max_roll_degrees);
        gate.min_brightness = theirs.min_brightness.or(gate.min_brightness);
        gate.max_brightness = theirs.max_brightness.or(gate.max_brightness);
        gate.min_contrast = theirs.min_contrast.or(gate.min_contrast);
        gate.min_blur_variance = theirs.min_blur_variance.or(gate.min_blur_variance);
        gate.downscale = theirs.downscale.or(gate.downscale);

        // Face
        self.face.enabled = other.face.enabled.or(self.face.enabled);
        self.face.min_face_size = other.face.min_face_size.or(self.face.min_face_size);
        self.face.score_threshold = other.face.score_threshold.or(self.face.score_threshold);

        // Timeouts
        self.timeouts.decode_ms = other.timeouts.decode_ms.or(self.timeouts.decode_ms);
        self.timeouts.face_ms = other.timeouts.face_ms.or(self.timeouts.face_ms);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("selfie-gate").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.selfie-gate.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".selfie-gate.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
