//! Detector model downloading and caching adapter.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Download URL.
    pub url: &'static str,
    /// Expected SHA-256 of the file, when pinned.
    pub sha256: Option<&'static str>,
    /// Filename in models directory.
    pub filename: &'static str,
}

/// Name of the frontal face detection model.
pub const FACE_MODEL: &str = "seeta_fd_frontal";

/// Known models.
pub const MODELS: &[ModelInfo] = &[ModelInfo {
    name: FACE_MODEL,
    url: "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin",
    sha256: None,
    filename: "seeta_fd_frontal_v1.0.bin",
}];

/// Download progress callback: model name, bytes downloaded, total bytes if known.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

const CHUNK_SIZE: usize = 64 * 1024;

static MODELS_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Overrides the models directory for the rest of the process.
///
/// `None` restores the default location.
pub fn set_models_dir(dir: Option<PathBuf>) {
    *MODELS_DIR_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = dir;
}

/// Returns the models directory path.
///
/// Uses the override if set, else `XDG_DATA_HOME/selfie-gate/models` or
/// `~/.local/share/selfie-gate/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    let override_dir = MODELS_DIR_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    resolve_models_dir(override_dir)
}

fn resolve_models_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("selfie-gate")
            .join("models")
    })
}

/// Ensures all known models are downloaded, reporting download progress.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn ensure_models_with_progress(progress: Option<&ProgressCallback>) -> Result<()> {
    let dir = models_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create models directory: {}", dir.display()))?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(model, &path, progress)?;
        }
    }

    Ok(())
}

/// Downloads a model from its URL.
fn download_model(
    model: &ModelInfo,
    path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let total = response.content_length();
    let written = install_model(model, response, total, path, progress)?;

    info!("Downloaded {} ({written} bytes)", model.name);
    Ok(())
}

/// Streams model data into `path`, verifying the checksum when one is pinned.
///
/// Data goes to a `.part` file first so an interrupted download never
/// leaves a truncated model behind.
fn install_model(
    model: &ModelInfo,
    mut reader: impl Read,
    total: Option<u64>,
    path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<u64> {
    let partial = path.with_extension("part");
    let mut file = fs::File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0_u8; CHUNK_SIZE];
    let mut downloaded = 0_u64;

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", model.name))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(model.name, downloaded, total);
        }
    }
    file.flush()?;
    drop(file);

    let hash = format!("{:x}", hasher.finalize());
    match model.sha256 {
        Some(expected) if !expected.eq_ignore_ascii_case(&hash) => {
            let _ = fs::remove_file(&partial);
            anyhow::bail!(
                "Checksum mismatch for {}: expected {expected}, got {hash}",
                model.name
            );
        }
        Some(_) => debug!("Checksum verified for {}", model.name),
        None => debug!("No pinned checksum for {} (sha256 {hash})", model.name),
    }

    fs::rename(&partial, path)
        .with_context(|| format!("Failed to move model into {}", path.display()))?;
    Ok(downloaded)
}

/// Returns the path to a specific model file.
#[must_use]
pub fn model_path(name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| models_dir().join(m.filename))
}

/// Checks if all models are installed.
#[must_use]
pub fn all_models_installed() -> bool {
    let dir = models_dir();
    MODELS.iter().all(|m| dir.join(m.filename).exists())
}

/// Lists known models with their installed status.
#[must_use]
pub fn list_models() -> Vec<(String, bool)> {
    let dir = models_dir();
    MODELS
        .iter()
        .map(|m| (m.name.to_string(), dir.join(m.filename).exists()))
        .collect()
}
