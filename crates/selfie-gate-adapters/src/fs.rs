//! Filesystem adapter for enumerating captured photos.

use anyhow::{Context, Result};
use selfie_gate_core::{CapturedPhoto, ImageRef, PhotoLoadError, PhotoSource};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported image extensions.
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"];

/// Filesystem photo source adapter.
///
/// Only image headers are read while enumerating; pixels are decoded later
/// by the gate from the path reference.
pub struct FsPhotoSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsPhotoSource {
    /// Creates a new filesystem photo source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all photo files from the configured paths.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_photo(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && is_supported_photo(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl PhotoSource for FsPhotoSource {
    fn photos(
        &self,
    ) -> Box<dyn Iterator<Item = Result<CapturedPhoto, PhotoLoadError>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} photo files", files.len());

        Box::new(files.into_iter().map(|path| load_photo(&path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported photo extension.
fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.as_str()))
}

/// Reads the declared size from the photo header.
fn load_photo(path: &Path) -> Result<CapturedPhoto, PhotoLoadError> {
    let (width, height) = image::image_dimensions(path)
        .context("Failed to read image header")
        .map_err(|error| PhotoLoadError::new(path.to_string_lossy(), error))?;

    Ok(CapturedPhoto::new(
        path.to_string_lossy(),
        width,
        height,
        ImageRef::from_path(path),
    ))
}
