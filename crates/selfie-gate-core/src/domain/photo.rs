//! Captured photo references.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::ImageDimensions;

/// Reference to encoded image data.
///
/// Cloning is cheap, so a reference can be handed to several worker threads.
#[derive(Clone)]
pub enum ImageRef {
    /// Encoded image file on disk.
    Path(PathBuf),
    /// Encoded image bytes held in memory.
    Bytes(Arc<[u8]>),
}

impl ImageRef {
    /// Creates a reference to a file on disk.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    /// Creates a reference to an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Returns the encoded bytes, reading from disk for path references.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_bytes(&self) -> Result<Arc<[u8]>> {
        match self {
            Self::Path(path) => std::fs::read(path)
                .map(Arc::from)
                .with_context(|| format!("Failed to read image: {}", path.display())),
            Self::Bytes(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// A captured photo ready for evaluation.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// Path or label used in reports.
    pub path: String,
    /// Width and height declared by the capture source.
    pub dimensions: ImageDimensions,
    /// Encoded image data.
    pub image: ImageRef,
}

impl CapturedPhoto {
    /// Creates a new captured photo.
    #[must_use]
    pub fn new(path: impl Into<String>, width: u32, height: u32, image: ImageRef) -> Self {
        Self {
            path: path.into(),
            dimensions: ImageDimensions::new(width, height),
            image,
        }
    }
}
