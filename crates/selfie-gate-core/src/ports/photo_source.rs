//! Photo source port for loading captured photos.

use thiserror::Error;

use crate::domain::CapturedPhoto;

/// A photo the source found but could not load.
#[derive(Debug, Error)]
#[error("{path}: {error:#}")]
pub struct PhotoLoadError {
    /// Display path of the photo.
    pub path: String,
    /// Why loading failed.
    pub error: anyhow::Error,
}

impl PhotoLoadError {
    /// Creates an error for the photo at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

/// Port for enumerating captured photos.
pub trait PhotoSource: Send + Sync {
    /// Returns an iterator over photos from this source.
    ///
    /// # Errors
    ///
    /// Individual items are errors if a photo's header cannot be read; the
    /// error keeps the photo's path.
    fn photos(
        &self,
    ) -> Box<dyn Iterator<Item = Result<CapturedPhoto, PhotoLoadError>> + Send + '_>;

    /// Returns the total number of photos, if known.
    fn count_hint(&self) -> Option<usize>;
}
