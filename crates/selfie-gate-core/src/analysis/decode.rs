//! Decoding and downscaling of captured photos.
//!
//! Statistics are computed on a small thumbnail so their cost does not
//! depend on the capture resolution.

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::debug;

use crate::domain::ImageRef;

/// Default long edge of the analysis thumbnail, in pixels.
pub const DEFAULT_LONG_EDGE: u32 = 192;

/// Decodes an image and shrinks it for statistical analysis.
///
/// The result is 8-bit RGB with its long edge at most `long_edge`. Images
/// already within the limit are not resampled, and a `long_edge` of zero
/// disables downscaling.
///
/// # Errors
///
/// Returns an error if the image cannot be read or decoded.
pub fn decode_downscaled(image: &ImageRef, long_edge: u32) -> Result<RgbImage> {
    let bytes = image.read_bytes()?;
    let decoded = image::load_from_memory(&bytes).context("Failed to decode image")?;
    let (width, height) = decoded.dimensions();

    let thumbnail = downscale(decoded, long_edge);
    debug!(
        "Decoded {width}x{height}, analysing {}x{}",
        thumbnail.width(),
        thumbnail.height()
    );

    Ok(thumbnail.to_rgb8())
}

/// Shrinks an image so its long edge is at most `long_edge`, keeping aspect.
#[must_use]
pub fn downscale(image: DynamicImage, long_edge: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if long_edge == 0 || width.max(height) <= long_edge {
        return image;
    }
    image.thumbnail(long_edge, long_edge)
}
