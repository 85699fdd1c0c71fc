//! Pixel statistics: brightness, contrast and Laplacian blur estimate.
//!
//! Everything here is a pure function of the pixel buffer.

#![allow(clippy::cast_precision_loss)]

use image::{ImageBuffer, Pixel};

/// Broadcast luma weights (ITU-R BT.709).
const LUMA_R: f64 = 0.2126;
const LUMA_G: f64 = 0.7152;
const LUMA_B: f64 = 0.0722;

/// Brightness, contrast and blur statistics of a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelStats {
    /// Mean luminance (0-255).
    pub brightness: f64,
    /// Population standard deviation of luminance.
    pub contrast: f64,
    /// Variance of the 4-neighbour Laplacian over interior pixels.
    pub blur_variance: f64,
}

impl PixelStats {
    /// Computes statistics for an 8-bit image buffer.
    ///
    /// Any 8-bit pixel type is accepted; alpha is ignored. An empty buffer
    /// yields all zeros, and a buffer without interior pixels (narrower or
    /// shorter than 3) yields a zero blur variance.
    #[must_use]
    pub fn compute<P>(image: &ImageBuffer<P, Vec<u8>>) -> Self
    where
        P: Pixel<Subpixel = u8>,
    {
        let luma = luminance(image);
        let (width, height) = image.dimensions();
        let (brightness, contrast) = mean_and_std_dev(&luma);
        let blur_variance = laplacian_variance(&luma, width as usize, height as usize);

        Self {
            brightness,
            contrast,
            blur_variance,
        }
    }
}

/// Converts each pixel to luminance, in row-major order.
#[must_use]
pub fn luminance<P>(image: &ImageBuffer<P, Vec<u8>>) -> Vec<f64>
where
    P: Pixel<Subpixel = u8>,
{
    image
        .pixels()
        .map(|pixel| {
            let [r, g, b] = pixel.to_rgb().0;
            LUMA_R * f64::from(r) + LUMA_G * f64::from(g) + LUMA_B * f64::from(b)
        })
        .collect()
}

/// Arithmetic mean and population standard deviation.
#[must_use]
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(values);
    (mean, variance_around(values, mean).sqrt())
}

/// Variance of the discrete Laplacian `4·Y(x,y) − Y(x±1,y) − Y(x,y±1)`.
///
/// Only interior pixels are filtered; the one-pixel border is skipped.
/// Sharp edges produce large responses, so low variance indicates blur.
#[must_use]
pub fn laplacian_variance(luma: &[f64], width: usize, height: usize) -> f64 {
    if width < 3 || height < 3 || luma.len() < width * height {
        return 0.0;
    }

    let mut responses = Vec::with_capacity((width - 2) * (height - 2));
    for y in 1..height - 1 {
        let row = y * width;
        for x in 1..width - 1 {
            let idx = row + x;
            let response = 4.0 * luma[idx]
                - luma[idx - 1]
                - luma[idx + 1]
                - luma[idx - width]
                - luma[idx + width];
            responses.push(response);
        }
    }

    variance_around(&responses, mean(&responses))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance_around(values: &[f64], mean: f64) -> f64 {
    values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64
}
