//! Synthetic photo builders for testing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use selfie_gate_core::domain::{CapturedPhoto, ImageRef};

/// Default synthetic photo size; matches the analysis thumbnail so pixel
/// statistics are computed on the exact pixels generated here.
pub const DEFAULT_SIZE: u32 = 192;

/// A generated test photo.
#[derive(Debug, Clone)]
pub struct SyntheticPhoto {
    /// Label used as the photo path in reports.
    pub path: String,
    /// Decoded pixels.
    pub image: DynamicImage,
}

impl SyntheticPhoto {
    fn new(label: &str, image: DynamicImage) -> Self {
        Self {
            path: format!("synthetic://{label}"),
            image,
        }
    }

    /// Encodes the photo as PNG.
    ///
    /// # Panics
    ///
    /// Panics if PNG encoding fails, which does not happen for in-memory buffers.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn png_bytes(&self) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, ImageFormat::Png)
            .expect("PNG encoding of synthetic image");
        buf.into_inner()
    }

    /// In-memory reference to the PNG-encoded photo.
    #[must_use]
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::from_bytes(self.png_bytes())
    }

    /// Wraps the photo as a capture with the given declared size.
    #[must_use]
    pub fn captured(&self, declared_width: u32, declared_height: u32) -> CapturedPhoto {
        CapturedPhoto::new(
            self.path.clone(),
            declared_width,
            declared_height,
            self.image_ref(),
        )
    }

    /// Saves the photo into `dir`, choosing the format from `name`'s extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
        let path = dir.join(name);
        self.image.save(&path)?;
        Ok(path)
    }
}

/// Builder for synthetic test photos with known statistics.
pub struct SyntheticPhotoBuilder;

impl SyntheticPhotoBuilder {
    // === Sharp Photos ===

    /// Mid-gray checkerboard (64/192, 8px cells).
    ///
    /// Brightness 128, contrast 64 and a high Laplacian variance: passes
    /// every pixel check.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> SyntheticPhoto {
        Self::checkerboard_with_levels(width, height, 8, 64, 192)
    }

    /// Checkerboard with custom cell size and levels.
    #[must_use]
    pub fn checkerboard_with_levels(
        width: u32,
        height: u32,
        cell_size: u32,
        low: u8,
        high: u8,
    ) -> SyntheticPhoto {
        let cell = cell_size.max(1);
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([high])
            } else {
                Luma([low])
            }
        });
        SyntheticPhoto::new("checkerboard", DynamicImage::ImageLuma8(img))
    }

    /// Sharp but dark checkerboard (20/70): low light only.
    #[must_use]
    pub fn dark_checkerboard(width: u32, height: u32) -> SyntheticPhoto {
        let mut photo = Self::checkerboard_with_levels(width, height, 8, 20, 70);
        photo.path = "synthetic://dark_checkerboard".into();
        photo
    }

    /// Sharp but bright checkerboard (200/250): overexposed only.
    #[must_use]
    pub fn bright_checkerboard(width: u32, height: u32) -> SyntheticPhoto {
        let mut photo = Self::checkerboard_with_levels(width, height, 8, 200, 250);
        photo.path = "synthetic://bright_checkerboard".into();
        photo
    }

    /// Sharp checkerboard with a narrow tonal range (120/136): low contrast only.
    #[must_use]
    pub fn flat_checkerboard(width: u32, height: u32) -> SyntheticPhoto {
        let mut photo = Self::checkerboard_with_levels(width, height, 8, 120, 136);
        photo.path = "synthetic://flat_checkerboard".into();
        photo
    }

    // === Blurry Photos ===

    /// Uniform gray (no edges at all).
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> SyntheticPhoto {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        SyntheticPhoto::new("uniform_gray", DynamicImage::ImageLuma8(img))
    }

    /// Smooth horizontal ramp 0-255: good exposure and contrast, but blurry.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> SyntheticPhoto {
        let img = GrayImage::from_fn(width, height, |x, _| {
            let val = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Luma([val])
        });
        SyntheticPhoto::new("horizontal_gradient", DynamicImage::ImageLuma8(img))
    }

    // === Exposure Extremes ===

    /// All-black frame.
    #[must_use]
    pub fn black(width: u32, height: u32) -> SyntheticPhoto {
        let mut photo = Self::uniform_gray(width, height, 0);
        photo.path = "synthetic://black".into();
        photo
    }

    /// All-white frame.
    #[must_use]
    pub fn white(width: u32, height: u32) -> SyntheticPhoto {
        let mut photo = Self::uniform_gray(width, height, 255);
        photo.path = "synthetic://white".into();
        photo
    }

    /// Uniform RGB color.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> SyntheticPhoto {
        let img = RgbImage::from_pixel(width, height, image::Rgb([r, g, b]));
        SyntheticPhoto::new("rgb_uniform", DynamicImage::ImageRgb8(img))
    }
}

/// Convenience constructors at the default size.
impl SyntheticPhotoBuilder {
    /// A photo that passes every pixel check.
    #[must_use]
    pub fn good_photo() -> SyntheticPhoto {
        Self::checkerboard(DEFAULT_SIZE, DEFAULT_SIZE)
    }

    /// A photo that is only blurry.
    #[must_use]
    pub fn blurry_photo() -> SyntheticPhoto {
        Self::horizontal_gradient(DEFAULT_SIZE, DEFAULT_SIZE)
    }

    /// A black frame: low light, low contrast and blurry.
    #[must_use]
    pub fn black_photo() -> SyntheticPhoto {
        Self::black(DEFAULT_SIZE, DEFAULT_SIZE)
    }
}
