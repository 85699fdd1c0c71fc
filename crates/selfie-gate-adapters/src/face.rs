//! SeetaFace detector backed by the `rustface` crate.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use image::GrayImage;
use selfie_gate_core::analysis::decode::downscale;
use selfie_gate_core::{
    DetectedFace, DetectorError, FaceBounds, FaceDetector, FaceObservation, ImageRef,
};
use tracing::{debug, info};

/// Smallest face size the SeetaFace cascade supports.
pub const MIN_FACE_SIZE_FLOOR: u32 = 20;

/// Tuning for the SeetaFace cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeetaFaceConfig {
    /// Smallest face side, in detection pixels. Values below
    /// [`MIN_FACE_SIZE_FLOOR`] are raised to it.
    pub min_face_size: u32,
    /// Minimum classifier score for a window to count as a face.
    pub score_threshold: f64,
    /// Long edge the photo is shrunk to before detection.
    pub max_long_edge: u32,
}

impl Default for SeetaFaceConfig {
    fn default() -> Self {
        Self {
            min_face_size: MIN_FACE_SIZE_FLOOR,
            score_threshold: 2.0,
            max_long_edge: 640,
        }
    }
}

/// Frontal face detector using a SeetaFace model file.
///
/// The frontal cascade does not estimate head pose, so every face is
/// reported without yaw or roll.
pub struct SeetaFaceDetector {
    model: rustface::Model,
    config: SeetaFaceConfig,
}

impl SeetaFaceDetector {
    /// Loads the model from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or is not a SeetaFace model.
    pub fn from_model_file(path: &Path, config: SeetaFaceConfig) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open face model: {}", path.display()))?;
        let detector = Self::from_reader(BufReader::new(file), config)
            .with_context(|| format!("Failed to load face model: {}", path.display()))?;
        info!("Loaded SeetaFace model from {}", path.display());
        Ok(detector)
    }

    /// Loads the model from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a SeetaFace model.
    pub fn from_reader(reader: impl Read, config: SeetaFaceConfig) -> Result<Self> {
        let model = rustface::read_model(reader).context("Invalid SeetaFace model data")?;
        Ok(Self { model, config })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn name(&self) -> &'static str {
        "seetaface"
    }

    fn detect(&self, image: &ImageRef) -> Result<FaceObservation, DetectorError> {
        let gray = grayscale_for_detection(image, self.config.max_long_edge)?;
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.config.min_face_size.max(MIN_FACE_SIZE_FLOOR));
        detector.set_score_thresh(self.config.score_threshold);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces: Vec<DetectedFace> = detector
            .detect(&rustface::ImageData::new(gray.as_raw(), width, height))
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                DetectedFace::new(
                    FaceBounds {
                        x: f64::from(bbox.x()),
                        y: f64::from(bbox.y()),
                        width: f64::from(bbox.width()),
                        height: f64::from(bbox.height()),
                    },
                    face.score(),
                )
            })
            .collect();

        debug!("SeetaFace found {} face(s) in {width}x{height}", faces.len());
        Ok(FaceObservation::new(faces).with_image_size(width, height))
    }
}

/// Decodes and shrinks a photo to the grayscale buffer the cascade scans.
fn grayscale_for_detection(
    image: &ImageRef,
    max_long_edge: u32,
) -> Result<GrayImage, DetectorError> {
    let bytes = image
        .read_bytes()
        .map_err(|e| DetectorError::Decode(format!("{e:#}")))?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| DetectorError::Decode(e.to_string()))?;
    Ok(downscale(decoded, max_long_edge).to_luma8())
}
