//! Face detection port.
//!
//! The gate treats face detection as an optional capability: a detector is
//! injected at construction, and any error it returns degrades the gate to
//! a resolution/lighting/blur-only check.

use thiserror::Error;

use crate::domain::ImageRef;

/// Axis-aligned face bounding box, in the detector's pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner.
    pub x: f64,
    /// Y coordinate of the top-left corner.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

impl FaceBounds {
    /// Box area; negative extents count as zero.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// A single detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    /// Bounding box.
    pub bounds: FaceBounds,
    /// Left/right head turn in degrees, if the detector estimates pose.
    pub yaw: Option<f64>,
    /// Head tilt in degrees, if the detector estimates pose.
    pub roll: Option<f64>,
    /// Detector-specific confidence score.
    pub confidence: f64,
}

impl DetectedFace {
    /// Creates a face with no pose estimate.
    #[must_use]
    pub const fn new(bounds: FaceBounds, confidence: f64) -> Self {
        Self {
            bounds,
            yaw: None,
            roll: None,
            confidence,
        }
    }

    /// Attaches a pose estimate.
    #[must_use]
    pub fn with_pose(mut self, yaw: Option<f64>, roll: Option<f64>) -> Self {
        self.yaw = yaw;
        self.roll = roll;
        self
    }
}

/// Everything a detector reports for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceObservation {
    /// Detected faces.
    pub faces: Vec<DetectedFace>,
    /// Width of the image the detector analysed, if it differs from the capture.
    pub image_width: Option<u32>,
    /// Height of the image the detector analysed.
    pub image_height: Option<u32>,
}

impl FaceObservation {
    /// Observation with the given faces and no analysed-size information.
    #[must_use]
    pub const fn new(faces: Vec<DetectedFace>) -> Self {
        Self {
            faces,
            image_width: None,
            image_height: None,
        }
    }

    /// Records the size of the image the detector analysed.
    #[must_use]
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }
}

/// Why a detector could not produce an observation.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The capability is not usable in this environment.
    #[error("face detection unavailable: {0}")]
    Unavailable(String),

    /// The image could not be decoded for detection.
    #[error("failed to decode image for face detection: {0}")]
    Decode(String),

    /// The detector itself failed.
    #[error("face detection failed: {0}")]
    Failed(String),
}

/// Port for face detection backends.
pub trait FaceDetector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Detects faces in the referenced image.
    ///
    /// # Errors
    ///
    /// Returns an error if detection cannot be performed. The gate never
    /// propagates it; the photo is scored without face signals instead.
    fn detect(&self, image: &ImageRef) -> Result<FaceObservation, DetectorError>;
}
