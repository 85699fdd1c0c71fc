//! Issue taxonomy for the quality gate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message shown when a photo has no issues.
pub const GOOD_PHOTO_MESSAGE: &str = "Photo quality is good.";

/// A reason a captured photo may not be good enough to analyze.
///
/// Variants are declared in precedence order: resolution, face count and
/// geometry, lighting, contrast, blur. The gate always reports issues in
/// this order, and the user-facing message is taken from the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityIssueCode {
    /// Short side of the capture is below the minimum resolution.
    LowResolution,
    /// The detector found no face.
    NoFace,
    /// The detector found more than one face.
    MultipleFaces,
    /// The face occupies too little of the frame.
    FaceTooFar,
    /// The face occupies too much of the frame.
    FaceTooClose,
    /// Head is turned or tilted away from the camera.
    HeadAngle,
    /// Mean luminance is too low.
    LowLight,
    /// Mean luminance is too high.
    Overexposed,
    /// Luminance spread is too narrow.
    LowContrast,
    /// Laplacian variance is too low.
    Blurry,
}

impl QualityIssueCode {
    /// All codes, in precedence order.
    pub const ALL: [Self; 10] = [
        Self::LowResolution,
        Self::NoFace,
        Self::MultipleFaces,
        Self::FaceTooFar,
        Self::FaceTooClose,
        Self::HeadAngle,
        Self::LowLight,
        Self::Overexposed,
        Self::LowContrast,
        Self::Blurry,
    ];

    /// Points removed from the score when this issue is present.
    #[must_use]
    pub const fn deduction(self) -> u8 {
        match self {
            Self::NoFace => 35,
            Self::LowResolution | Self::MultipleFaces => 20,
            Self::Blurry => 18,
            Self::FaceTooFar => 16,
            Self::LowLight => 14,
            Self::FaceTooClose | Self::HeadAngle | Self::Overexposed => 10,
            Self::LowContrast => 9,
        }
    }

    /// User-facing sentence explaining how to fix this issue.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::LowResolution => "Photo resolution is too low. Move closer and try again.",
            Self::NoFace => "No clear face detected. Center your face and retry.",
            Self::MultipleFaces => "Multiple faces detected. Keep only one face in frame.",
            Self::FaceTooFar => "Face is too far. Move closer to the camera.",
            Self::FaceTooClose => "Face is too close. Move slightly back.",
            Self::HeadAngle => "Keep your head straight and look at the camera.",
            Self::LowLight => "Lighting is too dark. Move to a brighter area.",
            Self::Overexposed => "Lighting is too strong. Avoid direct bright light.",
            Self::LowContrast => "Image contrast is low. Improve lighting and retry.",
            Self::Blurry => "Image looks blurry. Hold steady and retake the photo.",
        }
    }

    /// Wire name of the code, e.g. `"LOW_LIGHT"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowResolution => "LOW_RESOLUTION",
            Self::NoFace => "NO_FACE",
            Self::MultipleFaces => "MULTIPLE_FACES",
            Self::FaceTooFar => "FACE_TOO_FAR",
            Self::FaceTooClose => "FACE_TOO_CLOSE",
            Self::HeadAngle => "HEAD_ANGLE",
            Self::LowLight => "LOW_LIGHT",
            Self::Overexposed => "OVEREXPOSED",
            Self::LowContrast => "LOW_CONTRAST",
            Self::Blurry => "BLURRY",
        }
    }
}

impl fmt::Display for QualityIssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects the message for an ordered issue list.
///
/// Only the first issue is considered; an empty list yields
/// [`GOOD_PHOTO_MESSAGE`].
#[must_use]
pub fn message_for(issues: &[QualityIssueCode]) -> &'static str {
    issues
        .first()
        .map_or(GOOD_PHOTO_MESSAGE, |issue| issue.message())
}
