//! Selfie Gate Core - Domain logic for the client-side photo quality gate
//!
//! Decides, locally and quickly, whether a captured selfie is good enough to
//! send to a remote face-analysis service, and if not, why. The gate combines
//! resolution, optional face geometry, and pixel statistics (brightness,
//! contrast, Laplacian blur) into a 0-100 score, an ordered issue list and a
//! single user-facing message.

pub mod analysis;
pub mod domain;
pub mod gate;
pub mod ports;

pub use analysis::{GateThresholds, PixelStats};
pub use domain::{
    CapturedPhoto, ImageDimensions, ImageRef, PhotoReport, QualityGateResult, QualityIssueCode,
    QualityMetrics, SubmissionMetadata,
};
pub use gate::{GateConfig, QualityGate};
pub use ports::{
    DetectedFace, DetectorError, FaceBounds, FaceDetector, FaceObservation, PhotoLoadError,
    PhotoSource, ProgressEvent, ProgressSink, ReportOutput,
};
