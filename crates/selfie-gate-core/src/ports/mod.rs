//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the gate core and external adapters.

mod face_detector;
mod photo_source;
mod progress;
mod report_output;

pub use face_detector::{DetectedFace, DetectorError, FaceBounds, FaceDetector, FaceObservation};
pub use photo_source::{PhotoLoadError, PhotoSource};
pub use progress::{ProgressEvent, ProgressSink};
pub use report_output::ReportOutput;
