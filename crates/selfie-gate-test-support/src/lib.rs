//! Test support utilities for selfie-gate.
//!
//! Provides mock ports and synthetic photos with known pixel statistics
//! for testing the quality gate.
//!
//! # Example
//!
//! ```
//! use selfie_gate_test_support::{MockFaceDetector, SyntheticPhotoBuilder};
//!
//! // A sharp, well-exposed capture at a typical phone resolution
//! let photo = SyntheticPhotoBuilder::good_photo().captured(1080, 1440);
//!
//! // A detector that always sees one well-framed face
//! let detector = MockFaceDetector::single_face(0.25);
//! # let _ = (photo, detector);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticPhoto, SyntheticPhotoBuilder, DEFAULT_SIZE};
pub use mocks::{
    face_with_ratio, MockFaceDetector, MockPhotoSource, MockProgressSink, MockReportOutput,
    MOCK_DETECTOR_SIZE,
};
