//! Analysis stages of the quality gate.
//!
//! Decoding feeds pixel statistics; face geometry is independent of both.
//! Scoring combines whatever signals the stages produced.

pub mod decode;
mod face_geometry;
mod pixel_stats;
mod scoring;

pub use decode::{decode_downscaled, DEFAULT_LONG_EDGE};
pub use face_geometry::{assess_faces, FaceAssessment};
pub use pixel_stats::{laplacian_variance, luminance, mean_and_std_dev, PixelStats};
pub use scoring::{score_photo, GateSignals, GateThresholds};
