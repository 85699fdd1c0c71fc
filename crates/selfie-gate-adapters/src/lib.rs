//! Selfie Gate Adapters - External adapters for selfie-gate.
//!
//! This crate provides adapters for:
//! - Filesystem photo source
//! - SeetaFace face detection (feature `rustface`)
//! - Detector model downloading and caching

#[cfg(feature = "rustface")]
pub mod face;
pub mod fs;
pub mod models;

#[cfg(feature = "rustface")]
pub use face::{SeetaFaceConfig, SeetaFaceDetector, MIN_FACE_SIZE_FLOOR};
pub use fs::FsPhotoSource;
pub use models::{model_path, models_dir, set_models_dir, FACE_MODEL};
