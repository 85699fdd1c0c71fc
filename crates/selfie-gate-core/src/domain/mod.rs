//! Core domain types for the selfie quality gate.

mod issue;
mod photo;
mod result;

pub use issue::{message_for, QualityIssueCode, GOOD_PHOTO_MESSAGE};
pub use photo::{CapturedPhoto, ImageRef};
pub use result::{
    ImageDimensions, PhotoReport, QualityGateResult, QualityMetrics, SubmissionMetadata,
};
