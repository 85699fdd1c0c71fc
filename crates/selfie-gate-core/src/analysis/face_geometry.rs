//! Face count, framing and head-angle checks.

use crate::domain::{ImageDimensions, QualityIssueCode};
use crate::ports::FaceObservation;

use super::GateThresholds;

/// Face signals and the issues they raise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceAssessment {
    /// Number of detected faces.
    pub face_count: u32,
    /// Face area divided by image area; zero unless exactly one face.
    pub face_area_ratio: f64,
    /// Yaw of the single face, if measured.
    pub yaw: Option<f64>,
    /// Roll of the single face, if measured.
    pub roll: Option<f64>,
    /// Face issues in precedence order.
    pub issues: Vec<QualityIssueCode>,
}

/// Evaluates a detector observation.
///
/// Framing and angle checks apply only when exactly one face was found.
/// The image area comes from the detector when it reports one, otherwise
/// from the declared capture size, and is never smaller than one pixel.
#[must_use]
pub fn assess_faces(
    observation: &FaceObservation,
    declared: ImageDimensions,
    thresholds: &GateThresholds,
) -> FaceAssessment {
    let face_count = u32::try_from(observation.faces.len()).unwrap_or(u32::MAX);

    let face = match observation.faces.as_slice() {
        [] => {
            return FaceAssessment {
                issues: vec![QualityIssueCode::NoFace],
                ..FaceAssessment::default()
            }
        }
        [face] => face,
        _ => {
            return FaceAssessment {
                face_count,
                issues: vec![QualityIssueCode::MultipleFaces],
                ..FaceAssessment::default()
            }
        }
    };

    let width = observation.image_width.unwrap_or(declared.width);
    let height = observation.image_height.unwrap_or(declared.height);
    let image_area = (f64::from(width) * f64::from(height)).max(1.0);
    let face_area_ratio = (face.bounds.area() / image_area).clamp(0.0, 1.0);

    let mut issues = Vec::new();
    if face_area_ratio < thresholds.min_face_area_ratio {
        issues.push(QualityIssueCode::FaceTooFar);
    } else if face_area_ratio > thresholds.max_face_area_ratio {
        issues.push(QualityIssueCode::FaceTooClose);
    }

    let yaw_off = face
        .yaw
        .is_some_and(|yaw| yaw.abs() > thresholds.max_yaw_degrees);
    let roll_off = face
        .roll
        .is_some_and(|roll| roll.abs() > thresholds.max_roll_degrees);
    if yaw_off || roll_off {
        issues.push(QualityIssueCode::HeadAngle);
    }

    FaceAssessment {
        face_count,
        face_area_ratio,
        yaw: face.yaw,
        roll: face.roll,
        issues,
    }
}
