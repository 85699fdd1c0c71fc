//! Issue detection and scoring.

use crate::domain::{QualityGateResult, QualityIssueCode, QualityMetrics};

use super::{FaceAssessment, PixelStats};

/// Detection thresholds.
///
/// All comparisons are strict: a value exactly at a threshold passes.
#[derive(Debug, Clone, PartialEq)]
pub struct GateThresholds {
    /// Captures with a shorter side below this are low resolution.
    pub min_short_side: u32,
    /// Face area ratios below this are too far.
    pub min_face_area_ratio: f64,
    /// Face area ratios above this are too close.
    pub max_face_area_ratio: f64,
    /// Maximum absolute yaw in degrees.
    pub max_yaw_degrees: f64,
    /// Maximum absolute roll in degrees.
    pub max_roll_degrees: f64,
    /// Mean luminance below this is too dark.
    pub min_brightness: f64,
    /// Mean luminance above this is overexposed.
    pub max_brightness: f64,
    /// Luminance standard deviation below this is low contrast.
    pub min_contrast: f64,
    /// Laplacian variance below this is blurry.
    pub min_blur_variance: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_short_side: 480,
            min_face_area_ratio: 0.09,
            max_face_area_ratio: 0.65,
            max_yaw_degrees: 25.0,
            max_roll_degrees: 20.0,
            min_brightness: 52.0,
            max_brightness: 210.0,
            min_contrast: 17.0,
            min_blur_variance: 70.0,
        }
    }
}

/// Signals gathered by the gate stages.
///
/// `faces` is `None` when no detector ran or detection failed; `pixels` is
/// `None` when the photo could not be decoded.
#[derive(Debug, Clone, Default)]
pub struct GateSignals {
    /// Shorter side of the declared capture size.
    pub short_side: u32,
    /// Face assessment, if detection succeeded.
    pub faces: Option<FaceAssessment>,
    /// Pixel statistics, if decoding succeeded.
    pub pixels: Option<PixelStats>,
}

/// Turns gate signals into a scored result.
///
/// Issues are appended in precedence order: resolution, faces, lighting,
/// contrast, blur. Stages that produced no signal add no issues, and their
/// metrics stay at zero.
#[must_use]
pub fn score_photo(signals: GateSignals, thresholds: &GateThresholds) -> QualityGateResult {
    let mut issues = Vec::new();
    let mut metrics = QualityMetrics {
        short_side: signals.short_side,
        ..QualityMetrics::default()
    };

    if signals.short_side > 0 && signals.short_side < thresholds.min_short_side {
        issues.push(QualityIssueCode::LowResolution);
    }

    let face_detection_available = signals.faces.is_some();
    if let Some(faces) = signals.faces {
        metrics.face_count = faces.face_count;
        metrics.face_area_ratio = faces.face_area_ratio;
        metrics.face_yaw = faces.yaw;
        metrics.face_roll = faces.roll;
        issues.extend(faces.issues);
    }

    if let Some(pixels) = signals.pixels {
        metrics.brightness = pixels.brightness;
        metrics.contrast = pixels.contrast;
        metrics.blur_variance = pixels.blur_variance;
        issues.extend(pixel_issues(&pixels, thresholds));
    }

    QualityGateResult::new(issues, metrics, face_detection_available)
}

fn pixel_issues(pixels: &PixelStats, thresholds: &GateThresholds) -> Vec<QualityIssueCode> {
    let mut issues = Vec::new();

    if pixels.brightness < thresholds.min_brightness {
        issues.push(QualityIssueCode::LowLight);
    } else if pixels.brightness > thresholds.max_brightness {
        issues.push(QualityIssueCode::Overexposed);
    }
    if pixels.contrast < thresholds.min_contrast {
        issues.push(QualityIssueCode::LowContrast);
    }
    if pixels.blur_variance < thresholds.min_blur_variance {
        issues.push(QualityIssueCode::Blurry);
    }

    issues
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use QualityIssueCode as Q;

    const GOOD_PIXELS: PixelStats = PixelStats {
        brightness: 128.0,
        contrast: 40.0,
        blur_variance: 300.0,
    };

    fn signals(short_side: u32, faces: Option<FaceAssessment>, pixels: Option<PixelStats>) -> GateSignals {
        GateSignals {
            short_side,
            faces,
            pixels,
        }
    }

    fn score(signals: GateSignals) -> QualityGateResult {
        score_photo(signals, &GateThresholds::default())
    }

    #[test]
    fn test_clean_photo() {
        let result = score(signals(1080, None, Some(GOOD_PIXELS)));
        assert!(result.ok());
        assert_eq!(result.score(), 100);
        assert!(result.issues().is_empty());
        assert!(!result.face_detection_available());
    }

    #[test]
    fn test_low_resolution() {
        let result = score(signals(200, None, Some(GOOD_PIXELS)));
        assert_eq!(result.issues(), [Q::LowResolution]);
        assert_eq!(result.score(), 80);
        assert!(!result.ok());
    }

    #[test]
    fn test_unknown_resolution_is_not_flagged() {
        let result = score(signals(0, None, Some(GOOD_PIXELS)));
        assert!(result.issues().is_empty());
    }

    #[test]
    fn test_resolution_boundary() {
        assert!(score(signals(480, None, None)).issues().is_empty());
        assert_eq!(score(signals(479, None, None)).issues(), [Q::LowResolution]);
    }

    #[test]
    fn test_lighting_is_exclusive() {
        let dark = PixelStats {
            brightness: 20.0,
            ..GOOD_PIXELS
        };
        assert_eq!(score(signals(1080, None, Some(dark))).issues(), [Q::LowLight]);

        let bright = PixelStats {
            brightness: 240.0,
            ..GOOD_PIXELS
        };
        assert_eq!(
            score(signals(1080, None, Some(bright))).issues(),
            [Q::Overexposed]
        );
    }

    #[test]
    fn test_pixel_boundaries_pass() {
        let edge = PixelStats {
            brightness: 52.0,
            contrast: 17.0,
            blur_variance: 70.0,
        };
        assert!(score(signals(1080, None, Some(edge))).issues().is_empty());

        let top = PixelStats {
            brightness: 210.0,
            ..GOOD_PIXELS
        };
        assert!(score(signals(1080, None, Some(top))).issues().is_empty());
    }

    #[test]
    fn test_low_contrast_alone_passes() {
        let flat = PixelStats {
            contrast: 5.0,
            ..GOOD_PIXELS
        };
        let result = score(signals(1080, None, Some(flat)));
        assert_eq!(result.issues(), [Q::LowContrast]);
        assert!(result.ok());
        assert_eq!(result.score(), 91);
    }

    #[test]
    fn test_black_frame() {
        let black = PixelStats::default();
        let result = score(signals(1080, None, Some(black)));
        assert_eq!(result.issues(), [Q::LowLight, Q::LowContrast, Q::Blurry]);
        assert!(!result.ok());
        assert_eq!(result.score(), 100 - 14 - 9 - 18);
        assert_eq!(result.message(), Q::LowLight.message());
    }

    #[test]
    fn test_decode_failure_adds_no_pixel_issues() {
        let result = score(signals(1080, None, None));
        assert!(result.ok());
        assert_eq!(result.metrics().brightness, 0.0);
        assert_eq!(result.metrics().blur_variance, 0.0);
    }

    #[test]
    fn test_face_issues_come_between_resolution_and_lighting() {
        let faces = FaceAssessment {
            face_count: 0,
            issues: vec![Q::NoFace],
            ..FaceAssessment::default()
        };
        let dark = PixelStats {
            brightness: 10.0,
            ..GOOD_PIXELS
        };
        let result = score(signals(300, Some(faces), Some(dark)));

        assert_eq!(result.issues(), [Q::LowResolution, Q::NoFace, Q::LowLight]);
        assert_eq!(result.message(), Q::LowResolution.message());
        assert_eq!(result.score(), 100 - 20 - 35 - 14);
        assert!(result.face_detection_available());
    }

    #[test]
    fn test_no_face_only() {
        let faces = FaceAssessment {
            issues: vec![Q::NoFace],
            ..FaceAssessment::default()
        };
        let result = score(signals(1080, Some(faces), Some(GOOD_PIXELS)));

        assert_eq!(result.issues(), [Q::NoFace]);
        assert_eq!(result.score(), 65);
        assert!(!result.ok());
        assert_eq!(
            result.message(),
            "No clear face detected. Center your face and retry."
        );
    }

    #[test]
    fn test_face_metrics_are_copied() {
        let faces = FaceAssessment {
            face_count: 1,
            face_area_ratio: 0.3,
            yaw: Some(4.0),
            roll: None,
            issues: vec![],
        };
        let result = score(signals(1080, Some(faces), Some(GOOD_PIXELS)));
        let metrics = result.metrics();

        assert_eq!(metrics.face_count, 1);
        assert_eq!(metrics.face_area_ratio, 0.3);
        assert_eq!(metrics.face_yaw, Some(4.0));
        assert_eq!(metrics.face_roll, None);
        assert_eq!(metrics.short_side, 1080);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = GateThresholds {
            min_blur_variance: 500.0,
            ..GateThresholds::default()
        };
        let result = score_photo(signals(1080, None, Some(GOOD_PIXELS)), &thresholds);
        assert_eq!(result.issues(), [Q::Blurry]);
    }
}
