//! Gate result types.

use serde::{Deserialize, Serialize};

use super::{message_for, QualityIssueCode};

/// Raw signals measured while evaluating a photo.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Mean luminance of the downscaled buffer (0-255).
    pub brightness: f64,
    /// Population standard deviation of luminance.
    pub contrast: f64,
    /// Variance of the 4-neighbour Laplacian over interior pixels.
    pub blur_variance: f64,
    /// Number of faces reported by the detector.
    pub face_count: u32,
    /// Face bounding-box area divided by image area (0-1).
    pub face_area_ratio: f64,
    /// Head yaw in degrees, if measured.
    pub face_yaw: Option<f64>,
    /// Head roll in degrees, if measured.
    pub face_roll: Option<f64>,
    /// Shorter of the declared width and height.
    pub short_side: u32,
}

/// Outcome of evaluating one captured photo.
///
/// Built once by the gate and never modified; the score, acceptance flag
/// and message are all derived from the issue list at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityGateResult {
    ok: bool,
    score: u8,
    issues: Vec<QualityIssueCode>,
    message: &'static str,
    metrics: QualityMetrics,
    face_detection_available: bool,
}

impl QualityGateResult {
    /// Maximum (and starting) score.
    pub const MAX_SCORE: u8 = 100;

    /// Derives score, acceptance and message from an ordered issue list.
    ///
    /// `issues` must already be in precedence order without duplicates.
    #[must_use]
    pub fn new(
        issues: Vec<QualityIssueCode>,
        metrics: QualityMetrics,
        face_detection_available: bool,
    ) -> Self {
        debug_assert!(
            issues.windows(2).all(|w| w[0] < w[1]),
            "issues out of order: {issues:?}"
        );

        let deducted: u32 = issues.iter().map(|i| u32::from(i.deduction())).sum();
        let remaining = u32::from(Self::MAX_SCORE).saturating_sub(deducted);
        let score = u8::try_from(remaining).unwrap_or(Self::MAX_SCORE);

        let ok = matches!(issues.as_slice(), [] | [QualityIssueCode::LowContrast]);

        Self {
            ok,
            score,
            message: message_for(&issues),
            issues,
            metrics,
            face_detection_available,
        }
    }

    /// Whether the photo may be submitted for analysis.
    ///
    /// True when there are no issues, or when low contrast is the only one.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.ok
    }

    /// Quality score in `0..=100`.
    #[must_use]
    pub const fn score(&self) -> u8 {
        self.score
    }

    /// Detected issues in precedence order.
    #[must_use]
    pub fn issues(&self) -> &[QualityIssueCode] {
        &self.issues
    }

    /// Message for the highest-precedence issue, or a positive message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Measured signals.
    #[must_use]
    pub const fn metrics(&self) -> &QualityMetrics {
        &self.metrics
    }

    /// Whether face detection ran successfully for this photo.
    #[must_use]
    pub const fn face_detection_available(&self) -> bool {
        self.face_detection_available
    }

    /// Advisory metadata for the analysis-creation request.
    #[must_use]
    pub const fn submission_metadata(&self) -> SubmissionMetadata {
        SubmissionMetadata {
            quality_score: self.score,
            quality_metrics: self.metrics,
        }
    }

    /// Submission metadata, only for photos the gate accepted.
    #[must_use]
    pub const fn accepted_submission(&self) -> Option<SubmissionMetadata> {
        if self.ok {
            Some(self.submission_metadata())
        } else {
            None
        }
    }
}

/// Fields attached to the remote analysis request.
///
/// The remote service treats these as opaque metadata; the gate decision is
/// never enforced server-side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    /// Gate score (0-100).
    pub quality_score: u8,
    /// Signals the score was computed from.
    pub quality_metrics: QualityMetrics,
}

/// Result for one photo in a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoReport {
    /// Path or label of the photo.
    pub path: String,
    /// Timestamp of evaluation (RFC 3339).
    pub timestamp: String,
    /// Declared dimensions of the capture.
    pub dimensions: ImageDimensions,
    /// Gate outcome.
    pub result: QualityGateResult,
    /// Submission metadata, present only for accepted photos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionMetadata>,
}

impl PhotoReport {
    /// Builds a report, attaching submission metadata when the photo passed.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        timestamp: impl Into<String>,
        dimensions: ImageDimensions,
        result: QualityGateResult,
    ) -> Self {
        let submission = result.accepted_submission();
        Self {
            path: path.into(),
            timestamp: timestamp.into(),
            dimensions,
            result,
            submission,
        }
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Shorter of width and height.
    #[must_use]
    pub const fn short_side(self) -> u32 {
        if self.width < self.height {
            self.width
        } else {
            self.height
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use QualityIssueCode as Q;

    fn result_with(issues: Vec<QualityIssueCode>) -> QualityGateResult {
        QualityGateResult::new(issues, QualityMetrics::default(), true)
    }

    #[test]
    fn test_no_issues_is_ok_and_full_score() {
        let result = result_with(vec![]);
        assert!(result.ok());
        assert_eq!(result.score(), 100);
        assert_eq!(result.message(), "Photo quality is good.");
    }

    #[test]
    fn test_low_contrast_alone_is_tolerated() {
        let result = result_with(vec![Q::LowContrast]);
        assert!(result.ok());
        assert_eq!(result.score(), 91);
        assert_eq!(result.message(), Q::LowContrast.message());
    }

    #[test]
    fn test_other_single_issues_reject() {
        for code in Q::ALL.into_iter().filter(|c| *c != Q::LowContrast) {
            let result = result_with(vec![code]);
            assert!(!result.ok(), "{code} alone should reject");
        }
    }

    #[test]
    fn test_low_contrast_with_another_issue_rejects() {
        let result = result_with(vec![Q::LowContrast, Q::Blurry]);
        assert!(!result.ok());
        assert_eq!(result.score(), 100 - 9 - 18);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let result = result_with(vec![
            Q::LowResolution,
            Q::NoFace,
            Q::LowLight,
            Q::LowContrast,
            Q::Blurry,
        ]);
        // 20 + 35 + 14 + 9 + 18 = 96
        assert_eq!(result.score(), 4);

        let every_code = result_with(Q::ALL.to_vec());
        assert_eq!(every_code.score(), 0);
    }

    #[test]
    fn test_accepted_submission_only_when_ok() {
        let accepted = result_with(vec![]);
        let submission = accepted.accepted_submission().expect("accepted");
        assert_eq!(submission.quality_score, 100);

        let rejected = result_with(vec![Q::NoFace]);
        assert!(rejected.accepted_submission().is_none());
        assert_eq!(rejected.submission_metadata().quality_score, 65);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let metrics = QualityMetrics {
            brightness: 120.5,
            face_yaw: Some(3.0),
            short_side: 1080,
            ..QualityMetrics::default()
        };
        let result = QualityGateResult::new(vec![Q::Blurry], metrics, false);
        let json = serde_json::to_value(&result).expect("serialize");

        assert_eq!(json["ok"], false);
        assert_eq!(json["score"], 82);
        assert_eq!(json["issues"][0], "BLURRY");
        assert_eq!(json["faceDetectionAvailable"], false);
        assert_eq!(json["metrics"]["brightness"], 120.5);
        assert_eq!(json["metrics"]["blurVariance"], 0.0);
        assert_eq!(json["metrics"]["faceYaw"], 3.0);
        assert!(json["metrics"]["faceRoll"].is_null());
        assert_eq!(json["metrics"]["shortSide"], 1080);
    }

    #[test]
    fn test_submission_field_names() {
        let submission = result_with(vec![]).submission_metadata();
        let json = serde_json::to_value(submission).expect("serialize");
        assert_eq!(json["quality_score"], 100);
        assert!(json["quality_metrics"].is_object());
    }

    #[test]
    fn test_photo_report_omits_submission_when_rejected() {
        let report = PhotoReport::new(
            "selfie.jpg",
            "2024-01-01T00:00:00Z",
            ImageDimensions::new(1080, 1440),
            result_with(vec![Q::HeadAngle]),
        );
        let json = serde_json::to_value(&report).expect("serialize");
        assert!(json.get("submission").is_none());
        assert_eq!(json["dimensions"]["width"], 1080);
    }

    #[test]
    fn test_short_side() {
        assert_eq!(ImageDimensions::new(1080, 1920).short_side(), 1080);
        assert_eq!(ImageDimensions::new(640, 480).short_side(), 480);
        assert_eq!(ImageDimensions::new(0, 480).short_side(), 0);
    }
}
