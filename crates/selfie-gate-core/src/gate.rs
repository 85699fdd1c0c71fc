//! The quality gate evaluator.
//!
//! Decoding plus pixel statistics and face detection have no data
//! dependency on each other, so each runs on its own worker thread and the
//! results are joined before scoring. A stage that fails, panics or misses
//! its deadline contributes no signal; evaluation itself never fails.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::analysis::{
    assess_faces, decode_downscaled, score_photo, GateSignals, GateThresholds, PixelStats,
    DEFAULT_LONG_EDGE,
};
use crate::domain::{CapturedPhoto, ImageDimensions, ImageRef, QualityGateResult};
use crate::ports::{FaceDetector, FaceObservation};

/// Configuration for the quality gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Detection thresholds.
    pub thresholds: GateThresholds,
    /// Long edge of the analysis thumbnail. Zero analyses at full size.
    pub downscale_long_edge: u32,
    /// Deadline for decoding and pixel statistics. `None` waits indefinitely.
    pub decode_timeout: Option<Duration>,
    /// Deadline for face detection. `None` waits indefinitely.
    pub face_timeout: Option<Duration>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            thresholds: GateThresholds::default(),
            downscale_long_edge: DEFAULT_LONG_EDGE,
            decode_timeout: None,
            face_timeout: None,
        }
    }
}

impl GateConfig {
    /// Sets both stage deadlines.
    #[must_use]
    pub fn with_timeouts(mut self, decode: Option<Duration>, face: Option<Duration>) -> Self {
        self.decode_timeout = decode;
        self.face_timeout = face;
        self
    }
}

/// Decides whether a captured photo is good enough to analyze.
pub struct QualityGate {
    config: GateConfig,
    detector: Option<Arc<dyn FaceDetector>>,
}

impl QualityGate {
    /// Creates a gate without face detection.
    #[must_use]
    pub const fn new(config: GateConfig) -> Self {
        Self {
            config,
            detector: None,
        }
    }

    /// Adds a face detector.
    #[must_use]
    pub fn with_face_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Evaluates a photo with its declared capture size.
    ///
    /// A zero width or height means the size is unknown, which disables the
    /// resolution check.
    #[must_use]
    pub fn evaluate(
        &self,
        image: &ImageRef,
        declared_width: u32,
        declared_height: u32,
    ) -> QualityGateResult {
        let declared = ImageDimensions::new(declared_width, declared_height);

        let face_stage = self.detector.as_ref().map(|detector| {
            let detector = Arc::clone(detector);
            let image = image.clone();
            Stage::spawn("face", self.config.face_timeout, move || {
                debug!("Running face detector {}", detector.name());
                detector.detect(&image).map_err(anyhow::Error::from)
            })
        });

        let long_edge = self.config.downscale_long_edge;
        let pixel_stage = {
            let image = image.clone();
            Stage::spawn("pixels", self.config.decode_timeout, move || {
                let thumbnail = decode_downscaled(&image, long_edge)?;
                Ok(PixelStats::compute(&thumbnail))
            })
        };

        let pixels = pixel_stage.join();
        let faces = face_stage
            .and_then(Stage::join)
            .map(|observation: FaceObservation| {
                assess_faces(&observation, declared, &self.config.thresholds)
            });

        let result = score_photo(
            GateSignals {
                short_side: declared.short_side(),
                faces,
                pixels,
            },
            &self.config.thresholds,
        );

        debug!(
            "Gate result: ok={} score={} issues={:?}",
            result.ok(),
            result.score(),
            result.issues()
        );
        result
    }

    /// Evaluates a captured photo using its declared dimensions.
    #[must_use]
    pub fn evaluate_photo(&self, photo: &CapturedPhoto) -> QualityGateResult {
        self.evaluate(
            &photo.image,
            photo.dimensions.width,
            photo.dimensions.height,
        )
    }
}

/// A stage running on a worker thread.
///
/// The deadline is fixed at spawn time, so time spent joining other stages
/// counts against it.
struct Stage<T> {
    name: &'static str,
    deadline: Option<(Instant, Duration)>,
    receiver: Result<Receiver<Result<T>>>,
}

impl<T: Send + 'static> Stage<T> {
    fn spawn<F>(name: &'static str, timeout: Option<Duration>, work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let spawned = thread::Builder::new()
            .name(format!("selfie-gate-{name}"))
            .spawn(move || {
                // The receiver is gone if the stage already timed out.
                let _ = sender.send(work());
            });

        Self {
            name,
            // A deadline too far out to represent means no deadline.
            deadline: timeout
                .and_then(|limit| Instant::now().checked_add(limit).map(|at| (at, limit))),
            receiver: spawned
                .map(|_| receiver)
                .map_err(|e| anyhow!("failed to spawn worker: {e}")),
        }
    }

    /// Waits for the stage; any failure is logged and yields `None`.
    fn join(self) -> Option<T> {
        let outcome = self.receiver.and_then(|receiver| {
            let received = match self.deadline {
                Some((deadline, limit)) => receiver
                    .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    .map_err(|e| match e {
                        RecvTimeoutError::Timeout => anyhow!("timed out after {limit:?}"),
                        RecvTimeoutError::Disconnected => {
                            anyhow!("worker exited without a result")
                        }
                    }),
                None => receiver
                    .recv()
                    .map_err(|_| anyhow!("worker exited without a result")),
            };
            received.and_then(|result| result)
        });

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} stage unavailable: {e:#}", self.name);
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::float_cmp,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use crate::domain::QualityIssueCode;
    use crate::ports::{DetectedFace, DetectorError, FaceBounds};
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::time::Instant;

    struct FixedDetector(FaceObservation);

    impl FaceDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&self, _image: &ImageRef) -> Result<FaceObservation, DetectorError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn detect(&self, _image: &ImageRef) -> Result<FaceObservation, DetectorError> {
            Err(DetectorError::Failed("native module threw".into()))
        }
    }

    struct PanickingDetector;

    impl FaceDetector for PanickingDetector {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn detect(&self, _image: &ImageRef) -> Result<FaceObservation, DetectorError> {
            panic!("detector crashed");
        }
    }

    struct SlowDetector(Duration);

    impl FaceDetector for SlowDetector {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn detect(&self, _image: &ImageRef) -> Result<FaceObservation, DetectorError> {
            thread::sleep(self.0);
            Ok(FaceObservation::default())
        }
    }

    fn checkerboard_png() -> ImageRef {
        let img = GrayImage::from_fn(192, 192, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 192 } else { 64 }])
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).expect("encode");
        ImageRef::from_bytes(buf.into_inner())
    }

    /// A photo large enough that decoding takes a noticeable while.
    fn large_png(side: u32) -> ImageRef {
        let img = GrayImage::from_fn(side, side, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).expect("encode");
        ImageRef::from_bytes(buf.into_inner())
    }

    fn centered_face(side: f64) -> FaceObservation {
        FaceObservation::new(vec![DetectedFace::new(
            FaceBounds {
                x: 0.0,
                y: 0.0,
                width: side,
                height: side,
            },
            1.0,
        )])
    }

    #[test]
    fn test_sharp_photo_without_detector_passes() {
        let gate = QualityGate::new(GateConfig::default());
        let result = gate.evaluate(&checkerboard_png(), 1080, 1440);

        assert!(result.ok(), "{result:?}");
        assert_eq!(result.score(), 100);
        assert!(!result.face_detection_available());
        assert!((result.metrics().brightness - 128.0).abs() < 1e-6);
        assert_eq!(result.metrics().short_side, 1080);
    }

    #[test]
    fn test_well_framed_face_passes() {
        // 540x540 in 1080x1080 -> 0.25
        let gate = QualityGate::new(GateConfig::default())
            .with_face_detector(Arc::new(FixedDetector(centered_face(540.0))));
        let result = gate.evaluate(&checkerboard_png(), 1080, 1080);

        assert!(result.ok(), "{result:?}");
        assert!(result.face_detection_available());
        assert_eq!(result.metrics().face_count, 1);
        assert!((result.metrics().face_area_ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_no_face_rejects_with_canonical_message() {
        let gate = QualityGate::new(GateConfig::default())
            .with_face_detector(Arc::new(FixedDetector(FaceObservation::default())));
        let result = gate.evaluate(&checkerboard_png(), 1080, 1440);

        assert_eq!(result.issues(), [QualityIssueCode::NoFace]);
        assert_eq!(result.score(), 65);
        assert!(!result.ok());
        assert_eq!(result.message(), QualityIssueCode::NoFace.message());
    }

    #[test]
    fn test_detector_error_degrades() {
        let gate =
            QualityGate::new(GateConfig::default()).with_face_detector(Arc::new(BrokenDetector));
        let result = gate.evaluate(&checkerboard_png(), 1080, 1440);

        assert!(!result.face_detection_available());
        assert!(result.issues().is_empty());
        assert!(result.ok());
    }

    #[test]
    fn test_detector_panic_degrades() {
        let gate = QualityGate::new(GateConfig::default())
            .with_face_detector(Arc::new(PanickingDetector));
        let result = gate.evaluate(&checkerboard_png(), 1080, 1440);

        assert!(!result.face_detection_available());
        assert!(result.ok());
    }

    #[test]
    fn test_face_timeout_degrades() {
        let config = GateConfig::default().with_timeouts(None, Some(Duration::from_millis(20)));
        let gate = QualityGate::new(config)
            .with_face_detector(Arc::new(SlowDetector(Duration::from_secs(2))));

        let started = Instant::now();
        let result = gate.evaluate(&checkerboard_png(), 1080, 1440);

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!result.face_detection_available());
        assert!(result.ok());
    }

    #[test]
    fn test_face_deadline_ignores_slow_decode() {
        let config = GateConfig::default().with_timeouts(None, Some(Duration::from_millis(100)));
        let gate = QualityGate::new(config)
            .with_face_detector(Arc::new(SlowDetector(Duration::from_millis(300))));

        let result = gate.evaluate(&large_png(3000), 3000, 3000);

        // The detector overran its own deadline while decoding was still busy
        assert!(!result.face_detection_available());
        assert!(!result.issues().contains(&QualityIssueCode::NoFace));
    }

    #[test]
    fn test_stage_deadline_runs_from_spawn() {
        let stage = Stage::spawn("late", Some(Duration::from_millis(50)), || {
            thread::sleep(Duration::from_millis(200));
            Ok(())
        });
        thread::sleep(Duration::from_millis(120));

        let started = Instant::now();
        assert!(stage.join().is_none());
        assert!(started.elapsed() < Duration::from_millis(30));
    }

    #[test]
    fn test_stage_result_ready_before_join_is_kept() {
        let stage = Stage::spawn("quick", Some(Duration::from_millis(50)), || Ok(7));
        thread::sleep(Duration::from_millis(100));

        assert_eq!(stage.join(), Some(7));
    }

    #[test]
    fn test_stage_without_deadline_waits() {
        let stage = Stage::spawn("unbounded", None, || {
            thread::sleep(Duration::from_millis(30));
            Ok("done")
        });
        assert_eq!(stage.join(), Some("done"));
    }

    #[test]
    fn test_undecodable_photo_keeps_other_signals() {
        let gate = QualityGate::new(GateConfig::default())
            .with_face_detector(Arc::new(FixedDetector(FaceObservation::default())));
        let garbage = ImageRef::from_bytes(b"not an image".to_vec());
        let result = gate.evaluate(&garbage, 320, 240);

        assert_eq!(
            result.issues(),
            [QualityIssueCode::LowResolution, QualityIssueCode::NoFace]
        );
        assert_eq!(result.metrics().brightness, 0.0);
        assert_eq!(result.metrics().blur_variance, 0.0);
    }

    #[test]
    fn test_missing_file_never_fails() {
        let gate = QualityGate::new(GateConfig::default());
        let result = gate.evaluate(&ImageRef::from_path("/nonexistent/selfie.jpg"), 0, 0);

        assert!(result.ok());
        assert_eq!(result.score(), 100);
        assert_eq!(result.metrics().short_side, 0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let gate = QualityGate::new(GateConfig::default())
            .with_face_detector(Arc::new(FixedDetector(centered_face(100.0))));
        let image = checkerboard_png();

        let first = gate.evaluate(&image, 1080, 1440);
        let second = gate.evaluate(&image, 1080, 1440);
        assert_eq!(first, second);
    }

    #[test]
    fn test_evaluate_photo_uses_declared_size() {
        let gate = QualityGate::new(GateConfig::default());
        let photo = CapturedPhoto::new("selfie.png", 200, 300, checkerboard_png());
        let result = gate.evaluate_photo(&photo);

        assert_eq!(result.issues(), [QualityIssueCode::LowResolution]);
        assert_eq!(result.score(), 80);
    }
}
