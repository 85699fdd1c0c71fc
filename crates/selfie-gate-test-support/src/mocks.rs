//! Mock implementations of core port traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use selfie_gate_core::domain::{CapturedPhoto, ImageRef, PhotoReport};
use selfie_gate_core::ports::{
    DetectedFace, DetectorError, FaceBounds, FaceDetector, FaceObservation, PhotoLoadError,
    PhotoSource, ProgressEvent, ProgressSink, ReportOutput,
};

/// Side of the square image a mock detector pretends to analyse.
pub const MOCK_DETECTOR_SIZE: u32 = 1000;

#[derive(Debug, Clone)]
enum Behavior {
    Observe(FaceObservation),
    Fail,
    Unavailable,
    Panic,
    Sleep(Duration, FaceObservation),
}

/// Mock implementation of `FaceDetector` for testing.
///
/// Returns a scripted observation or failure and counts calls.
#[derive(Debug)]
pub struct MockFaceDetector {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockFaceDetector {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always reports the given observation.
    #[must_use]
    pub fn returning(observation: FaceObservation) -> Self {
        Self::with_behavior(Behavior::Observe(observation))
    }

    /// Reports zero faces.
    #[must_use]
    pub fn no_faces() -> Self {
        Self::returning(
            FaceObservation::new(vec![]).with_image_size(MOCK_DETECTOR_SIZE, MOCK_DETECTOR_SIZE),
        )
    }

    /// Reports one frontal face covering `area_ratio` of the analysed image.
    #[must_use]
    pub fn single_face(area_ratio: f64) -> Self {
        Self::returning(observation_with_faces(&[face_with_ratio(area_ratio)]))
    }

    /// Reports one face with the given area ratio and pose.
    #[must_use]
    pub fn single_face_with_pose(area_ratio: f64, yaw: Option<f64>, roll: Option<f64>) -> Self {
        Self::returning(observation_with_faces(&[
            face_with_ratio(area_ratio).with_pose(yaw, roll)
        ]))
    }

    /// Reports `count` identical, well-framed faces.
    #[must_use]
    pub fn faces(count: usize) -> Self {
        let faces = vec![face_with_ratio(0.25); count];
        Self::returning(observation_with_faces(&faces))
    }

    /// Always fails with `DetectorError::Failed`.
    #[must_use]
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Always fails with `DetectorError::Unavailable`.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_behavior(Behavior::Unavailable)
    }

    /// Panics on every call.
    #[must_use]
    pub fn panicking() -> Self {
        Self::with_behavior(Behavior::Panic)
    }

    /// Sleeps for `delay`, then reports one well-framed face.
    #[must_use]
    pub fn slow(delay: Duration) -> Self {
        Self::with_behavior(Behavior::Sleep(
            delay,
            observation_with_faces(&[face_with_ratio(0.25)]),
        ))
    }

    /// Number of `detect` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Builds a centred square face whose area is `ratio` of the mock image.
#[must_use]
pub fn face_with_ratio(ratio: f64) -> DetectedFace {
    let size = f64::from(MOCK_DETECTOR_SIZE);
    let side = ratio.max(0.0).sqrt() * size;
    let offset = (size - side) / 2.0;
    DetectedFace::new(
        FaceBounds {
            x: offset,
            y: offset,
            width: side,
            height: side,
        },
        1.0,
    )
}

fn observation_with_faces(faces: &[DetectedFace]) -> FaceObservation {
    FaceObservation::new(faces.to_vec()).with_image_size(MOCK_DETECTOR_SIZE, MOCK_DETECTOR_SIZE)
}

impl FaceDetector for MockFaceDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    #[allow(clippy::panic)]
    fn detect(&self, _image: &ImageRef) -> Result<FaceObservation, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Observe(observation) => Ok(observation.clone()),
            Behavior::Fail => Err(DetectorError::Failed("mock failure".into())),
            Behavior::Unavailable => Err(DetectorError::Unavailable("mock unavailable".into())),
            Behavior::Panic => panic!("mock detector panicked"),
            Behavior::Sleep(delay, observation) => {
                std::thread::sleep(*delay);
                Ok(observation.clone())
            }
        }
    }
}

enum Entry {
    Photo(CapturedPhoto),
    Unreadable(String),
}

/// Mock implementation of `PhotoSource` for testing.
///
/// Yields pre-built photos and unreadable entries in insertion order, and
/// tracks iteration for assertions.
pub struct MockPhotoSource {
    entries: Vec<Entry>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockPhotoSource {
    /// Creates a new mock source with the given photos.
    #[must_use]
    pub fn new(photos: Vec<CapturedPhoto>) -> Self {
        Self {
            entries: photos.into_iter().map(Entry::Photo).collect(),
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Appends a photo.
    #[must_use]
    pub fn with_photo(mut self, photo: CapturedPhoto) -> Self {
        self.entries.push(Entry::Photo(photo));
        self
    }

    /// Appends an entry whose header cannot be read.
    #[must_use]
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.entries.push(Entry::Unreadable(path.to_string()));
        self
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PhotoSource for MockPhotoSource {
    fn photos(
        &self,
    ) -> Box<dyn Iterator<Item = Result<CapturedPhoto, PhotoLoadError>> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Box::new(self.entries.iter().map(|entry| match entry {
            Entry::Photo(photo) => Ok(photo.clone()),
            Entry::Unreadable(path) => Err(PhotoLoadError::new(
                path.clone(),
                anyhow::anyhow!("mock header unreadable"),
            )),
        }))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Mock implementation of `ReportOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockReportOutput {
    reports: Arc<Mutex<Vec<PhotoReport>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockReportOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn reports(&self) -> Vec<PhotoReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockReportOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportOutput for MockReportOutput {
    fn write(&self, report: &PhotoReport) -> anyhow::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn count(&self, pred: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.count(|e| matches!(e, ProgressEvent::Started { .. }))
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.count(|e| matches!(e, ProgressEvent::Completed { .. }))
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|e| matches!(e, ProgressEvent::Skipped { .. }))
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
