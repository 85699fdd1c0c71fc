//! Progress reporting port for UI integration.

use crate::domain::PhotoReport;

/// Events emitted during a batch run for progress tracking.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Evaluation started for a photo.
    Started {
        /// Path to the photo.
        path: String,
        /// Index among the photos evaluated so far (0-based); skipped
        /// photos are not counted.
        index: usize,
        /// Total photos in batch, including unreadable ones, if known.
        total: Option<usize>,
    },
    /// Evaluation completed for a photo.
    Completed {
        /// The photo report.
        report: PhotoReport,
    },
    /// A photo was skipped because it could not be loaded.
    Skipped {
        /// Path to the photo.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All photos have been processed.
    Finished {
        /// Photos evaluated.
        processed: usize,
        /// Photos skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
