//! Metrics emitted by the engine.
//!
//! Recorded through the `metrics` facade; the host process decides which
//! recorder (if any) is installed.

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Shot detection
    pub const FRAMES_PROCESSED_TOTAL: &str = "tseg_frames_processed_total";
    pub const SHOT_BOUNDARIES_TOTAL: &str = "tseg_shot_boundaries_total";
    pub const DETECTION_SECONDS: &str = "tseg_detection_seconds";

    // Chapter alignment
    pub const CHAPTERS_EMITTED_TOTAL: &str = "tseg_chapters_emitted_total";
    pub const COMPOSITE_FAILURES_TOTAL: &str = "tseg_composite_failures_total";
}

/// Record a batch of classified frames.
pub fn record_detection(method: &'static str, frames: usize, boundaries: usize, elapsed: Duration) {
    let labels = [("method", method)];
    counter!(names::FRAMES_PROCESSED_TOTAL, &labels).increment(frames as u64);
    counter!(names::SHOT_BOUNDARIES_TOTAL, &labels).increment(boundaries as u64);
    histogram!(names::DETECTION_SECONDS, &labels).record(elapsed.as_secs_f64());
}

/// Record one emitted chapter.
pub fn record_chapter(kind: &'static str) {
    counter!(names::CHAPTERS_EMITTED_TOTAL, "kind" => kind).increment(1);
}

/// Record a composite build that failed for one chapter.
pub fn record_composite_failure() {
    counter!(names::COMPOSITE_FAILURES_TOTAL).increment(1);
}
