//! Scene and topic records consumed by the chapter aligner.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A time-bounded visual unit grouping one or more shots.
///
/// Scenes are produced upstream and are read-only to the aligner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub id: u64,
    pub start_ms: u64,
    pub end_ms: u64,
    /// First frame covered by the scene (inclusive).
    pub start_frame_id: u64,
    /// Last frame covered by the scene (inclusive).
    pub end_frame_id: u64,
}

impl Scene {
    pub fn new(id: u64, start_ms: u64, end_ms: u64, start_frame_id: u64, end_frame_id: u64) -> Self {
        Self {
            id,
            start_ms,
            end_ms,
            start_frame_id,
            end_frame_id,
        }
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// True when the scene's time range intersects `[start_ms, end_ms]`.
    pub fn overlaps(&self, start_ms: u64, end_ms: u64) -> bool {
        self.start_ms <= end_ms && self.end_ms >= start_ms
    }
}

/// A time-bounded unit of audio/semantic content with a descriptive summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Topic {
    pub id: u64,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Summary of what the topic is about. Becomes the chapter text.
    #[serde(default)]
    pub reason: String,
}

impl Topic {
    pub fn new(id: u64, start_ms: u64, end_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            id,
            start_ms,
            end_ms,
            reason: reason.into(),
        }
    }
}
