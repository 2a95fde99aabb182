//! Shot records and per-frame boundary decisions.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Boundary decision for one frame.
///
/// Consumed immediately by scene building; never persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotBoundaryDecision {
    pub frame_id: u64,
    pub is_boundary: bool,
    /// Wall-clock time spent classifying the frame.
    #[serde(with = "duration_millis")]
    #[schemars(with = "f64")]
    pub detection_time: Duration,
}

/// A maximal run of frames with no detected visual discontinuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    /// Zero-based position of the shot in its stream.
    pub index: usize,
    /// First frame of the shot (inclusive).
    pub start_frame_id: u64,
    /// Last frame of the shot (inclusive).
    pub end_frame_id: u64,
    /// Timestamp of the first frame.
    pub start_ms: u64,
    /// Timestamp of the last frame.
    pub end_ms: u64,
    /// Number of frames in the shot.
    pub frame_count: usize,
}

impl Shot {
    /// Duration of the shot in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Serializes a `Duration` as fractional milliseconds.
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "detection_time must be a non-negative number of milliseconds, got {millis}"
            )));
        }
        Ok(Duration::from_secs_f64(millis / 1000.0))
    }
}
