//! Shot-boundary detection.
//!
//! Classifies visual discontinuities between temporally adjacent frames
//! using either HSV histogram correlation or mean squared luma difference,
//! and groups the resulting decisions into shots.

pub mod config;
pub mod descriptor;
pub mod detector;
pub mod grouping;

pub use config::{DetectionMethod, HistogramBins, ShotDetectorConfig};
pub use descriptor::FrameDescriptor;
pub use detector::{DetectorState, ShotChangeDetector};
pub use grouping::{group_shots, shots_as_scenes};
