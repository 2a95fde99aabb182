//! Temporal segmentation of decoded video.
//!
//! This crate provides:
//! - Shot-boundary detection over decoded frames (histogram correlation or
//!   MSE), frame-at-a-time or in chunks with continuity across chunk seams
//! - Grouping of boundary decisions into shots
//! - Chapter alignment of visual scenes with audio/semantic topics
//! - Composite preview rendering for chapters
//!
//! Everything here is synchronous and single-threaded per call. Detectors
//! own their state exclusively; use one instance per stream.

pub mod chapter;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod shot;

pub use chapter::{
    AlignerConfig, Alignment, ChapterAligner, CompositeImageBuilder, CompositeRequest,
    GridCompositeBuilder, GridLayout, NoComposites, UncoveredTopicPolicy,
};
pub use error::{SegmentError, SegmentResult};
pub use frame::{Frame, FrameCollection};
pub use shot::{
    group_shots, shots_as_scenes, DetectionMethod, DetectorState, HistogramBins,
    ShotChangeDetector, ShotDetectorConfig,
};
