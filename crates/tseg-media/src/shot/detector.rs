//! Stateful shot-change detector.
//!
//! The detector classifies each frame against the previous one and keeps
//! exactly one descriptor between calls. It runs in two modes:
//!
//! - **single**: one frame per call, for live pipelines
//! - **batch**: a whole chunk per call, optionally continuing from the last
//!   frame of the previous chunk so a cut that lands on a chunk seam is
//!   still reported
//!
//! One instance serves one logical stream. Concurrent streams use separate
//! instances; there is no shared state between them.
//!
//! # Usage
//! ```rust
//! use std::time::Duration;
//! use tseg_media::frame::Frame;
//! use tseg_media::shot::ShotChangeDetector;
//!
//! let mut detector = ShotChangeDetector::live();
//! let frame = Frame::solid(0, Duration::ZERO, 64, 36, [20, 40, 60]).unwrap();
//! let (is_cut, _elapsed) = detector.detect_single(&frame, 0).unwrap();
//! assert!(!is_cut);
//! ```

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};
use tseg_models::ShotBoundaryDecision;

use super::config::{DetectionMethod, ShotDetectorConfig};
use super::descriptor::FrameDescriptor;
use crate::error::SegmentResult;
use crate::frame::Frame;
use crate::metrics;

/// What the detector remembers between calls.
#[derive(Debug, Clone, Default)]
pub enum DetectorState {
    /// Nothing observed since construction or the last reset. The next
    /// frame only primes the state and never reports a boundary.
    #[default]
    Uninitialized,

    /// A baseline is retained for the next comparison.
    Primed {
        descriptor: FrameDescriptor,
        /// Frames that advanced the retained baseline since priming.
        frame_counter: u64,
    },
}

impl DetectorState {
    pub fn is_primed(&self) -> bool {
        matches!(self, Self::Primed { .. })
    }

    pub fn frame_counter(&self) -> u64 {
        match self {
            Self::Uninitialized => 0,
            Self::Primed { frame_counter, .. } => *frame_counter,
        }
    }

    fn baseline(&self) -> Option<&FrameDescriptor> {
        match self {
            Self::Uninitialized => None,
            Self::Primed { descriptor, .. } => Some(descriptor),
        }
    }

    fn advance(&mut self, descriptor: FrameDescriptor, frames: u64) {
        let frame_counter = self.frame_counter() + frames;
        *self = Self::Primed {
            descriptor,
            frame_counter,
        };
    }
}

/// Shot boundary classifier over temporally adjacent frames.
#[derive(Debug)]
pub struct ShotChangeDetector {
    config: ShotDetectorConfig,
    state: DetectorState,
    /// Frames classified since construction or the last `reset`, in either
    /// mode. Unlike the state's counter this includes batches run without
    /// cross-chunk continuity.
    frames_seen: u64,
    /// Boundaries reported since construction. Not cleared by `reset`.
    boundaries_detected: u64,
}

impl ShotChangeDetector {
    /// Create a detector, rejecting configurations that cannot classify.
    pub fn new(config: ShotDetectorConfig) -> SegmentResult<Self> {
        config.validate()?;
        info!(
            method = config.method.as_str(),
            threshold = config.threshold,
            enable_cross_chunk = config.enable_cross_chunk,
            hist_bins = ?config.hist_bins,
            "Shot change detector configured"
        );
        Ok(Self {
            config,
            state: DetectorState::Uninitialized,
            frames_seen: 0,
            boundaries_detected: 0,
        })
    }

    /// Single-frame histogram detector at threshold 0.3.
    pub fn live() -> Self {
        Self::from_preset(ShotDetectorConfig::live())
    }

    /// Batch histogram detector at threshold 0.7 with cross-chunk continuity.
    pub fn fusion() -> Self {
        Self::from_preset(ShotDetectorConfig::fusion())
    }

    fn from_preset(config: ShotDetectorConfig) -> Self {
        Self {
            config,
            state: DetectorState::Uninitialized,
            frames_seen: 0,
            boundaries_detected: 0,
        }
    }

    /// Effective configuration snapshot.
    pub fn config(&self) -> ShotDetectorConfig {
        self.config
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// Frames observed since construction or the last `reset`.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn boundaries_detected(&self) -> u64 {
        self.boundaries_detected
    }

    /// Forget the retained baseline. The next frame behaves as the first
    /// frame ever seen. Call this before feeding an unrelated stream.
    pub fn reset(&mut self) {
        debug!(
            frames = self.state.frame_counter(),
            "Resetting shot change detector"
        );
        self.state = DetectorState::Uninitialized;
        self.frames_seen = 0;
    }

    /// Classify one frame against the previously observed frame.
    ///
    /// Returns whether a shot change occurred and how long classification
    /// took. The first frame after construction or `reset` never reports a
    /// change. On error the retained baseline is left untouched.
    pub fn detect_single(&mut self, frame: &Frame, frame_number: u64) -> SegmentResult<(bool, Duration)> {
        let started = Instant::now();
        let descriptor = FrameDescriptor::compute(frame, &self.config);

        let is_change = match self.state.baseline() {
            None => false,
            Some(previous) => self.is_boundary(previous, &descriptor, frame_number)?,
        };
        self.state.advance(descriptor, 1);
        self.frames_seen += 1;

        if is_change {
            self.boundaries_detected += 1;
        }
        let elapsed = started.elapsed();
        metrics::record_detection(self.method_label(), 1, usize::from(is_change), elapsed);
        Ok((is_change, elapsed))
    }

    /// [`detect_single`](Self::detect_single) keyed by the frame's own id.
    pub fn detect_frame(&mut self, frame: &Frame) -> SegmentResult<ShotBoundaryDecision> {
        let (is_boundary, detection_time) = self.detect_single(frame, frame.id())?;
        Ok(ShotBoundaryDecision {
            frame_id: frame.id(),
            is_boundary,
            detection_time,
        })
    }

    /// Classify a chunk of frames, one decision per frame in input order.
    ///
    /// With cross-chunk continuity enabled and a retained baseline, the
    /// first frame is compared against the previous chunk's last frame and
    /// this chunk's last frame becomes the new baseline. Otherwise the first
    /// decision is always `false` and the retained state is neither read nor
    /// written.
    pub fn detect_batch(&mut self, frames: &[Frame]) -> SegmentResult<Vec<bool>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();

        let config = self.config;
        let mut descriptors: Vec<FrameDescriptor> = frames
            .par_iter()
            .map(|frame| FrameDescriptor::compute(frame, &config))
            .collect();

        let mut decisions = Vec::with_capacity(frames.len());
        let seam = match self.state.baseline() {
            Some(previous) if self.config.enable_cross_chunk => {
                self.is_boundary(previous, &descriptors[0], frames[0].id())?
            }
            _ => false,
        };
        decisions.push(seam);

        for (pair, frame) in descriptors.windows(2).zip(&frames[1..]) {
            decisions.push(self.is_boundary(&pair[0], &pair[1], frame.id())?);
        }

        if self.config.enable_cross_chunk {
            if let Some(last) = descriptors.pop() {
                self.state.advance(last, frames.len() as u64);
            }
        }

        let boundaries = decisions.iter().filter(|&&b| b).count();
        self.frames_seen += frames.len() as u64;
        self.boundaries_detected += boundaries as u64;
        let elapsed = started.elapsed();
        metrics::record_detection(self.method_label(), frames.len(), boundaries, elapsed);
        debug!(
            frames = frames.len(),
            boundaries,
            seam_boundary = seam,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Batch shot detection complete"
        );

        Ok(decisions)
    }

    fn is_boundary(
        &self,
        previous: &FrameDescriptor,
        current: &FrameDescriptor,
        frame_number: u64,
    ) -> SegmentResult<bool> {
        let score = previous.score(current)?;
        let is_boundary = match self.config.method {
            DetectionMethod::Histogram => score < self.config.threshold,
            DetectionMethod::Mse => score > self.config.threshold,
        };
        if is_boundary {
            debug!(
                frame_number,
                frame_id = current.frame_id(),
                method = self.method_label(),
                score = format!("{:.4}", score),
                threshold = self.config.threshold,
                "Shot change detected"
            );
        }
        Ok(is_boundary)
    }

    fn method_label(&self) -> &'static str {
        self.config.method.as_str()
    }
}
