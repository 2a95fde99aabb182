//! Configuration for shot-change detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SegmentError, SegmentResult};

/// Similarity method used to compare adjacent frames.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// HSV histogram correlation in `[-1, 1]`. Boundary when the
    /// correlation drops below the threshold. Robust to small motion.
    #[default]
    Histogram,

    /// Mean squared luma difference. Boundary when the error exceeds the
    /// threshold. Cheaper, more sensitive to noise and motion.
    Mse,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Mse => "mse",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "histogram" => Ok(Self::Histogram),
            "mse" => Ok(Self::Mse),
            other => Err(SegmentError::invalid_config(format!(
                "unknown detection method '{other}', expected 'histogram' or 'mse'"
            ))),
        }
    }
}

/// Histogram quantization per HSV channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistogramBins {
    pub hue: u32,
    pub saturation: u32,
    pub value: u32,
}

impl HistogramBins {
    pub const fn new(hue: u32, saturation: u32, value: u32) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Number of cells in the flattened 3-D histogram.
    pub fn total(&self) -> usize {
        self.hue as usize * self.saturation as usize * self.value as usize
    }
}

impl Default for HistogramBins {
    fn default() -> Self {
        Self::new(8, 8, 8)
    }
}

impl From<(u32, u32, u32)> for HistogramBins {
    fn from((hue, saturation, value): (u32, u32, u32)) -> Self {
        Self::new(hue, saturation, value)
    }
}

/// Detector configuration, fixed at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShotDetectorConfig {
    pub method: DetectionMethod,

    /// Histogram: boundary iff correlation < threshold (typically 0.0-1.0).
    /// MSE: boundary iff mean squared error > threshold.
    pub threshold: f64,

    /// Compare the first frame of a batch against the last frame of the
    /// previous batch. Forces batches of one stream to run in order.
    pub enable_cross_chunk: bool,

    pub hist_bins: HistogramBins,
}

impl Default for ShotDetectorConfig {
    fn default() -> Self {
        Self {
            method: DetectionMethod::Histogram,
            threshold: 0.7,
            enable_cross_chunk: false,
            hist_bins: HistogramBins::default(),
        }
    }
}

impl ShotDetectorConfig {
    /// Frame-at-a-time preset for live pipelines.
    ///
    /// Low threshold: catches every real cut and tolerates more false
    /// positives.
    pub fn live() -> Self {
        Self {
            threshold: 0.3,
            ..Default::default()
        }
    }

    /// Batch preset for multi-second chunk fusion.
    ///
    /// Higher threshold with cross-chunk continuity: fewer, higher
    /// confidence boundaries that stay consistent across chunk seams.
    pub fn fusion() -> Self {
        Self {
            threshold: 0.7,
            enable_cross_chunk: true,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: DetectionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_cross_chunk(mut self, enabled: bool) -> Self {
        self.enable_cross_chunk = enabled;
        self
    }

    pub fn with_bins(mut self, bins: impl Into<HistogramBins>) -> Self {
        self.hist_bins = bins.into();
        self
    }

    /// Check that the configuration can drive a detector.
    pub fn validate(&self) -> SegmentResult<()> {
        if !self.threshold.is_finite() {
            return Err(SegmentError::invalid_config(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if self.method == DetectionMethod::Mse && self.threshold < 0.0 {
            return Err(SegmentError::invalid_config(format!(
                "mse threshold must be non-negative, got {}",
                self.threshold
            )));
        }
        let HistogramBins {
            hue,
            saturation,
            value,
        } = self.hist_bins;
        if hue == 0 || saturation == 0 || value == 0 {
            return Err(SegmentError::invalid_config(format!(
                "histogram bins must be positive, got ({hue}, {saturation}, {value})"
            )));
        }
        if hue > 180 || saturation > 256 || value > 256 {
            return Err(SegmentError::invalid_config(format!(
                "histogram bins ({hue}, {saturation}, {value}) exceed channel ranges (180, 256, 256)"
            )));
        }
        Ok(())
    }
}
