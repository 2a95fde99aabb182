//! Per-frame descriptors and the similarity measures between them.
//!
//! A descriptor is what the detector retains between calls: the HSV
//! histogram for the histogram method, the luma plane for MSE. Both remember
//! the frame shape they came from so mismatched frames are rejected instead
//! of compared.

use ndarray::Axis;

use super::config::{DetectionMethod, HistogramBins, ShotDetectorConfig};
use crate::error::{SegmentError, SegmentResult};
use crate::frame::Frame;

/// Summary of one frame, retained as the comparison baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDescriptor {
    frame_id: u64,
    shape: (usize, usize, usize),
    signature: Signature,
}

#[derive(Debug, Clone, PartialEq)]
enum Signature {
    /// Flattened `hue x saturation x value` pixel counts.
    Histogram(Vec<f64>),
    /// Row-major luma plane.
    Luma(Vec<f64>),
}

impl FrameDescriptor {
    /// Compute the descriptor the configured method compares.
    pub fn compute(frame: &Frame, config: &ShotDetectorConfig) -> Self {
        let signature = match config.method {
            DetectionMethod::Histogram => Signature::Histogram(hsv_histogram(frame, config.hist_bins)),
            DetectionMethod::Mse => Signature::Luma(luma_plane(frame)),
        };
        Self {
            frame_id: frame.id(),
            shape: frame.shape(),
            signature,
        }
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// `(height, width, channels)` of the source frame.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    /// Score `current` against `self` as the previous frame.
    ///
    /// Histogram descriptors yield a correlation in `[-1, 1]`, luma
    /// descriptors a mean squared error.
    pub fn score(&self, current: &FrameDescriptor) -> SegmentResult<f64> {
        if self.shape != current.shape {
            return Err(SegmentError::ShapeMismatch {
                frame_id: current.frame_id,
                expected: self.shape,
                actual: current.shape,
            });
        }
        match (&self.signature, &current.signature) {
            (Signature::Histogram(prev), Signature::Histogram(cur)) => {
                Ok(histogram_correlation(prev, cur))
            }
            (Signature::Luma(prev), Signature::Luma(cur)) => Ok(mean_squared_error(prev, cur)),
            _ => Err(SegmentError::invalid_input(format!(
                "frame {} was described with a different method than frame {}",
                current.frame_id, self.frame_id
            ))),
        }
    }
}

/// Convert RGB to HSV using 8-bit ranges: H in [0, 180), S and V in [0, 255].
///
/// Each channel is rounded to an integer before binning, the same as an
/// 8-bit HSV image would store it.
fn rgb_to_hsv8(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    // Hue 179.5 and above rounds to 180, which wraps to 0.
    let h = (h / 2.0).round() as u32 % 180;
    (h as u8, s.round() as u8, v as u8)
}

fn quantize(value: u8, range: u32, bins: u32) -> usize {
    let bin = (value as u32 * bins / range) as usize;
    bin.min(bins as usize - 1)
}

/// 3-D HSV histogram of a frame, flattened hue-major.
fn hsv_histogram(frame: &Frame, bins: HistogramBins) -> Vec<f64> {
    let mut histogram = vec![0.0; bins.total()];
    let (s_bins, v_bins) = (bins.saturation as usize, bins.value as usize);

    for px in frame.pixels().lanes(Axis(2)) {
        let (h, s, v) = if px.len() == 1 {
            (0, 0, px[0])
        } else {
            rgb_to_hsv8(px[0], px[1], px[2])
        };
        let h_bin = quantize(h, 180, bins.hue);
        let s_bin = quantize(s, 256, bins.saturation);
        let v_bin = quantize(v, 256, bins.value);
        histogram[(h_bin * s_bins + s_bin) * v_bins + v_bin] += 1.0;
    }

    histogram
}

/// Pearson correlation between two histograms.
///
/// Returns 1.0 when either histogram is flat, matching OpenCV's
/// `HISTCMP_CORREL`.
fn histogram_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut s12, mut s11, mut s22) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        s12 += dx * dy;
        s11 += dx * dx;
        s22 += dy * dy;
    }

    let denom = s11 * s22;
    if denom.abs() > f64::EPSILON {
        s12 / denom.sqrt()
    } else {
        1.0
    }
}

/// BT.601 luma, the weighting used for greyscale conversion of BGR/RGB video.
fn luma_plane(frame: &Frame) -> Vec<f64> {
    frame
        .pixels()
        .lanes(Axis(2))
        .into_iter()
        .map(|px| {
            if px.len() == 1 {
                px[0] as f64
            } else {
                0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64
            }
        })
        .collect()
}

fn mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    sum / a.len() as f64
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn solid(id: u64, rgb: [u8; 3]) -> Frame {
        Frame::solid(id, Duration::from_millis(id * 40), 16, 12, rgb).unwrap()
    }

    fn gradient(id: u64) -> Frame {
        let pixels = ndarray::Array3::from_shape_fn((12, 16, 3), |(y, x, c)| {
            ((x * 16 + y * 5 + c * 70) % 256) as u8
        });
        Frame::new(id, Duration::ZERO, pixels).unwrap()
    }

    #[test]
    fn test_rgb_to_hsv8_primaries() {
        assert_eq!(rgb_to_hsv8(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv8(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv8(0, 0, 255), (120, 255, 255));
        assert_eq!(rgb_to_hsv8(128, 128, 128), (0, 0, 128));
    }

    #[test]
    fn test_rgb_to_hsv8_rounds_channels() {
        // S = 255 * 31 / 250 = 31.62 and 255 * 29 / 250 = 29.58
        assert_eq!(rgb_to_hsv8(250, 219, 219), (0, 32, 250));
        assert_eq!(rgb_to_hsv8(250, 221, 221), (0, 30, 250));
        // Hue just below 360 degrees rounds to 180 and wraps.
        assert_eq!(rgb_to_hsv8(255, 0, 1).0, 0);
        assert_eq!(rgb_to_hsv8(255, 0, 60).0, 173);
    }

    #[test]
    fn test_rounded_saturation_crosses_bin_edge() {
        let config = ShotDetectorConfig::live();
        let a = FrameDescriptor::compute(&solid(0, [250, 219, 219]), &config);
        let b = FrameDescriptor::compute(&solid(1, [250, 221, 221]), &config);
        assert!(a.score(&b).unwrap() < config.threshold);
    }

    #[test]
    fn test_histogram_counts_every_pixel() {
        let frame = gradient(0);
        let histogram = hsv_histogram(&frame, HistogramBins::default());
        assert_eq!(histogram.len(), 512);
        assert_eq!(histogram.iter().sum::<f64>(), (16 * 12) as f64);
    }

    #[test]
    fn test_identical_histograms_correlate_fully() {
        let config = ShotDetectorConfig::default();
        let a = FrameDescriptor::compute(&gradient(0), &config);
        let b = FrameDescriptor::compute(&gradient(1), &config);
        assert!((a.score(&b).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_histograms_correlate_negatively() {
        let config = ShotDetectorConfig::default();
        let white = FrameDescriptor::compute(&solid(0, [255, 255, 255]), &config);
        let black = FrameDescriptor::compute(&solid(1, [0, 0, 0]), &config);
        assert!(white.score(&black).unwrap() < 0.0);
    }

    #[test]
    fn test_flat_histograms_count_as_identical() {
        assert_eq!(histogram_correlation(&[2.0, 2.0], &[0.0, 5.0]), 1.0);
    }

    #[test]
    fn test_mse() {
        let config = ShotDetectorConfig::default().with_method(DetectionMethod::Mse);
        let a = FrameDescriptor::compute(&solid(0, [10, 10, 10]), &config);
        let b = FrameDescriptor::compute(&solid(1, [10, 10, 10]), &config);
        let c = FrameDescriptor::compute(&solid(2, [20, 20, 20]), &config);
        assert_eq!(a.score(&b).unwrap(), 0.0);
        assert!((a.score(&c).unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_shape_mismatch() {
        let config = ShotDetectorConfig::default();
        let small = FrameDescriptor::compute(&solid(0, [0, 0, 0]), &config);
        let large = Frame::solid(1, Duration::ZERO, 32, 24, [0, 0, 0]).unwrap();
        let large = FrameDescriptor::compute(&large, &config);

        match small.score(&large) {
            Err(SegmentError::ShapeMismatch {
                frame_id,
                expected,
                actual,
            }) => {
                assert_eq!(frame_id, 1);
                assert_eq!(expected, (12, 16, 3));
                assert_eq!(actual, (24, 32, 3));
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }
}
