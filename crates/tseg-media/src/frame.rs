//! Decoded frames and frame collections.
//!
//! Frames are produced by an external decoder and are immutable once built.
//! Pixel data is stored as `height x width x channels` with either one
//! (grey) or three (RGB) channels.

use std::time::Duration;

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array3;

use crate::error::{SegmentError, SegmentResult};

/// One decoded image sample from a video.
#[derive(Debug, Clone)]
pub struct Frame {
    id: u64,
    timestamp: Duration,
    pixels: Array3<u8>,
}

impl Frame {
    /// Wrap a pixel buffer laid out as `(height, width, channels)`.
    pub fn new(id: u64, timestamp: Duration, pixels: Array3<u8>) -> SegmentResult<Self> {
        let (height, width, channels) = pixels.dim();
        if height == 0 || width == 0 {
            return Err(SegmentError::invalid_frame(format!(
                "frame {id} has no pixels ({height}x{width})"
            )));
        }
        if channels != 1 && channels != 3 {
            return Err(SegmentError::invalid_frame(format!(
                "frame {id} has {channels} channels, expected 1 or 3"
            )));
        }
        Ok(Self {
            id,
            timestamp,
            pixels,
        })
    }

    /// Build a frame from an RGB image.
    pub fn from_rgb(id: u64, timestamp: Duration, image: &RgbImage) -> SegmentResult<Self> {
        let (width, height) = image.dimensions();
        let pixels = Array3::from_shape_vec(
            (height as usize, width as usize, 3),
            image.as_raw().clone(),
        )
        .map_err(|e| SegmentError::invalid_frame(format!("frame {id}: {e}")))?;
        Self::new(id, timestamp, pixels)
    }

    /// Build a single-channel frame from a greyscale image.
    pub fn from_luma(id: u64, timestamp: Duration, image: &GrayImage) -> SegmentResult<Self> {
        let (width, height) = image.dimensions();
        let pixels = Array3::from_shape_vec(
            (height as usize, width as usize, 1),
            image.as_raw().clone(),
        )
        .map_err(|e| SegmentError::invalid_frame(format!("frame {id}: {e}")))?;
        Self::new(id, timestamp, pixels)
    }

    /// Build a frame from any decoded image. 8-bit greyscale stays single
    /// channel; everything else is converted to RGB.
    pub fn from_dynamic(id: u64, timestamp: Duration, image: &DynamicImage) -> SegmentResult<Self> {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_luma(id, timestamp, gray),
            other => Self::from_rgb(id, timestamp, &other.to_rgb8()),
        }
    }

    /// A frame where every pixel has the same RGB value.
    pub fn solid(
        id: u64,
        timestamp: Duration,
        width: usize,
        height: usize,
        rgb: [u8; 3],
    ) -> SegmentResult<Self> {
        let pixels = Array3::from_shape_fn((height, width, 3), |(_, _, c)| rgb[c]);
        Self::new(id, timestamp, pixels)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Timestamp truncated to whole milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.as_millis() as u64
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    /// `(height, width, channels)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.pixels.dim()
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    /// Copy the pixels into an RGB image, replicating grey frames across
    /// all three channels.
    pub fn to_rgb_image(&self) -> RgbImage {
        let (height, width, channels) = self.shape();
        RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (row, col) = (y as usize, x as usize);
            if channels == 1 {
                let v = self.pixels[[row, col, 0]];
                image::Rgb([v, v, v])
            } else {
                image::Rgb([
                    self.pixels[[row, col, 0]],
                    self.pixels[[row, col, 1]],
                    self.pixels[[row, col, 2]],
                ])
            }
        })
    }
}

/// Frames of one stream, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct FrameCollection {
    frames: Vec<Frame>,
}

impl FrameCollection {
    /// Build a collection; frames are sorted by id.
    pub fn new(mut frames: Vec<Frame>) -> Self {
        frames.sort_by_key(Frame::id);
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn get(&self, id: u64) -> Option<&Frame> {
        self.frames
            .binary_search_by_key(&id, Frame::id)
            .ok()
            .map(|idx| &self.frames[idx])
    }

    /// Frames with ids in `[start_id, end_id]`. Empty when the range is
    /// inverted or selects nothing.
    pub fn range(&self, start_id: u64, end_id: u64) -> &[Frame] {
        if start_id > end_id {
            return &[];
        }
        let lo = self.frames.partition_point(|f| f.id() < start_id);
        let hi = self.frames.partition_point(|f| f.id() <= end_id);
        &self.frames[lo..hi]
    }
}

impl From<Vec<Frame>> for FrameCollection {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_rejects_unsupported_channels() {
        let pixels = Array3::<u8>::zeros((4, 4, 4));
        let err = Frame::new(0, ts(0), pixels).unwrap_err();
        assert!(matches!(err, SegmentError::InvalidFrame(_)));
    }

    #[test]
    fn test_rejects_empty_frame() {
        let pixels = Array3::<u8>::zeros((0, 4, 3));
        assert!(Frame::new(0, ts(0), pixels).is_err());
    }

    #[test]
    fn test_from_rgb_layout() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        let frame = Frame::from_rgb(7, ts(250), &img).unwrap();

        assert_eq!(frame.shape(), (2, 3, 3));
        assert_eq!(frame.pixels()[[1, 2, 0]], 10);
        assert_eq!(frame.pixels()[[1, 2, 2]], 30);
        assert_eq!(frame.timestamp_ms(), 250);
        assert_eq!(frame.to_rgb_image(), img);
    }

    #[test]
    fn test_from_dynamic_keeps_grey() {
        let gray = GrayImage::from_pixel(5, 4, image::Luma([99]));
        let frame = Frame::from_dynamic(1, ts(0), &DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(frame.shape(), (4, 5, 1));
        assert_eq!(frame.to_rgb_image().get_pixel(0, 0), &image::Rgb([99, 99, 99]));
    }

    #[test]
    fn test_collection_range() {
        let frames = (0..10)
            .rev()
            .map(|i| Frame::solid(i, ts(i * 100), 2, 2, [0, 0, 0]).unwrap())
            .collect();
        let collection = FrameCollection::new(frames);

        let ids: Vec<u64> = collection.range(3, 6).iter().map(Frame::id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6]);
        assert!(collection.range(6, 3).is_empty());
        assert!(collection.range(20, 30).is_empty());
        assert_eq!(collection.get(9).map(Frame::id), Some(9));
        assert!(collection.get(10).is_none());
    }
}
