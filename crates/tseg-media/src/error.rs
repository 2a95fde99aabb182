//! Error types for segmentation operations.

use thiserror::Error;

/// Result type for segmentation operations.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Errors that can occur during shot detection and chapter alignment.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The frame's layout differs from the frame it is compared against.
    /// Similarity is undefined across shapes, so no decision is produced.
    #[error("Frame {frame_id} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        frame_id: u64,
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Composite image build failed for chapter {chapter_id}: {message}")]
    CompositeFailed { chapter_id: u64, message: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SegmentError {
    /// Create an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a composite failure error.
    pub fn composite_failed(chapter_id: u64, message: impl Into<String>) -> Self {
        Self::CompositeFailed {
            chapter_id,
            message: message.into(),
        }
    }
}
