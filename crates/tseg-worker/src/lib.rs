//! Batch segmentation worker.
//!
//! This crate provides:
//! - Environment-driven worker configuration
//! - Frame loading from a directory of decoded stills
//! - Chunked shot detection, chapter alignment and document output

pub mod config;
pub mod pipeline;

pub use config::{DetectorPreset, WorkerConfig};
pub use pipeline::{detect_shots, load_frames, run};
