//! Shared data models for the temporal segmentation engine.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and topics produced upstream of the aligner
//! - Shots and per-frame shot-boundary decisions
//! - Chapters and the chapter document handed to downstream stages
//! - Timecode formatting and parsing

pub mod chapter;
pub mod scene;
pub mod shot;
pub mod timecode;

// Re-export common types
pub use chapter::{Chapter, ChapterDocument, ImageFailure, ImageRef};
pub use scene::{Scene, Topic};
pub use shot::{Shot, ShotBoundaryDecision};
pub use timecode::{format_timecode, parse_timecode, TimecodeError};
