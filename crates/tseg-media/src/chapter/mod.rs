//! Chapter alignment and preview rendering.

pub mod aligner;
pub mod composite;

pub use aligner::{AlignerConfig, Alignment, ChapterAligner, UncoveredTopicPolicy};
pub use composite::{
    CompositeImageBuilder, CompositeRequest, GridCompositeBuilder, GridLayout, NoComposites,
    DEFAULT_MAX_DIMENSION,
};
