//! Chapter records and the document handed to downstream stages.
//!
//! Chapters are the unit on which ad-break and summarization decisions are
//! made. They are created only by the aligner and are immutable afterwards.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a rendered composite preview image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageRef {
    /// Location of the encoded image.
    pub path: PathBuf,
    /// Pixel width of the encoded image.
    pub width: u32,
    /// Pixel height of the encoded image.
    pub height: u32,
}

/// An aligned unit of scenes and (optionally) a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    /// Sequential id in emission order, starting at 0.
    pub id: u64,
    /// Scenes owned by this chapter, in start-time order.
    pub scene_ids: Vec<u64>,
    /// First frame of the first scene. Absent for text-only chapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_frame_id: Option<u64>,
    /// Last frame of the last scene. Absent for text-only chapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_frame_id: Option<u64>,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Topic summary, empty for standalone visual chapters.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub composite_images: Vec<ImageRef>,
}

impl Chapter {
    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// A visual segment with no corresponding semantic content
    /// (pre-roll, silence, music-only).
    pub fn is_standalone(&self) -> bool {
        self.text.is_empty() && !self.scene_ids.is_empty()
    }

    /// A topic that overlapped no scene.
    pub fn is_text_only(&self) -> bool {
        self.scene_ids.is_empty()
    }
}

/// A composite-image build that failed for one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageFailure {
    pub chapter_id: u64,
    pub message: String,
}

/// Serialized output of one alignment run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChapterDocument {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub chapters: Vec<Chapter>,
    /// Chapters whose previews could not be rendered. Those chapters are
    /// still present in `chapters`, without images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_failures: Vec<ImageFailure>,
}

impl ChapterDocument {
    /// Create a document stamped with a fresh run id and the current time.
    pub fn new(chapters: Vec<Chapter>, image_failures: Vec<ImageFailure>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            chapters,
            image_failures,
        }
    }

    /// Total number of scenes covered by the document's chapters.
    pub fn scene_count(&self) -> usize {
        self.chapters.iter().map(|c| c.scene_ids.len()).sum()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a document previously written with [`ChapterDocument::to_json_pretty`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
