//! Chapter alignment of visual scenes with audio/semantic topics.
//!
//! # Algorithm
//!
//! A single forward sweep over topics in start order, with a cursor into the
//! start-ordered scene list:
//!
//! 1. Scenes that end before the current topic starts become standalone
//!    chapters with no text (pre-roll, silence, music-only).
//! 2. Scenes that overlap the topic accumulate into one chapter carrying the
//!    topic's text.
//! 3. A scene that starts after the topic ends stops the scan; it belongs to
//!    a later topic or to the tail.
//! 4. Scenes left after the last topic become standalone chapters.
//!
//! Every scene lands in exactly one chapter. The scene slice is only read,
//! so the same inputs always produce the same chapters.
//!
//! Inputs must be sorted by `start_ms`. Unsorted input is logged but not
//! corrected; ordering and partition guarantees do not hold for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tseg_models::{
    format_timecode, Chapter, ChapterDocument, ImageFailure, ImageRef, Scene, Topic,
};

use super::composite::{CompositeImageBuilder, CompositeRequest};
use crate::error::SegmentError;
use crate::frame::FrameCollection;
use crate::metrics;

/// What to do with a topic that overlaps no scene.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UncoveredTopicPolicy {
    /// Emit nothing for the topic.
    #[default]
    Drop,
    /// Emit a chapter with the topic's range and text but no scenes.
    TextOnly,
}

impl UncoveredTopicPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::TextOnly => "text_only",
        }
    }
}

impl fmt::Display for UncoveredTopicPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UncoveredTopicPolicy {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "drop" => Ok(Self::Drop),
            "text_only" => Ok(Self::TextOnly),
            other => Err(SegmentError::invalid_config(format!(
                "unknown uncovered topic policy '{other}', expected 'drop' or 'text_only'"
            ))),
        }
    }
}

/// Aligner settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignerConfig {
    pub uncovered_topics: UncoveredTopicPolicy,
    /// Options passed to the composite builder for every chapter.
    pub composite: CompositeRequest,
}

/// Result of one alignment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    /// Chapters in emission order; ids are their positions.
    pub chapters: Vec<Chapter>,
    /// Chapters whose previews failed to render. Those chapters are still in
    /// `chapters`, with no images.
    pub image_failures: Vec<ImageFailure>,
}

impl Alignment {
    /// Wrap the result into the document handed to downstream stages.
    pub fn into_document(self) -> ChapterDocument {
        ChapterDocument::new(self.chapters, self.image_failures)
    }
}

/// Partitions scenes into chapters consistent with topic boundaries.
#[derive(Debug, Clone)]
pub struct ChapterAligner<B> {
    builder: B,
    config: AlignerConfig,
}

impl<B: CompositeImageBuilder> ChapterAligner<B> {
    pub fn new(builder: B, config: AlignerConfig) -> Self {
        Self { builder, config }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Align topics and scenes, both sorted by `start_ms`.
    pub fn align(&self, topics: &[Topic], scenes: &[Scene], frames: &FrameCollection) -> Alignment {
        warn_if_unsorted("topics", topics.iter().map(|t| t.start_ms));
        warn_if_unsorted("scenes", scenes.iter().map(|s| s.start_ms));

        let mut emitter = Emitter {
            builder: &self.builder,
            request: &self.config.composite,
            frames,
            alignment: Alignment::default(),
        };
        let mut cursor = 0;

        for topic in topics {
            let mut overlapping: Vec<&Scene> = Vec::new();

            while let Some(scene) = scenes.get(cursor) {
                if scene.start_ms > topic.end_ms {
                    break;
                }
                cursor += 1;
                if scene.overlaps(topic.start_ms, topic.end_ms) {
                    overlapping.push(scene);
                } else {
                    emitter.emit_scenes(&[scene], "");
                }
            }

            if !overlapping.is_empty() {
                emitter.emit_scenes(&overlapping, &topic.reason);
                continue;
            }
            match self.config.uncovered_topics {
                UncoveredTopicPolicy::Drop => {
                    debug!(topic_id = topic.id, "Topic overlaps no scene, dropped");
                }
                UncoveredTopicPolicy::TextOnly => emitter.emit_text_only(topic),
            }
        }

        for scene in &scenes[cursor..] {
            emitter.emit_scenes(&[scene], "");
        }

        let alignment = emitter.alignment;
        info!(
            topics = topics.len(),
            scenes = scenes.len(),
            chapters = alignment.chapters.len(),
            image_failures = alignment.image_failures.len(),
            "Chapter alignment complete"
        );
        alignment
    }
}

/// Assigns ids and renders previews as chapters are emitted.
struct Emitter<'a, B> {
    builder: &'a B,
    request: &'a CompositeRequest,
    frames: &'a FrameCollection,
    alignment: Alignment,
}

impl<B: CompositeImageBuilder> Emitter<'_, B> {
    fn next_id(&self) -> u64 {
        self.alignment.chapters.len() as u64
    }

    fn emit_scenes(&mut self, group: &[&Scene], text: &str) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            return;
        };
        let id = self.next_id();
        let composite_images = self.render(id, first.start_frame_id, last.end_frame_id);

        let chapter = Chapter {
            id,
            scene_ids: group.iter().map(|s| s.id).collect(),
            start_frame_id: Some(first.start_frame_id),
            end_frame_id: Some(last.end_frame_id),
            start_ms: first.start_ms,
            end_ms: last.end_ms,
            text: text.to_string(),
            composite_images,
        };
        metrics::record_chapter(if chapter.is_standalone() { "standalone" } else { "topic" });
        debug!(
            chapter_id = id,
            scenes = ?chapter.scene_ids,
            start = %format_timecode(chapter.start_ms),
            end = %format_timecode(chapter.end_ms),
            "Chapter emitted"
        );
        self.alignment.chapters.push(chapter);
    }

    fn emit_text_only(&mut self, topic: &Topic) {
        let id = self.next_id();
        metrics::record_chapter("text_only");
        debug!(
            chapter_id = id,
            topic_id = topic.id,
            start = %format_timecode(topic.start_ms),
            end = %format_timecode(topic.end_ms),
            "Text-only chapter emitted"
        );
        self.alignment.chapters.push(Chapter {
            id,
            scene_ids: Vec::new(),
            start_frame_id: None,
            end_frame_id: None,
            start_ms: topic.start_ms,
            end_ms: topic.end_ms,
            text: topic.reason.clone(),
            composite_images: Vec::new(),
        });
    }

    /// Render previews for `[start_frame_id, end_frame_id]`. A failure is
    /// recorded against the chapter and yields no images.
    fn render(&mut self, chapter_id: u64, start_frame_id: u64, end_frame_id: u64) -> Vec<ImageRef> {
        let frames = self.frames.range(start_frame_id, end_frame_id);
        if frames.is_empty() {
            debug!(chapter_id, start_frame_id, end_frame_id, "No frames in chapter range");
            return Vec::new();
        }

        match self.builder.build(chapter_id, frames, self.request) {
            Ok(images) => images,
            Err(e) => {
                warn!(chapter_id, error = %e, "Composite image build failed");
                metrics::record_composite_failure();
                self.alignment.image_failures.push(ImageFailure {
                    chapter_id,
                    message: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}

fn warn_if_unsorted(what: &str, starts: impl Iterator<Item = u64>) {
    let mut previous: Option<u64> = None;
    for (idx, start) in starts.enumerate() {
        if previous.is_some_and(|p| start < p) {
            warn!(
                input = what,
                index = idx,
                start_ms = start,
                "Input not sorted by start time; chapter ordering is not guaranteed"
            );
            return;
        }
        previous = Some(start);
    }
}
