//! End-to-end segmentation run: frames in, chapter document out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use tseg_media::{
    group_shots, shots_as_scenes, AlignerConfig, ChapterAligner, CompositeImageBuilder,
    CompositeRequest, Frame, FrameCollection, GridCompositeBuilder, NoComposites,
    ShotChangeDetector, ShotDetectorConfig,
};
use tseg_models::{format_timecode, ChapterDocument, Scene, Shot, Topic};

use crate::config::WorkerConfig;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Load still frames from a directory, ordered by file name.
///
/// Frame ids are positions in that order; timestamps are
/// `start + id * interval`.
pub fn load_frames(dir: &Path, start: Duration, interval: Duration) -> Result<Vec<Frame>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read frames directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()));
    let paths = frame_paths(dir, entries)?;

    let mut frames = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let id = index as u64;
        let image = image::open(path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?;
        let timestamp = start.saturating_add(interval.saturating_mul(index as u32));
        frames.push(Frame::from_dynamic(id, timestamp, &image)?);
    }

    debug!(
        dir = %dir.display(),
        frames = frames.len(),
        first = %format_timecode(start.as_millis() as u64),
        "Loaded frames"
    );
    Ok(frames)
}

/// Sorted frame image paths. An unreadable entry fails the whole listing.
fn frame_paths(
    dir: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in frames directory {}", dir.display()))?;
        if path.is_file() && has_frame_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Detect shot boundaries and group frames into shots.
///
/// Cross-chunk configurations run in batches of `chunk_size`; otherwise
/// frames are fed one at a time so no chunk seam goes unchecked.
pub fn detect_shots(
    frames: &[Frame],
    config: ShotDetectorConfig,
    chunk_size: usize,
) -> Result<Vec<Shot>> {
    let mut detector = ShotChangeDetector::new(config)?;
    let mut decisions = Vec::with_capacity(frames.len());

    if config.enable_cross_chunk {
        for chunk in frames.chunks(chunk_size.max(1)) {
            decisions.extend(detector.detect_batch(chunk)?);
        }
    } else {
        for frame in frames {
            decisions.push(detector.detect_frame(frame)?.is_boundary);
        }
    }

    let shots = group_shots(frames, &decisions)?;
    for shot in &shots {
        debug!(
            index = shot.index,
            start = %format_timecode(shot.start_ms),
            end = %format_timecode(shot.end_ms),
            frames = shot.frame_count,
            "Shot"
        );
    }
    info!(
        frames = frames.len(),
        boundaries = detector.boundaries_detected(),
        shots = shots.len(),
        method = %config.method,
        "Shot detection complete"
    );
    Ok(shots)
}

/// Read a JSON array or document from disk.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Run the whole pipeline and write the chapter document.
pub fn run(config: &WorkerConfig) -> Result<ChapterDocument> {
    let started = Instant::now();

    let frames = load_frames(&config.frames_dir, config.start_offset, config.frame_interval)?;
    if frames.is_empty() {
        bail!("No frames found in {}", config.frames_dir.display());
    }

    let shots = detect_shots(&frames, config.detector, config.chunk_size)?;

    let scenes: Vec<Scene> = match &config.scenes_path {
        Some(path) => read_json(path)?,
        None => {
            debug!("No scenes file configured, using detected shots as scenes");
            shots_as_scenes(&shots)
        }
    };
    let topics: Vec<Topic> = match &config.topics_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let builder: Box<dyn CompositeImageBuilder> = match &config.composite_dir {
        Some(dir) => Box::new(GridCompositeBuilder::new(dir)),
        None => Box::new(NoComposites),
    };
    let aligner = ChapterAligner::new(
        builder,
        AlignerConfig {
            uncovered_topics: config.uncovered_topics,
            composite: CompositeRequest::default(),
        },
    );

    let frames = FrameCollection::new(frames);
    let document = aligner.align(&topics, &scenes, &frames).into_document();
    for failure in &document.image_failures {
        warn!(chapter_id = failure.chapter_id, "Composite failed: {}", failure.message);
    }

    write_document(&document, &config.output_path)?;
    info!(
        run_id = %document.run_id,
        chapters = document.chapters.len(),
        scenes = scenes.len(),
        topics = topics.len(),
        output = %config.output_path.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Segmentation run complete"
    );
    Ok(document)
}

fn write_document(document: &ChapterDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = document.to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
