//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tseg_media::{DetectionMethod, ShotDetectorConfig, UncoveredTopicPolicy};
use tseg_models::parse_timecode;

/// Starting point for the detector settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectorPreset {
    /// Frame-at-a-time, low threshold.
    Live,
    /// Chunked with cross-chunk continuity.
    #[default]
    Fusion,
}

impl FromStr for DetectorPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "fusion" => Ok(Self::Fusion),
            other => bail!("unknown detector preset '{other}', expected 'live' or 'fusion'"),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory of decoded frames (png/jpg), ordered by file name
    pub frames_dir: PathBuf,
    /// Scenes JSON; when absent every detected shot becomes a scene
    pub scenes_path: Option<PathBuf>,
    /// Topics JSON; when absent every chapter is standalone
    pub topics_path: Option<PathBuf>,
    /// Where the chapter document is written
    pub output_path: PathBuf,
    /// Where composite previews are written; no previews when absent
    pub composite_dir: Option<PathBuf>,
    /// Where a Prometheus text dump is written after the run
    pub metrics_path: Option<PathBuf>,
    /// Effective detector settings
    pub detector: ShotDetectorConfig,
    /// Frames per detection batch
    pub chunk_size: usize,
    /// Timestamp of the first frame, for frames cut from mid-stream
    pub start_offset: Duration,
    /// Time between consecutive frames
    pub frame_interval: Duration,
    pub uncovered_topics: UncoveredTopicPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            scenes_path: None,
            topics_path: None,
            output_path: PathBuf::from("chapters.json"),
            composite_dir: None,
            metrics_path: None,
            detector: ShotDetectorConfig::fusion(),
            chunk_size: 20, // One 4x5 filmstrip per chunk
            start_offset: Duration::ZERO,
            frame_interval: Duration::from_millis(1000),
            uncovered_topics: UncoveredTopicPolicy::Drop,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let preset = match lookup("TSEG_DETECTOR_PRESET") {
            Some(value) => value.parse()?,
            None => DetectorPreset::default(),
        };
        let mut detector = match preset {
            DetectorPreset::Live => ShotDetectorConfig::live(),
            DetectorPreset::Fusion => ShotDetectorConfig::fusion(),
        };
        if let Some(method) = lookup("TSEG_DETECTOR_METHOD") {
            detector.method = DetectionMethod::from_str(&method)?;
        }
        if let Some(threshold) = lookup("TSEG_DETECTOR_THRESHOLD") {
            detector.threshold = threshold
                .trim()
                .parse()
                .with_context(|| format!("TSEG_DETECTOR_THRESHOLD is not a number: {threshold}"))?;
        }
        detector.validate()?;

        let start_offset = match lookup("TSEG_START_TIMECODE") {
            Some(tc) => Duration::from_millis(
                parse_timecode(&tc).with_context(|| format!("TSEG_START_TIMECODE: {tc}"))?,
            ),
            None => defaults.start_offset,
        };

        let uncovered_topics = match lookup("TSEG_UNCOVERED_TOPICS") {
            Some(value) => value.parse()?,
            None => defaults.uncovered_topics,
        };

        Ok(Self {
            frames_dir: path("TSEG_FRAMES_DIR").unwrap_or(defaults.frames_dir),
            scenes_path: path("TSEG_SCENES_PATH"),
            topics_path: path("TSEG_TOPICS_PATH"),
            output_path: path("TSEG_OUTPUT_PATH").unwrap_or(defaults.output_path),
            composite_dir: path("TSEG_COMPOSITE_DIR"),
            metrics_path: path("TSEG_METRICS_PATH"),
            detector,
            chunk_size: lookup("TSEG_CHUNK_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.chunk_size),
            start_offset,
            frame_interval: Duration::from_millis(
                lookup("TSEG_FRAME_INTERVAL_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.frame_interval.as_millis() as u64),
            ),
            uncovered_topics,
        })
    }
}
