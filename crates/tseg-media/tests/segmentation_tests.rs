//! End-to-end segmentation: detection, grouping and chapter alignment.

use std::time::Duration;

use tempfile::TempDir;
use tseg_media::{
    group_shots, shots_as_scenes, AlignerConfig, ChapterAligner, Frame, FrameCollection,
    GridCompositeBuilder, ShotChangeDetector, ShotDetectorConfig, UncoveredTopicPolicy,
};
use tseg_models::Topic;

const RED: [u8; 3] = [210, 30, 30];
const GREEN: [u8; 3] = [30, 210, 30];
const BLUE: [u8; 3] = [30, 30, 210];

/// Nine one-second frames in three solid-colour shots.
fn three_shot_clip() -> Vec<Frame> {
    [RED, GREEN, BLUE]
        .iter()
        .flat_map(|&rgb| std::iter::repeat(rgb).take(3))
        .enumerate()
        .map(|(i, rgb)| Frame::solid(i as u64, Duration::from_secs(i as u64), 32, 24, rgb).unwrap())
        .collect()
}

fn chunked_decisions(frames: &[Frame], chunk_size: usize) -> Vec<bool> {
    let mut detector = ShotChangeDetector::fusion();
    frames
        .chunks(chunk_size)
        .flat_map(|chunk| detector.detect_batch(chunk).unwrap())
        .collect()
}

#[test]
fn test_chunked_detection_matches_frame_at_a_time() {
    let frames = three_shot_clip();

    let mut single = ShotChangeDetector::new(ShotDetectorConfig::fusion()).unwrap();
    let expected: Vec<bool> = frames
        .iter()
        .enumerate()
        .map(|(n, f)| single.detect_single(f, n as u64).unwrap().0)
        .collect();
    assert_eq!(
        expected,
        vec![false, false, false, true, false, false, true, false, false]
    );

    for chunk_size in 1..=frames.len() {
        assert_eq!(chunked_decisions(&frames, chunk_size), expected, "chunk_size={chunk_size}");
    }
}

#[test]
fn test_detected_shots_feed_chapters() {
    let frames = three_shot_clip();
    let decisions = chunked_decisions(&frames, 2);
    let shots = group_shots(&frames, &decisions).unwrap();

    assert_eq!(shots.len(), 3);
    assert_eq!(
        shots.iter().map(|s| (s.start_ms, s.end_ms)).collect::<Vec<_>>(),
        vec![(0, 2000), (3000, 5000), (6000, 8000)]
    );

    let scenes = shots_as_scenes(&shots);
    let topics = vec![
        Topic::new(0, 0, 4000, "opening"),
        Topic::new(1, 6500, 7000, "closing"),
    ];

    let out = TempDir::new().unwrap();
    let aligner = ChapterAligner::new(
        GridCompositeBuilder::new(out.path()),
        AlignerConfig {
            uncovered_topics: UncoveredTopicPolicy::Drop,
            ..AlignerConfig::default()
        },
    );
    let collection = FrameCollection::new(frames);
    let document = aligner.align(&topics, &scenes, &collection).into_document();

    assert!(document.image_failures.is_empty());
    assert_eq!(document.chapters.len(), 2);

    let opening = &document.chapters[0];
    assert_eq!(opening.scene_ids, vec![0, 1]);
    assert_eq!((opening.start_frame_id, opening.end_frame_id), (Some(0), Some(5)));
    assert_eq!(opening.text, "opening");

    let closing = &document.chapters[1];
    assert_eq!(closing.scene_ids, vec![2]);
    assert_eq!((closing.start_ms, closing.end_ms), (6000, 8000));

    for chapter in &document.chapters {
        assert_eq!(chapter.composite_images.len(), 1);
        let image_ref = &chapter.composite_images[0];
        let decoded = image::open(&image_ref.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (image_ref.width, image_ref.height));
        assert!(image_ref.width.max(image_ref.height) <= 1568);
    }
    assert!(out.path().join("chapter_0000_00.png").exists());
    assert!(out.path().join("chapter_0001_00.png").exists());
}
