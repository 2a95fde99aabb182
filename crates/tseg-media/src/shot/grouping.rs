//! Grouping per-frame boundary decisions into shots.

use tracing::info;
use tseg_models::{Scene, Shot};

use crate::error::{SegmentError, SegmentResult};
use crate::frame::Frame;

/// Split a frame sequence into shots at every reported boundary.
///
/// `decisions[i]` is the boundary decision for `frames[i]`; frame 0 always
/// opens the first shot whatever its decision says.
pub fn group_shots(frames: &[Frame], decisions: &[bool]) -> SegmentResult<Vec<Shot>> {
    if frames.len() != decisions.len() {
        return Err(SegmentError::invalid_input(format!(
            "{} frames but {} boundary decisions",
            frames.len(),
            decisions.len()
        )));
    }
    if frames.is_empty() {
        return Ok(Vec::new());
    }

    let mut starts: Vec<usize> = vec![0];
    starts.extend(
        decisions
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(_, &is_boundary)| is_boundary)
            .map(|(idx, _)| idx),
    );

    let shots: Vec<Shot> = starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).map_or(frames.len() - 1, |next| next - 1);
            let (first, last) = (&frames[start], &frames[end]);
            Shot {
                index,
                start_frame_id: first.id(),
                end_frame_id: last.id(),
                start_ms: first.timestamp_ms(),
                end_ms: last.timestamp_ms(),
                frame_count: end - start + 1,
            }
        })
        .collect();

    info!("Grouped {} frames into {} shots", frames.len(), shots.len());
    Ok(shots)
}

/// Treat every shot as its own scene.
///
/// Stand-in for an upstream scene provider when none is available.
pub fn shots_as_scenes(shots: &[Shot]) -> Vec<Scene> {
    shots
        .iter()
        .map(|shot| {
            Scene::new(
                shot.index as u64,
                shot.start_ms,
                shot.end_ms,
                shot.start_frame_id,
                shot.end_frame_id,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn frames(n: u64) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::solid(i + 100, Duration::from_millis(i * 500), 4, 4, [0, 0, 0]).unwrap())
            .collect()
    }

    #[test]
    fn test_no_boundaries_is_one_shot() {
        let shots = group_shots(&frames(4), &[false; 4]).unwrap();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].start_frame_id, 100);
        assert_eq!(shots[0].end_frame_id, 103);
        assert_eq!(shots[0].end_ms, 1500);
        assert_eq!(shots[0].frame_count, 4);
    }

    #[test]
    fn test_split_at_boundaries() {
        let decisions = [false, false, true, false, true, true];
        let shots = group_shots(&frames(6), &decisions).unwrap();

        let spans: Vec<(u64, u64)> = shots
            .iter()
            .map(|s| (s.start_frame_id, s.end_frame_id))
            .collect();
        assert_eq!(spans, vec![(100, 101), (102, 103), (104, 104), (105, 105)]);
        assert_eq!(shots[1].start_ms, 1000);
        assert_eq!(shots[3].index, 3);
    }

    #[test]
    fn test_leading_boundary_is_ignored() {
        let shots = group_shots(&frames(3), &[true, false, false]).unwrap();
        assert_eq!(shots.len(), 1);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            group_shots(&frames(3), &[false]),
            Err(SegmentError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty() {
        assert!(group_shots(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_shots_as_scenes() {
        let shots = group_shots(&frames(4), &[false, false, true, false]).unwrap();
        let scenes = shots_as_scenes(&shots);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[1], Scene::new(1, 1000, 1500, 102, 103));
    }
}
