// src/player_tracking.rs
//
// Lightweight greedy tracker over detector foot points. Keeps player
// identities stable across frames and smooths each track's position so the
// stabilizer downstream sees a calmer signal. Tracks coast briefly through
// missed detections (occlusions, dropped frames from the detector).

use crate::player_detection::Detection;
use crate::types::{PlayerPosition, TrackerConfig};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrackedPlayer {
    pub id: u32,
    pub position: PlayerPosition,
    frames_since_seen: u32,
}

pub struct PlayerTracker {
    config: TrackerConfig,
    tracks: Vec<TrackedPlayer>,
    next_id: u32,
}

impl PlayerTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_id: 0,
        }
    }

    /// Match this frame's detections to existing tracks by nearest foot
    /// point, spawn tracks for the rest, and age out stale tracks.
    pub fn update(&mut self, detections: &[Detection]) {
        let mut claimed = vec![false; self.tracks.len()];

        for detection in detections {
            let (fx, fy) = detection.foot_point();

            let nearest = self
                .tracks
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed[*i])
                .map(|(i, track)| {
                    let dx = track.position.x - fx;
                    let dy = track.position.y - fy;
                    (i, (dx * dx + dy * dy).sqrt())
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match nearest {
                Some((i, distance)) if distance <= self.config.max_match_distance => {
                    claimed[i] = true;
                    let track = &mut self.tracks[i];
                    let alpha = self.config.position_smoothing;
                    track.position.x = alpha * fx + (1.0 - alpha) * track.position.x;
                    track.position.y = alpha * fy + (1.0 - alpha) * track.position.y;
                    track.frames_since_seen = 0;
                }
                _ => {
                    self.tracks.push(TrackedPlayer {
                        id: self.next_id,
                        position: PlayerPosition { x: fx, y: fy },
                        frames_since_seen: 0,
                    });
                    claimed.push(true);
                    self.next_id += 1;
                }
            }
        }

        for (i, track) in self.tracks.iter_mut().enumerate() {
            if !claimed[i] {
                track.frames_since_seen += 1;
            }
        }

        let max_coast = self.config.max_coast_frames;
        let before = self.tracks.len();
        self.tracks.retain(|t| t.frames_since_seen <= max_coast);
        if self.tracks.len() < before {
            debug!("Dropped {} stale player tracks", before - self.tracks.len());
        }
    }

    /// Current-frame snapshot of all tracked player positions.
    pub fn positions(&self) -> Vec<PlayerPosition> {
        self.tracks.iter().map(|t| t.position).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrackerConfig {
        TrackerConfig {
            max_match_distance: 60.0,
            max_coast_frames: 3,
            position_smoothing: 0.5,
        }
    }

    fn detection(x: f32, y: f32) -> Detection {
        // foot point of this bbox is (x, y)
        Detection {
            bbox: [x - 20.0, y - 100.0, x + 20.0, y],
            confidence: 0.9,
        }
    }

    #[test]
    fn nearby_detection_keeps_its_identity_and_smooths() {
        let mut tracker = PlayerTracker::new(config());
        tracker.update(&[detection(100.0, 200.0)]);
        tracker.update(&[detection(110.0, 210.0)]);

        assert_eq!(tracker.len(), 1);
        let pos = tracker.positions()[0];
        assert_eq!(pos.x, 105.0);
        assert_eq!(pos.y, 205.0);
    }

    #[test]
    fn distant_detection_spawns_a_new_track() {
        let mut tracker = PlayerTracker::new(config());
        tracker.update(&[detection(100.0, 200.0)]);
        tracker.update(&[detection(500.0, 200.0)]);

        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn tracks_coast_then_expire() {
        let mut tracker = PlayerTracker::new(config());
        tracker.update(&[detection(100.0, 200.0)]);

        for _ in 0..3 {
            tracker.update(&[]);
            assert_eq!(tracker.len(), 1);
        }
        tracker.update(&[]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn coasting_track_holds_its_last_position() {
        let mut tracker = PlayerTracker::new(config());
        tracker.update(&[detection(100.0, 200.0)]);
        tracker.update(&[]);

        let pos = tracker.positions()[0];
        assert_eq!((pos.x, pos.y), (100.0, 200.0));
    }
}
