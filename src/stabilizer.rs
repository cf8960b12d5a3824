// src/stabilizer.rs
//
// Temporal stabilization for the VAR line's vertical position. The raw
// signal (topmost tracked player per frame) is noisy: a single misdetection
// or an airborne player can throw the line across the screen. Small moves
// are smoothed, large moves are held back until they persist.

use crate::types::{PlayerPosition, StabilizerConfig, VarLine};

pub struct LineStabilizer {
    config: StabilizerConfig,
    last_y: Option<i32>,
    stability_counter: u32,
    last_line: Option<VarLine>,
}

impl LineStabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            last_y: None,
            stability_counter: 0,
            last_line: None,
        }
    }

    /// Fold the current frame's player positions into the stabilized line.
    ///
    /// Returns the line to draw, or `None` when there are no players and no
    /// previous line to fall back on. With an empty player set the previous
    /// line is returned frozen, with no state change.
    pub fn update(
        &mut self,
        player_positions: &[PlayerPosition],
        frame_width: i32,
        frame_height: i32,
    ) -> Option<VarLine> {
        if player_positions.is_empty() {
            return self.last_line;
        }

        // Smallest y is the most advanced player (higher in the image).
        let raw_y = player_positions
            .iter()
            .map(|p| p.y)
            .fold(frame_height as f32, f32::min);

        let accepted_y = match self.last_y {
            None => raw_y.round() as i32,
            Some(last_y) => {
                let delta = (last_y as f32 - raw_y).abs();
                if delta > self.config.max_jump_px {
                    if self.stability_counter < self.config.confirm_frames {
                        // Hold the line until the jump has persisted.
                        self.stability_counter += 1;
                        last_y
                    } else {
                        self.stability_counter = 0;
                        raw_y.round() as i32
                    }
                } else {
                    self.stability_counter = 0;
                    let w = self.config.smoothing_weight;
                    (w * raw_y + (1.0 - w) * last_y as f32).round() as i32
                }
            }
        };

        self.last_y = Some(accepted_y);
        let line = VarLine::horizontal(accepted_y, frame_width);
        self.last_line = Some(line);
        Some(line)
    }

    pub fn last_line(&self) -> Option<VarLine> {
        self.last_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: i32 = 1280;
    const HEIGHT: i32 = 720;

    fn players(ys: &[f32]) -> Vec<PlayerPosition> {
        ys.iter()
            .map(|&y| PlayerPosition { x: 100.0, y })
            .collect()
    }

    fn stabilizer() -> LineStabilizer {
        LineStabilizer::new(StabilizerConfig::default())
    }

    #[test]
    fn first_frame_accepts_raw_minimum_unsmoothed() {
        let mut s = stabilizer();
        let line = s.update(&players(&[400.0, 250.0, 310.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(250, WIDTH)));
    }

    #[test]
    fn small_move_is_exponentially_smoothed() {
        let mut s = stabilizer();
        s.update(&players(&[100.0]), WIDTH, HEIGHT);

        // 0.7 * 130 + 0.3 * 100 = 121
        let line = s.update(&players(&[130.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(121, WIDTH)));
    }

    #[test]
    fn large_jump_is_held_for_five_frames_then_accepted() {
        let mut s = stabilizer();
        s.update(&players(&[100.0]), WIDTH, HEIGHT);

        for _ in 0..5 {
            let line = s.update(&players(&[300.0]), WIDTH, HEIGHT);
            assert_eq!(line, Some(VarLine::horizontal(100, WIDTH)));
        }

        // Sixth consecutive large delta: accepted outright, no smoothing.
        let line = s.update(&players(&[300.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(300, WIDTH)));

        // Counter was reset: the next large jump is rejected again.
        let line = s.update(&players(&[600.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(300, WIDTH)));
    }

    #[test]
    fn small_move_rearms_the_jump_counter() {
        let mut s = stabilizer();
        s.update(&players(&[100.0]), WIDTH, HEIGHT);

        for _ in 0..3 {
            s.update(&players(&[300.0]), WIDTH, HEIGHT);
        }
        // Back within range: smoothed and the counter resets.
        let line = s.update(&players(&[110.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(107, WIDTH)));

        // A fresh run of large jumps has to persist all over again.
        for _ in 0..5 {
            let line = s.update(&players(&[400.0]), WIDTH, HEIGHT);
            assert_eq!(line, Some(VarLine::horizontal(107, WIDTH)));
        }
        let line = s.update(&players(&[400.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(400, WIDTH)));
    }

    #[test]
    fn empty_positions_freeze_the_previous_line() {
        let mut s = stabilizer();
        s.update(&players(&[150.0]), WIDTH, HEIGHT);

        let line = s.update(&[], WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(150, WIDTH)));

        // Frozen, not folded: the next real sample smooths against 150.
        let line = s.update(&players(&[170.0]), WIDTH, HEIGHT);
        assert_eq!(line, Some(VarLine::horizontal(164, WIDTH)));
    }

    #[test]
    fn empty_positions_with_no_history_yield_no_line() {
        let mut s = stabilizer();
        assert_eq!(s.update(&[], WIDTH, HEIGHT), None);
        assert_eq!(s.last_line(), None);
    }
}
