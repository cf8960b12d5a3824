// src/pipeline.rs
//
// Per-frame orchestration: field lines -> perspective correction -> player
// detection/tracking -> line stabilization -> overlay. One pipeline owns all
// cross-frame state, so two videos processed in the same process never share
// a cache or a stabilizer. Frames must be fed in order.

use crate::field_lines::{detect_field_lines, refine_field_lines};
use crate::overlay::{draw_player_markers, draw_var_line};
use crate::perspective::{Correction, PerspectiveCache, SkipReason};
use crate::player_detection::PlayerDetector;
use crate::player_tracking::PlayerTracker;
use crate::stabilizer::LineStabilizer;
use crate::types::Config;
use anyhow::Result;
use opencv::{core::Mat, prelude::*};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub frames: u64,
    pub corrected_frames: u64,
    pub passthrough_frames: u64,
    pub frames_with_line: u64,
    pub players_detected: u64,
}

pub struct VarPipeline {
    config: Config,
    detector: PlayerDetector,
    tracker: PlayerTracker,
    perspective: PerspectiveCache,
    stabilizer: LineStabilizer,
    pub stats: PipelineStats,
}

impl VarPipeline {
    pub fn new(config: Config) -> Result<Self> {
        let detector = PlayerDetector::new(
            &config.model.path,
            config.model.input_size,
            config.model.nms_iou_threshold,
            config.model.num_threads,
        )?;
        let tracker = PlayerTracker::new(config.tracker.clone());
        let stabilizer = LineStabilizer::new(config.stabilizer.clone());

        Ok(Self {
            config,
            detector,
            tracker,
            perspective: PerspectiveCache::new(),
            stabilizer,
            stats: PipelineStats::default(),
        })
    }

    /// Process one frame and return the annotated result. Total contract:
    /// any stage failure degrades to passing the frame through with as much
    /// of the overlay as could be produced.
    pub fn process_frame(&mut self, frame: &Mat) -> Result<Mat> {
        self.stats.frames += 1;

        let mut output = if self.config.video.correct_perspective {
            self.correct_perspective(frame)?
        } else {
            frame.try_clone()?
        };

        let positions = match self.detector.detect(&output, self.config.model.confidence_threshold)
        {
            Ok(detections) => {
                self.stats.players_detected += detections.len() as u64;
                self.tracker.update(&detections);
                self.tracker.positions()
            }
            Err(e) => {
                warn!("Player detection failed: {e:#}");
                // Stale tracker positions are still better than no line.
                self.tracker.positions()
            }
        };

        let size = output.size()?;
        match self.stabilizer.update(&positions, size.width, size.height) {
            Some(line) => {
                self.stats.frames_with_line += 1;
                if let Err(e) = draw_var_line(&mut output, &line) {
                    warn!("Failed to draw VAR line: {e:#}");
                }
                if let Err(e) = draw_player_markers(&mut output, &positions, line.y1) {
                    warn!("Failed to draw player markers: {e:#}");
                }
            }
            None => debug!("No players and no previous line, skipping overlay"),
        }

        Ok(output)
    }

    fn correct_perspective(&mut self, frame: &Mat) -> Result<Mat> {
        let field_lines = match detect_field_lines(frame, &self.config.field_lines) {
            Ok(lines) => refine_field_lines(lines),
            Err(e) => {
                warn!("Field line detection failed: {e:#}");
                Vec::new()
            }
        };

        match self.perspective.correct(frame, &field_lines) {
            Correction::Corrected(corrected) => {
                self.stats.corrected_frames += 1;
                Ok(corrected)
            }
            Correction::Skipped(reason) => {
                self.stats.passthrough_frames += 1;
                match reason {
                    SkipReason::InsufficientLines(n) => {
                        debug!("Not enough field lines for perspective adjustment ({n})");
                    }
                    SkipReason::Computation(e) => {
                        warn!("Perspective adjustment failed: {e}");
                    }
                }
                Ok(frame.try_clone()?)
            }
        }
    }

    pub fn transform_computations(&self) -> u64 {
        self.perspective.computations()
    }
}
