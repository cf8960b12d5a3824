use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub tracker: TrackerConfig,
    pub stabilizer: StabilizerConfig,
    pub field_lines: FieldLineConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub input_size: usize,
    pub confidence_threshold: f32,
    pub nms_iou_threshold: f32,
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub max_match_distance: f32,
    pub max_coast_frames: u32,
    pub position_smoothing: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Largest frame-to-frame change (pixels) accepted without hysteresis
    pub max_jump_px: f32,
    /// Consecutive large jumps rejected before a new position is accepted
    pub confirm_frames: u32,
    /// Weight given to the current frame's value when smoothing
    pub smoothing_weight: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            max_jump_px: 50.0,
            confirm_frames: 5,
            smoothing_weight: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldLineConfig {
    pub canny_low: f64,
    pub canny_high: f64,
    pub hough_threshold: i32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub save_annotated: bool,
    pub correct_perspective: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// A detected field line segment in frame pixel coordinates.
///
/// Equality is exact: the perspective cache treats any coordinate change,
/// however small, as a different line set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl FieldLine {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// Stabilized 2-D position of a tracked player, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
}

/// Endpoints of the rendered VAR line, always a full-width horizontal segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl VarLine {
    pub fn horizontal(y: i32, frame_width: i32) -> Self {
        Self {
            x1: 0,
            y1: y,
            x2: frame_width,
            y2: y,
        }
    }
}
