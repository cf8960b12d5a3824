// src/field_lines.rs

use crate::types::{FieldLine, FieldLineConfig};
use anyhow::Result;
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
};
use tracing::debug;

/// Detect raw field line segments with Canny + probabilistic Hough.
pub fn detect_field_lines(frame: &Mat, config: &FieldLineConfig) -> Result<Vec<FieldLine>> {
    let mut gray = Mat::default();
    imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

    let mut edges = Mat::default();
    imgproc::canny(
        &gray,
        &mut edges,
        config.canny_low,
        config.canny_high,
        3,
        false,
    )?;

    let mut segments = Vector::<Vec4i>::new();
    imgproc::hough_lines_p(
        &edges,
        &mut segments,
        1.0,
        std::f64::consts::PI / 180.0,
        config.hough_threshold,
        config.min_line_length,
        config.max_line_gap,
    )?;

    let lines: Vec<FieldLine> = segments
        .iter()
        .map(|s| FieldLine::new(s[0] as f32, s[1] as f32, s[2] as f32, s[3] as f32))
        .collect();

    debug!("Detected {} raw field line segments", lines.len());
    Ok(lines)
}

/// Keep the 4 most relevant lines: sort by the first endpoint's y and take
/// the topmost 4. Detector-order heuristic, kept as-is.
pub fn refine_field_lines(mut field_lines: Vec<FieldLine>) -> Vec<FieldLine> {
    field_lines.sort_by(|a, b| a.y1.total_cmp(&b.y1));
    field_lines.truncate(4);
    field_lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_sorts_by_y1_and_keeps_four() {
        let lines = vec![
            FieldLine::new(0.0, 90.0, 10.0, 90.0),
            FieldLine::new(0.0, 10.0, 10.0, 10.0),
            FieldLine::new(0.0, 50.0, 10.0, 50.0),
            FieldLine::new(0.0, 30.0, 10.0, 30.0),
            FieldLine::new(0.0, 70.0, 10.0, 70.0),
        ];

        let refined = refine_field_lines(lines);
        assert_eq!(refined.len(), 4);
        let ys: Vec<f32> = refined.iter().map(|l| l.y1).collect();
        assert_eq!(ys, vec![10.0, 30.0, 50.0, 70.0]);
    }

    #[test]
    fn refine_passes_short_sets_through_sorted() {
        let lines = vec![
            FieldLine::new(0.0, 40.0, 10.0, 40.0),
            FieldLine::new(0.0, 20.0, 10.0, 20.0),
        ];

        let refined = refine_field_lines(lines);
        assert_eq!(refined.len(), 2);
        assert_eq!(refined[0].y1, 20.0);
    }
}
