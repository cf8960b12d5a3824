// src/perspective.rs
//
// Single-slot memo for the field-to-rectangle homography. Field line
// detections are stable for long stretches of broadcast footage, so the
// transform from the previous frame is usually reusable as-is.

use crate::types::FieldLine;
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point2f, Scalar, Vector},
    imgproc,
    prelude::*,
};
use tracing::debug;

/// Outcome of a perspective-correction attempt. The pipeline decides what
/// to do with a skipped frame; this component never panics or propagates.
#[derive(Debug)]
pub enum Correction {
    Corrected(Mat),
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum SkipReason {
    /// Fewer than 4 field lines — not enough constraints for a homography.
    InsufficientLines(usize),
    /// The transform could not be computed or applied (degenerate points,
    /// malformed frame). The cached entry, if any, is left intact.
    Computation(String),
}

pub struct PerspectiveCache {
    last_lines: Option<Vec<FieldLine>>,
    last_matrix: Option<Mat>,
    computations: u64,
}

impl PerspectiveCache {
    pub fn new() -> Self {
        Self {
            last_lines: None,
            last_matrix: None,
            computations: 0,
        }
    }

    /// Rectify `frame` using the homography implied by `field_lines`.
    ///
    /// Reuses the cached matrix when the line set is identical to the
    /// previous call (exact scalar equality). On a miss the matrix is
    /// recomputed and the slot overwritten; on failure the slot keeps its
    /// previous entry.
    pub fn correct(&mut self, frame: &Mat, field_lines: &[FieldLine]) -> Correction {
        if field_lines.len() < 4 {
            return Correction::Skipped(SkipReason::InsufficientLines(field_lines.len()));
        }

        if let (Some(last), Some(matrix)) = (&self.last_lines, &self.last_matrix) {
            if last.as_slice() == field_lines {
                debug!("Perspective cache hit");
                return match warp(frame, matrix) {
                    Ok(warped) => Correction::Corrected(warped),
                    Err(e) => Correction::Skipped(SkipReason::Computation(e.to_string())),
                };
            }
        }

        match self.recompute(frame, field_lines) {
            Ok(warped) => Correction::Corrected(warped),
            Err(e) => Correction::Skipped(SkipReason::Computation(e.to_string())),
        }
    }

    /// How many times the transform has actually been computed (misses).
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn has_entry(&self) -> bool {
        self.last_matrix.is_some()
    }

    fn recompute(&mut self, frame: &Mat, field_lines: &[FieldLine]) -> Result<Mat> {
        // The first 4 endpoints of the first 4 lines, in detection order,
        // paired positionally with the frame corners. Fragile but preserved
        // for compatibility with the upstream detector's ordering.
        let mut src_pts = Vector::<Point2f>::new();
        for line in field_lines.iter().take(4) {
            src_pts.push(Point2f::new(line.x1, line.y1));
            src_pts.push(Point2f::new(line.x2, line.y2));
        }
        let src_pts: Vector<Point2f> = src_pts.iter().take(4).collect();

        let size = frame.size()?;
        let (width, height) = (size.width as f32, size.height as f32);
        let dst_pts = Vector::<Point2f>::from_slice(&[
            Point2f::new(0.0, 0.0),
            Point2f::new(width, 0.0),
            Point2f::new(0.0, height),
            Point2f::new(width, height),
        ]);

        debug!("Perspective cache miss, recomputing transform");
        self.computations += 1;
        let matrix = imgproc::get_perspective_transform(&src_pts, &dst_pts, core::DECOMP_LU)?;
        let warped = warp(frame, &matrix)?;

        // Store only after the full compute-and-apply succeeded, so a failed
        // attempt cannot evict a still-valid entry.
        self.last_matrix = Some(matrix);
        self.last_lines = Some(field_lines.to_vec());

        Ok(warped)
    }
}

fn warp(frame: &Mat, matrix: &Mat) -> Result<Mat> {
    let size = frame.size()?;
    if size.width <= 0 || size.height <= 0 {
        anyhow::bail!("empty frame");
    }
    let mut warped = Mat::default();
    imgproc::warp_perspective(
        frame,
        &mut warped,
        matrix,
        size,
        imgproc::INTER_LINEAR,
        core::BORDER_CONSTANT,
        Scalar::default(),
    )?;
    Ok(warped)
}
