// src/overlay.rs

use crate::types::{PlayerPosition, VarLine};
use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

const LINE_COLOR: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0); // red (BGR)
const GLOW_COLOR: Scalar = Scalar::new(255.0, 255.0, 255.0, 0.0);
const SHADOW_COLOR: Scalar = Scalar::new(0.0, 0.0, 100.0, 0.0);
const ONSIDE_COLOR: Scalar = Scalar::new(0.0, 255.0, 0.0, 0.0);
const OFFSIDE_COLOR: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
const MARKER_RING_COLOR: Scalar = Scalar::new(255.0, 255.0, 255.0, 0.0);

const TICK_SPACING: i32 = 100;
const MARKER_RADIUS: i32 = 8;

/// Draw the VAR line with glow, shadow, tick marks and label.
pub fn draw_var_line(frame: &mut Mat, line: &VarLine) -> Result<()> {
    let width = frame.size()?.width;
    let (p1, p2) = (Point::new(line.x1, line.y1), Point::new(line.x2, line.y2));

    imgproc::line(frame, p1, p2, LINE_COLOR, 3, imgproc::LINE_8, 0)?;

    // Thin highlight above and shadow below make the line readable on grass.
    imgproc::line(
        frame,
        Point::new(line.x1, line.y1 - 2),
        Point::new(line.x2, line.y2 - 2),
        GLOW_COLOR,
        1,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::line(
        frame,
        Point::new(line.x1, line.y1 + 2),
        Point::new(line.x2, line.y2 + 2),
        SHADOW_COLOR,
        1,
        imgproc::LINE_8,
        0,
    )?;

    for x in (0..width).step_by(TICK_SPACING as usize) {
        imgproc::line(
            frame,
            Point::new(x, line.y1 - 10),
            Point::new(x, line.y1 + 10),
            LINE_COLOR,
            2,
            imgproc::LINE_8,
            0,
        )?;
    }

    imgproc::put_text(
        frame,
        "VAR Line",
        Point::new(width / 2 - 50, line.y1 - 15),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.7,
        LINE_COLOR,
        2,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(())
}

/// Mark each player green (onside, at or below the line) or red (ahead of
/// the line), with a white ring for visibility.
pub fn draw_player_markers(
    frame: &mut Mat,
    positions: &[PlayerPosition],
    line_y: i32,
) -> Result<()> {
    for position in positions {
        let center = Point::new(position.x as i32, position.y as i32);
        let color = marker_color(position.y as i32, line_y);

        imgproc::circle(frame, center, MARKER_RADIUS, color, -1, imgproc::LINE_8, 0)?;
        imgproc::circle(
            frame,
            center,
            MARKER_RADIUS,
            MARKER_RING_COLOR,
            2,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}

fn marker_color(player_y: i32, line_y: i32) -> Scalar {
    if player_y >= line_y {
        ONSIDE_COLOR
    } else {
        OFFSIDE_COLOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, Vec3b};

    #[test]
    fn marker_color_threshold_is_at_or_below_line() {
        assert_eq!(marker_color(200, 150), ONSIDE_COLOR);
        assert_eq!(marker_color(150, 150), ONSIDE_COLOR);
        assert_eq!(marker_color(149, 150), OFFSIDE_COLOR);
    }

    #[test]
    fn var_line_is_drawn_in_red_at_its_y() {
        let mut frame =
            Mat::new_rows_cols_with_default(200, 400, core::CV_8UC3, Scalar::all(0.0)).unwrap();
        let line = VarLine::horizontal(120, 400);

        draw_var_line(&mut frame, &line).unwrap();

        let px: Vec3b = *frame.at_2d::<Vec3b>(120, 200).unwrap();
        assert_eq!(px, Vec3b::from([0, 0, 255]));
    }

    #[test]
    fn onside_marker_center_is_green() {
        let mut frame =
            Mat::new_rows_cols_with_default(200, 400, core::CV_8UC3, Scalar::all(0.0)).unwrap();
        let positions = [PlayerPosition { x: 100.0, y: 180.0 }];

        draw_player_markers(&mut frame, &positions, 120).unwrap();

        let px: Vec3b = *frame.at_2d::<Vec3b>(180, 100).unwrap();
        assert_eq!(px, Vec3b::from([0, 255, 0]));
    }
}
