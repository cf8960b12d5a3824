// src/player_detection.rs

use anyhow::Result;
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use tracing::{debug, info};

// COCO class 0 = person
const PERSON_CLASS: usize = 0;
const YOLO_CLASSES: usize = 80;

#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: [f32; 4], // [x1, y1, x2, y2] in frame coordinates
    pub confidence: f32,
}

impl Detection {
    /// Ground contact point: bottom-center of the bounding box.
    pub fn foot_point(&self) -> (f32, f32) {
        ((self.bbox[0] + self.bbox[2]) / 2.0, self.bbox[3])
    }
}

pub struct PlayerDetector {
    session: Session,
    input_size: usize,
    nms_iou_threshold: f32,
}

impl PlayerDetector {
    pub fn new(
        model_path: &str,
        input_size: usize,
        nms_iou_threshold: f32,
        num_threads: usize,
    ) -> Result<Self> {
        info!("Loading player detection model: {}", model_path);

        let session = Session::builder()?
            .with_execution_providers([CUDAExecutionProvider::default().with_device_id(0).build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_threads)?
            .commit_from_file(model_path)?;

        info!("✓ Player detector initialized");
        Ok(Self {
            session,
            input_size,
            nms_iou_threshold,
        })
    }

    pub fn detect(&mut self, frame: &Mat, confidence_threshold: f32) -> Result<Vec<Detection>> {
        let (input, scale, pad_x, pad_y) = self.preprocess(frame)?;
        let output = self.infer(&input)?;
        let detections = self.postprocess(&output, scale, pad_x, pad_y, confidence_threshold);

        debug!("Detected {} players", detections.len());
        Ok(detections)
    }

    /// Letterbox the frame into a square RGB input, normalized to [0, 1] CHW.
    fn preprocess(&self, frame: &Mat) -> Result<(Vec<f32>, f32, f32, f32)> {
        let target = self.input_size;
        let size = frame.size()?;
        let (src_w, src_h) = (size.width as f32, size.height as f32);

        let scale = (target as f32 / src_w).min(target as f32 / src_h);
        let scaled_w = (src_w * scale) as i32;
        let scaled_h = (src_h * scale) as i32;
        let pad_x = (target as i32 - scaled_w) as f32 / 2.0;
        let pad_y = (target as i32 - scaled_h) as f32 / 2.0;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(scaled_w, scaled_h),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;
        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        // Gray letterbox canvas with the resized frame centered in it.
        let mut canvas = vec![114u8; target * target * 3];
        let data = rgb.data_bytes()?;
        for y in 0..scaled_h as usize {
            let src_start = y * scaled_w as usize * 3;
            let dst_start = ((y + pad_y as usize) * target + pad_x as usize) * 3;
            let row_len = scaled_w as usize * 3;
            canvas[dst_start..dst_start + row_len]
                .copy_from_slice(&data[src_start..src_start + row_len]);
        }

        // HWC u8 -> CHW f32
        let mut input = vec![0.0f32; 3 * target * target];
        for c in 0..3 {
            for i in 0..target * target {
                input[c * target * target + i] = canvas[i * 3 + c] as f32 / 255.0;
            }
        }

        Ok((input, scale, pad_x, pad_y))
    }

    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let shape = [1usize, 3, self.input_size, self.input_size];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.to_vec().into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["images" => input_value])?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }

    fn postprocess(
        &self,
        output: &[f32],
        scale: f32,
        pad_x: f32,
        pad_y: f32,
        confidence_threshold: f32,
    ) -> Vec<Detection> {
        // YOLOv8 output layout: [1, 4 + classes, predictions]
        let num_predictions = output.len() / (4 + YOLO_CLASSES);
        let mut detections = Vec::new();

        for i in 0..num_predictions {
            let confidence = output[num_predictions * (4 + PERSON_CLASS) + i];
            if confidence < confidence_threshold {
                continue;
            }

            let cx = output[i];
            let cy = output[num_predictions + i];
            let w = output[num_predictions * 2 + i];
            let h = output[num_predictions * 3 + i];

            // Center format -> corners, then undo the letterbox.
            let x1 = (cx - w / 2.0 - pad_x) / scale;
            let y1 = (cy - h / 2.0 - pad_y) / scale;
            let x2 = (cx + w / 2.0 - pad_x) / scale;
            let y2 = (cy + h / 2.0 - pad_y) / scale;

            detections.push(Detection {
                bbox: [x1, y1, x2, y2],
                confidence,
            });
        }

        nms(detections, self.nms_iou_threshold)
    }
}

fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::new();
    'candidates: for det in detections {
        for kept in &keep {
            if iou(&kept.bbox, &det.bbox) >= iou_threshold {
                continue 'candidates;
            }
        }
        keep.push(det);
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f32; 4], confidence: f32) -> Detection {
        Detection { bbox, confidence }
    }

    #[test]
    fn nms_suppresses_overlapping_detections() {
        let detections = vec![
            det([100.0, 100.0, 140.0, 200.0], 0.9),
            det([102.0, 101.0, 142.0, 198.0], 0.6), // same player
            det([400.0, 120.0, 440.0, 220.0], 0.8),
        ];

        let kept = nms(detections, 0.45);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.8);
    }

    #[test]
    fn foot_point_is_bottom_center() {
        let d = det([100.0, 50.0, 140.0, 170.0], 0.9);
        assert_eq!(d.foot_point(), (120.0, 170.0));
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(
            iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]),
            0.0
        );
    }
}
