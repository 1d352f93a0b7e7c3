//! Pest detection using a YOLOv8 ONNX model.
//!
//! YOLOv8 output format: `[1, 4 + num_classes, num_boxes]`
//! - 4 bbox values (cx, cy, w, h) in model input pixels
//! - one score per class
//!
//! Candidates at or below the requested confidence are dropped, then per-class NMS
//! removes overlapping boxes. Survivors are emitted by descending confidence.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::{Array4, ArrayView2};
use ort::session::Session;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::engine::{DetectionEngine, RawDetection};
use crate::error::{VisionError, VisionResult};

use super::session::{create_session, run_single_output};

/// Output tensor name of Ultralytics YOLOv8 exports.
const YOLO_OUTPUT: &str = "output0";

/// YOLOv8 detector running on ONNX Runtime.
pub struct OnnxDetector {
    session: Mutex<Session>,
    config: DetectorConfig,
}

impl OnnxDetector {
    /// Create a new detector from config.
    ///
    /// Returns error if model file doesn't exist or cannot be loaded.
    pub fn new(config: DetectorConfig) -> VisionResult<Self> {
        if config.input_size == 0 || config.num_classes == 0 {
            return Err(VisionError::invalid_config(
                "detector input_size and num_classes must be positive",
            ));
        }

        let session = Mutex::new(create_session(Path::new(&config.model_path), "pest_detection")?);
        info!(
            model_path = %config.model_path,
            input_size = config.input_size,
            num_classes = config.num_classes,
            "Pest detector initialized"
        );

        Ok(Self { session, config })
    }
}

impl DetectionEngine for OnnxDetector {
    fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> VisionResult<Vec<RawDetection>> {
        let (width, height) = image.dimensions();
        let input = detector_input(image, self.config.input_size);
        let outputs = run_single_output(&self.session, &input, YOLO_OUTPUT)?;

        let candidates = decode_yolo_output(
            &outputs,
            self.config.num_classes,
            self.config.input_size,
            width,
            height,
            confidence_threshold,
        )?;
        let detections = non_maximum_suppression(candidates, self.config.nms_threshold);

        debug!(
            candidates = detections.len(),
            threshold = confidence_threshold,
            "Pest detector finished"
        );

        Ok(detections)
    }
}

/// Stretch to an `input_size` square and scale to [0, 1], NCHW.
///
/// No letterboxing: box coordinates are mapped back per axis.
pub fn detector_input(image: &DynamicImage, input_size: u32) -> Array4<f32> {
    let rgb = image
        .resize_exact(input_size, input_size, FilterType::Triangle)
        .to_rgb8();
    let side = input_size as usize;

    Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}

/// Parse raw YOLOv8 output into thresholded candidates.
///
/// Boxes are returned in normalized coordinates of the original image.
pub fn decode_yolo_output(
    outputs: &[f32],
    num_classes: usize,
    input_size: u32,
    orig_width: u32,
    orig_height: u32,
    confidence_threshold: f32,
) -> VisionResult<Vec<RawDetection>> {
    let num_features = 4 + num_classes;
    if outputs.is_empty() || outputs.len() % num_features != 0 {
        return Err(VisionError::inference(format!(
            "Unexpected output size {} for {} classes",
            outputs.len(),
            num_classes
        )));
    }
    let num_boxes = outputs.len() / num_features;

    // Output is [num_features, num_boxes]; view it transposed as [num_boxes, num_features]
    let output_array = ArrayView2::from_shape((num_features, num_boxes), outputs)
        .map_err(|e| VisionError::inference(format!("Failed to reshape output: {}", e)))?;
    let transposed = output_array.t();

    let input_size = input_size as f32;
    let scale_w = orig_width as f32 / input_size;
    let scale_h = orig_height as f32 / input_size;

    let mut candidates = Vec::new();

    for i in 0..num_boxes {
        let cx = transposed[[i, 0]];
        let cy = transposed[[i, 1]];
        let w = transposed[[i, 2]];
        let h = transposed[[i, 3]];

        let mut best_class = 0;
        let mut best_score = 0.0f32;

        for c in 0..num_classes {
            let score = transposed[[i, 4 + c]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        // Ultralytics keeps strictly greater scores
        if best_score <= confidence_threshold {
            continue;
        }

        // Center format -> corner format, scaled back to the original image
        let x_norm = (cx - w / 2.0) * scale_w / orig_width as f32;
        let y_norm = (cy - h / 2.0) * scale_h / orig_height as f32;
        let w_norm = w * scale_w / orig_width as f32;
        let h_norm = h * scale_h / orig_height as f32;

        let x_clamped = x_norm.clamp(0.0, 1.0);
        let y_clamped = y_norm.clamp(0.0, 1.0);

        candidates.push(RawDetection {
            x: x_clamped,
            y: y_clamped,
            width: w_norm.min(1.0 - x_clamped),
            height: h_norm.min(1.0 - y_clamped),
            class_id: best_class,
            confidence: best_score,
        });
    }

    Ok(candidates)
}

/// Apply Non-Maximum Suppression to remove overlapping same-class detections.
pub fn non_maximum_suppression(
    mut detections: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    if detections.is_empty() {
        return detections;
    }

    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }

        keep.push(detections[i].clone());

        for j in (i + 1)..detections.len() {
            if suppressed[j] || detections[i].class_id != detections[j].class_id {
                continue;
            }

            if detections[i].iou(&detections[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}
