//! Inference engine seams.
//!
//! The adapters only talk to models through these traits. The ONNX Runtime
//! implementations live in [`crate::onnx`]; tests substitute fakes or mocks.

use image::DynamicImage;
use ndarray::Array4;

use crate::error::VisionResult;

/// Image classification engine.
#[cfg_attr(test, mockall::automock)]
pub trait ClassificationEngine: Send + Sync {
    /// Run the model on a normalized `[1, 3, H, W]` tensor.
    ///
    /// Returns one probability per native model class.
    fn classify(&self, input: &Array4<f32>) -> VisionResult<Vec<f32>>;
}

/// Object detection engine.
#[cfg_attr(test, mockall::automock)]
pub trait DetectionEngine: Send + Sync {
    /// Detect objects, dropping candidates at or below `confidence_threshold`.
    fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> VisionResult<Vec<RawDetection>>;
}

/// Detection as emitted by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Bounding box in normalized coordinates [0, 1]
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Model class ID
    pub class_id: usize,
    /// Detection confidence [0, 1]
    pub confidence: f32,
}

impl RawDetection {
    /// Get area (normalized).
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over Union with another detection.
    pub fn iou(&self, other: &RawDetection) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, width: f32, height: f32) -> RawDetection {
        RawDetection {
            x,
            y,
            width,
            height,
            class_id: 0,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_area() {
        let det = boxed(0.1, 0.2, 0.3, 0.4);
        assert!((det.area() - 0.12).abs() < 0.001);
    }

    #[test]
    fn test_iou() {
        let a = boxed(0.0, 0.0, 0.5, 0.5);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);

        let disjoint = boxed(0.6, 0.6, 0.2, 0.2);
        assert_eq!(a.iou(&disjoint), 0.0);

        // Half overlap: intersection 0.125, union 0.375
        let shifted = boxed(0.25, 0.0, 0.5, 0.5);
        assert!((a.iou(&shifted) - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_boxes() {
        let empty = boxed(0.1, 0.1, 0.0, 0.0);
        assert_eq!(empty.iou(&empty), 0.0);
    }
}
