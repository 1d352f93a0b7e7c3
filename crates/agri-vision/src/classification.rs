//! Crop health classification adapter.
//!
//! Wraps a [`ClassificationEngine`] and maps its probability vector onto a
//! fixed label set.
//!
//! # Label wraparound
//!
//! The winning index is reduced modulo the label count. An ImageNet model
//! with 1000 outputs therefore still yields one of the configured labels, but
//! the label is meaningless unless the model was trained on that label set.
//! The behavior is kept as-is and logged whenever a wrap actually happens.

use std::sync::Arc;

use agri_models::ClassificationResult;
use tracing::{debug, warn};

use crate::engine::ClassificationEngine;
use crate::error::{VisionError, VisionResult};
use crate::preprocess::ImagePreprocessor;

/// Turns uploaded image bytes into a labelled classification.
pub struct ClassificationAdapter {
    preprocessor: ImagePreprocessor,
    engine: Arc<dyn ClassificationEngine>,
    labels: Vec<String>,
}

impl ClassificationAdapter {
    /// Create an adapter. The label set must not be empty.
    pub fn new(
        preprocessor: ImagePreprocessor,
        engine: Arc<dyn ClassificationEngine>,
        labels: Vec<String>,
    ) -> VisionResult<Self> {
        if labels.is_empty() {
            return Err(VisionError::invalid_config("label set must not be empty"));
        }
        Ok(Self {
            preprocessor,
            engine,
            labels,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Decode, preprocess and classify one image.
    pub fn classify(&self, image_bytes: &[u8]) -> VisionResult<ClassificationResult> {
        let input = self.preprocessor.prepare(image_bytes)?;
        let probabilities = self.engine.classify(&input)?;
        let (class_label, confidence) = self.select_label(&probabilities)?;

        debug!(
            class_label = %class_label,
            confidence,
            num_classes = probabilities.len(),
            "Crop health classified"
        );

        Ok(ClassificationResult::new(class_label, confidence))
    }

    /// Pick the most probable class and map it onto the label set.
    pub fn select_label(&self, probabilities: &[f32]) -> VisionResult<(String, f32)> {
        let (index, confidence) = argmax(probabilities)
            .ok_or_else(|| VisionError::inference("model returned no class probabilities"))?;

        let label_index = index % self.labels.len();
        if label_index != index {
            warn!(
                class_index = index,
                label_index,
                num_labels = self.labels.len(),
                "Class index wrapped onto label set"
            );
        }

        Ok((self.labels[label_index].clone(), confidence))
    }
}

/// Index and value of the largest element. The first maximum wins on ties.
///
/// NaN entries never win; an all-NaN vector selects index 0.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut iter = values.iter().copied().enumerate();
    let first = iter.next()?;

    Some(iter.fold(first, |best, (i, v)| {
        if v > best.1 || (best.1.is_nan() && !v.is_nan()) {
            (i, v)
        } else {
            best
        }
    }))
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}
