//! Crop health classifier backed by an ONNX image classification model.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use tracing::info;

use crate::classification::softmax;
use crate::config::ClassifierConfig;
use crate::engine::ClassificationEngine;
use crate::error::VisionResult;

use super::session::{create_session, run_single_output};

/// ONNX classifier that returns softmax probabilities over the model's logits.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxClassifier {
    /// Load the classifier model.
    ///
    /// Returns error if model file doesn't exist or cannot be loaded.
    pub fn new(config: &ClassifierConfig) -> VisionResult<Self> {
        let session = create_session(Path::new(&config.model_path), "crop_health")?;
        info!(
            model_path = %config.model_path,
            output_name = %config.output_name,
            "Crop health classifier initialized"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name: config.output_name.clone(),
        })
    }
}

impl ClassificationEngine for OnnxClassifier {
    fn classify(&self, input: &Array4<f32>) -> VisionResult<Vec<f32>> {
        // Batch of one: the output holds a single row of logits.
        let logits = run_single_output(&self.session, input, &self.output_name)?;
        Ok(softmax(&logits))
    }
}
