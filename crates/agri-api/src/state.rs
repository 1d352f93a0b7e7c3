//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use agri_vision::{
    ClassificationAdapter, DetectionAdapter, ImagePreprocessor, OnnxClassifier, OnnxDetector,
    VisionConfig,
};

use crate::config::ApiConfig;

/// Shared application state.
///
/// Built once at startup and never mutated afterwards; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub classifier: Arc<ClassificationAdapter>,
    pub detector: Arc<DetectionAdapter>,
}

impl AppState {
    /// Load both models and build the state.
    ///
    /// The classifier is required. A detector that fails to load leaves the
    /// pest endpoint running in degraded mode.
    pub fn new(config: ApiConfig, vision: &VisionConfig) -> anyhow::Result<Self> {
        let preprocessor = ImagePreprocessor::new(vision.classifier.preprocess.clone())
            .context("invalid classifier preprocessing config")?;
        let engine = OnnxClassifier::new(&vision.classifier)
            .context("failed to load crop health classifier")?;
        let classifier = ClassificationAdapter::new(
            preprocessor,
            Arc::new(engine),
            vision.classifier.labels.clone(),
        )
        .context("invalid crop health label set")?;

        info!(labels = ?classifier.labels(), "Crop health classifier ready");

        let detector = match OnnxDetector::new(vision.detector.clone()) {
            Ok(engine) => {
                DetectionAdapter::available(Arc::new(engine), vision.detector.confidence_threshold)
            }
            Err(e) => {
                warn!(error = %e, "Pest detection model could not be loaded, serving degraded responses");
                DetectionAdapter::unavailable(e.to_string())
            }
        };

        Ok(Self::with_adapters(config, classifier, detector))
    }

    /// Build state from already constructed adapters.
    pub fn with_adapters(
        config: ApiConfig,
        classifier: ClassificationAdapter,
        detector: DetectionAdapter,
    ) -> Self {
        Self {
            config,
            classifier: Arc::new(classifier),
            detector: Arc::new(detector),
        }
    }
}
