//! Image inference adapters for the AgriAI backend.
//!
//! This crate provides:
//! - Image decoding and classifier preprocessing
//! - Crop health classification with a fixed label set
//! - Pest detection with optional engine availability
//! - ONNX Runtime engines (CUDA/CoreML/CPU)

pub mod classification;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod onnx;
pub mod preprocess;

pub use classification::ClassificationAdapter;
pub use config::{ClassifierConfig, DetectorConfig, PreprocessConfig, VisionConfig};
pub use detection::{DetectionAdapter, DetectorAvailability, PestOutcome, PLACEHOLDER_PEST_CLASS};
pub use engine::{ClassificationEngine, DetectionEngine, RawDetection};
pub use error::{VisionError, VisionResult};
pub use onnx::{OnnxClassifier, OnnxDetector};
pub use preprocess::ImagePreprocessor;
