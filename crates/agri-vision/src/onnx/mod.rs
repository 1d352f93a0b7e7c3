//! ONNX Runtime engines for crop health classification and pest detection.

pub mod classifier;
pub mod object_detector;
pub mod session;

pub use classifier::OnnxClassifier;
pub use object_detector::OnnxDetector;
pub use session::create_session;
