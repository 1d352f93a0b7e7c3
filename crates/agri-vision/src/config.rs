//! Model and preprocessing configuration.
//!
//! Every value can be overridden from the environment; defaults match the
//! ImageNet-trained ResNet classifier and the COCO YOLOv8n detector.

/// ImageNet channel means (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Default crop health label set.
pub const DEFAULT_CROP_HEALTH_LABELS: &[&str] = &["Healthy", "Diseased"];

/// Default confidence threshold for pest detection.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Resize, crop and normalization parameters for the classifier input.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Target length of the shorter image side after resizing
    pub resize_edge: u32,
    /// Side of the square center crop fed to the model
    pub crop_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            resize_edge: 256,
            crop_size: 224,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

/// Crop health classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Name of the logits output tensor
    pub output_name: String,
    /// Labels indexed by `class index % labels.len()`
    pub labels: Vec<String>,
    pub preprocess: PreprocessConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: "models/crop_health/resnet18.onnx".to_string(),
            output_name: "output".to_string(),
            labels: DEFAULT_CROP_HEALTH_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

/// Pest detector configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Input image size (model expects square input)
    pub input_size: u32,
    /// Number of classes the model scores per candidate box
    pub num_classes: usize,
    /// Confidence threshold applied to every request
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/pest_detection/yolov8n.onnx".to_string(),
            input_size: 640,
            num_classes: 80,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: 0.45,
        }
    }
}

/// Combined vision configuration.
#[derive(Debug, Clone, Default)]
pub struct VisionConfig {
    pub classifier: ClassifierConfig,
    pub detector: DetectorConfig,
}

impl VisionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let classifier_defaults = ClassifierConfig::default();
        let preprocess_defaults = PreprocessConfig::default();
        let detector_defaults = DetectorConfig::default();

        Self {
            classifier: ClassifierConfig {
                model_path: std::env::var("CLASSIFIER_MODEL_PATH")
                    .unwrap_or(classifier_defaults.model_path),
                output_name: std::env::var("CLASSIFIER_OUTPUT_NAME")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(classifier_defaults.output_name),
                labels: std::env::var("CROP_HEALTH_LABELS")
                    .ok()
                    .map(|s| parse_labels(&s))
                    .filter(|labels| !labels.is_empty())
                    .unwrap_or(classifier_defaults.labels),
                preprocess: PreprocessConfig {
                    resize_edge: env_parse("PREPROCESS_RESIZE_EDGE")
                        .unwrap_or(preprocess_defaults.resize_edge),
                    crop_size: env_parse("PREPROCESS_CROP_SIZE")
                        .unwrap_or(preprocess_defaults.crop_size),
                    ..preprocess_defaults
                },
            },
            detector: DetectorConfig {
                model_path: std::env::var("DETECTOR_MODEL_PATH")
                    .unwrap_or(detector_defaults.model_path),
                input_size: env_parse("DETECTOR_INPUT_SIZE").unwrap_or(detector_defaults.input_size),
                num_classes: env_parse("DETECTOR_NUM_CLASSES")
                    .unwrap_or(detector_defaults.num_classes),
                confidence_threshold: env_parse("PEST_CONFIDENCE_THRESHOLD")
                    .unwrap_or(detector_defaults.confidence_threshold),
                nms_threshold: env_parse("DETECTOR_NMS_THRESHOLD")
                    .unwrap_or(detector_defaults.nms_threshold),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Parse a comma-separated label list, dropping empty entries.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
