//! Wire types for the image prediction endpoints.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body returned by `/predict_pest` when the detection model failed to load.
pub const DETECTOR_UNAVAILABLE_MESSAGE: &str = "YOLO model not available";

/// Crop health classification for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    pub class_label: String,
    /// Probability of the winning class, in [0, 1].
    pub confidence: f32,
    /// Always serialized, `null` when absent.
    pub note: Option<String>,
}

impl ClassificationResult {
    pub fn new(class_label: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            note: None,
        }
    }
}

/// One detected object reduced to its class name and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
        }
    }
}

/// Response of `/predict_pest`.
///
/// The unavailable variant is a successful response with degraded content,
/// not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PestDetectionResponse {
    Detections { detections: Vec<Detection> },
    Unavailable { error: String },
}

impl PestDetectionResponse {
    pub fn detections(detections: Vec<Detection>) -> Self {
        Self::Detections { detections }
    }

    pub fn unavailable() -> Self {
        Self::Unavailable {
            error: DETECTOR_UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

/// Uniform failure body for every prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification_note_serialized_as_null() {
        let value = serde_json::to_value(ClassificationResult::new("Healthy", 0.75)).unwrap();
        assert_eq!(
            value,
            json!({"class_label": "Healthy", "confidence": 0.75, "note": null})
        );
    }

    #[test]
    fn test_detection_uses_class_key() {
        let value = serde_json::to_value(Detection::new("Detected Pest", 0.5)).unwrap();
        assert_eq!(value, json!({"class": "Detected Pest", "confidence": 0.5}));
    }

    #[test]
    fn test_pest_response_shapes() {
        let ok = serde_json::to_value(PestDetectionResponse::detections(vec![])).unwrap();
        assert_eq!(ok, json!({"detections": []}));

        let degraded = serde_json::to_value(PestDetectionResponse::unavailable()).unwrap();
        assert_eq!(degraded, json!({"error": "YOLO model not available"}));
    }

    #[test]
    fn test_pest_response_roundtrip_picks_variant() {
        let parsed: PestDetectionResponse =
            serde_json::from_value(json!({"error": "YOLO model not available"})).unwrap();
        assert_eq!(parsed, PestDetectionResponse::unavailable());
    }

    #[test]
    fn test_error_response_schema_has_error_field() {
        let schema = schemars::schema_for!(ErrorResponse);
        let value = serde_json::to_value(&schema).unwrap();
        assert!(value["properties"]["error"].is_object());
    }
}
