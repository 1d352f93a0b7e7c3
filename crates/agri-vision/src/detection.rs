//! Pest detection adapter.
//!
//! The detector is optional: when its model fails to load at startup the
//! adapter is built as [`DetectorAvailability::Unavailable`] and every request
//! short-circuits to [`PestOutcome::EngineUnavailable`] without decoding the
//! upload or touching an engine.

use std::sync::Arc;

use agri_models::Detection;
use tracing::debug;

use crate::engine::DetectionEngine;
use crate::error::VisionResult;
use crate::preprocess::decode_image;

/// Class name reported for every detection.
///
/// Detection class IDs are not mapped to pest names yet; swap this for a
/// class-ID lookup table once a pest-specific model is wired in.
pub const PLACEHOLDER_PEST_CLASS: &str = "Detected Pest";

/// Whether a detection engine was loaded at startup.
#[derive(Clone)]
pub enum DetectorAvailability {
    Available(Arc<dyn DetectionEngine>),
    Unavailable { reason: String },
}

impl DetectorAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, DetectorAvailability::Available(_))
    }
}

impl std::fmt::Debug for DetectorAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorAvailability::Available(_) => f.write_str("Available"),
            DetectorAvailability::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Result of a pest detection request.
#[derive(Debug, Clone, PartialEq)]
pub enum PestOutcome {
    /// Detections in engine order, possibly empty.
    Detections(Vec<Detection>),
    /// The engine failed to load at startup; nothing was inferred.
    EngineUnavailable,
}

/// Turns uploaded image bytes into pest detection records.
#[derive(Debug, Clone)]
pub struct DetectionAdapter {
    availability: DetectorAvailability,
    confidence_threshold: f32,
}

impl DetectionAdapter {
    pub fn available(engine: Arc<dyn DetectionEngine>, confidence_threshold: f32) -> Self {
        Self {
            availability: DetectorAvailability::Available(engine),
            confidence_threshold,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            availability: DetectorAvailability::Unavailable {
                reason: reason.into(),
            },
            confidence_threshold: crate::config::DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn availability(&self) -> &DetectorAvailability {
        &self.availability
    }

    pub fn is_available(&self) -> bool {
        self.availability.is_available()
    }

    /// Detect pests with the configured confidence threshold.
    pub fn detect_default(&self, image_bytes: &[u8]) -> VisionResult<PestOutcome> {
        self.detect(image_bytes, self.confidence_threshold)
    }

    /// Detect pests, keeping detections above `confidence_threshold`.
    pub fn detect(&self, image_bytes: &[u8], confidence_threshold: f32) -> VisionResult<PestOutcome> {
        let engine = match &self.availability {
            DetectorAvailability::Available(engine) => engine,
            DetectorAvailability::Unavailable { reason } => {
                debug!(reason = %reason, "Pest detection skipped, engine unavailable");
                return Ok(PestOutcome::EngineUnavailable);
            }
        };

        let img = decode_image(image_bytes)?;
        let raw = engine.detect(&img, confidence_threshold)?;

        let detections: Vec<Detection> = raw
            .iter()
            .map(|d| Detection::new(PLACEHOLDER_PEST_CLASS, d.confidence))
            .collect();

        debug!(count = detections.len(), "Pest detection completed");

        Ok(PestOutcome::Detections(detections))
    }
}
