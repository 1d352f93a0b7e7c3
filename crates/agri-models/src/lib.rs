//! Shared data models for the AgriAI backend.
//!
//! This crate provides Serde-serializable types for:
//! - Soil readings and the soil condition scorer
//! - Crop health classification results
//! - Pest detection records
//! - The uniform error body

pub mod prediction;
pub mod soil;

// Re-export common types
pub use prediction::{
    ClassificationResult, Detection, ErrorResponse, PestDetectionResponse,
    DETECTOR_UNAVAILABLE_MESSAGE,
};
pub use soil::{
    score as score_soil, SoilCondition, SoilError, SoilReading, SoilResult, SoilScoreDetails,
    SoilScoreResult,
};
