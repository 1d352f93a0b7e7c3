//! Pest detection handler.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use tracing::info;

use agri_models::PestDetectionResponse;
use agri_vision::PestOutcome;

use crate::error::ApiResult;
use crate::extract::ImageUpload;
use crate::metrics;
use crate::state::AppState;

const ENDPOINT: &str = "pest";

/// Detect pests in an uploaded image.
///
/// Responds 200 with `{"error": "YOLO model not available"}` when the
/// detector failed to load at startup.
pub async fn predict_pest(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> ApiResult<Json<PestDetectionResponse>> {
    let outcome = detect_upload(&state, upload).await;

    let response = match outcome {
        Ok(PestOutcome::Detections(detections)) => {
            metrics::record_prediction(ENDPOINT, "ok");
            info!(count = detections.len(), "Pest detection completed");
            PestDetectionResponse::detections(detections)
        }
        Ok(PestOutcome::EngineUnavailable) => {
            metrics::record_prediction(ENDPOINT, "degraded");
            PestDetectionResponse::unavailable()
        }
        Err(e) => {
            metrics::record_prediction(ENDPOINT, e.kind());
            return Err(e);
        }
    };

    Ok(Json(response))
}

async fn detect_upload(state: &AppState, upload: ImageUpload) -> ApiResult<PestOutcome> {
    if !state.detector.is_available() {
        return Ok(PestOutcome::EngineUnavailable);
    }

    upload.log_received(ENDPOINT);
    let detector = Arc::clone(&state.detector);
    let start = Instant::now();

    let outcome = tokio::task::spawn_blocking(move || detector.detect_default(&upload.bytes)).await?;

    metrics::record_inference_duration("detector", start.elapsed().as_secs_f64());

    Ok(outcome?)
}
