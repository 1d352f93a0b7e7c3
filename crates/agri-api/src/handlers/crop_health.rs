//! Crop health classification handler.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use tracing::info;

use agri_models::ClassificationResult;

use crate::error::ApiResult;
use crate::extract::ImageUpload;
use crate::metrics;
use crate::state::AppState;

const ENDPOINT: &str = "crop_health";

/// Classify the health of the crop in an uploaded image.
pub async fn predict_crop_health(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> ApiResult<Json<ClassificationResult>> {
    let result = classify_upload(&state, upload).await;

    match &result {
        Ok(classification) => {
            metrics::record_prediction(ENDPOINT, "ok");
            info!(
                class_label = %classification.class_label,
                confidence = classification.confidence,
                "Crop health predicted"
            );
        }
        Err(e) => metrics::record_prediction(ENDPOINT, e.kind()),
    }

    result.map(Json)
}

async fn classify_upload(state: &AppState, upload: ImageUpload) -> ApiResult<ClassificationResult> {
    upload.log_received(ENDPOINT);
    let classifier = Arc::clone(&state.classifier);
    let start = Instant::now();

    // Decode and inference are CPU-bound
    let result = tokio::task::spawn_blocking(move || classifier.classify(&upload.bytes)).await?;

    metrics::record_inference_duration("classifier", start.elapsed().as_secs_f64());

    Ok(result?)
}
