//! Soil condition handler.

use axum::Json;
use tracing::debug;

use agri_models::{score_soil, SoilScoreResult};

use crate::error::{ApiError, ApiResult};
use crate::extract::SoilForm;
use crate::metrics;

const ENDPOINT: &str = "soil";

/// Score soil condition from four form readings.
pub async fn predict_soil(SoilForm(reading): SoilForm) -> ApiResult<Json<SoilScoreResult>> {
    let result = match score_soil(&reading) {
        Ok(result) => result,
        Err(e) => {
            let err = ApiError::from(e);
            metrics::record_prediction(ENDPOINT, err.kind());
            return Err(err);
        }
    };

    metrics::record_prediction(ENDPOINT, "ok");
    metrics::record_soil_condition(result.soil_condition.as_str());
    debug!(
        overall_score = result.overall_score,
        soil_condition = %result.soil_condition,
        "Soil scored"
    );

    Ok(Json(result))
}
