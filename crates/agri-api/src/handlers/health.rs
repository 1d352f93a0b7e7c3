//! Health check and service identifier handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::config::SERVICE_NAME;
use crate::state::AppState;

/// Service identifier response.
#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

/// Static service identifier.
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub crop_health_model: CheckStatus,
    pub pest_model: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: "unavailable".to_string(),
            error: Some(msg.into()),
        }
    }
}

/// Readiness check endpoint (readiness probe).
///
/// The classifier is loaded before the server starts, so the service is always
/// ready once it answers; a missing pest model only degrades it.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let pest_model = match state.detector.availability() {
        agri_vision::DetectorAvailability::Available(_) => CheckStatus::ok(),
        agri_vision::DetectorAvailability::Unavailable { reason } => {
            CheckStatus::unavailable(reason.clone())
        }
    };

    let status = if pest_model.status == "ok" {
        "ready"
    } else {
        "degraded"
    };

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: status.to_string(),
            checks: ReadinessChecks {
                crop_health_model: CheckStatus::ok(),
                pest_model,
            },
        }),
    )
}
