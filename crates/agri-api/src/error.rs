//! API error types.
//!
//! Every prediction endpoint reports failures the same way: HTTP 500 with an
//! `{"error": "<message>"}` body. The variants only exist so the cause is
//! visible in logs and metrics.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use agri_models::{ErrorResponse, SoilError};
use agri_vision::VisionError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Soil(#[from] SoilError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Input(_) => "input",
            ApiError::Vision(VisionError::Decode(_)) => "decode",
            ApiError::Vision(VisionError::Inference(_)) => "inference",
            ApiError::Vision(_) => "vision",
            ApiError::Soil(_) => "soil",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("inference task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        error!(kind = self.kind(), error = %self, "Request failed");

        let body = ErrorResponse::new(self.to_string());

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_server_error() {
        let errors = vec![
            ApiError::input("missing field"),
            ApiError::from(VisionError::decode("bad bytes")),
            ApiError::from(VisionError::inference("boom")),
            ApiError::from(SoilError::NonFiniteScore { factor: "moisture" }),
            ApiError::internal("join"),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_transparent_messages() {
        let err = ApiError::from(VisionError::decode("bad bytes"));
        assert_eq!(err.to_string(), "Cannot decode image: bad bytes");
        assert_eq!(err.kind(), "decode");
    }
}
