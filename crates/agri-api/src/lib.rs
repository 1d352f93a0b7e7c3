//! Axum HTTP API server for agricultural diagnostics.
//!
//! This crate provides:
//! - `/predict_crop_health`: crop health classification from an image
//! - `/predict_pest`: pest detection from an image
//! - `/predict_soil`: soil condition scoring from four readings
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
