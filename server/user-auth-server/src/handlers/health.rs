use axum::Json;
use serde::Serialize;

use crate::envelope::ApiResponse;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub version: &'static str,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}

/// Liveness check; does not touch the store.
pub async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(
        "Service is healthy",
        HealthResponse {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    ))
}
