//! Health check endpoint.

use axum::{Json, Router, routing::get};
use notesapp_core::ResponseEnvelope;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
async fn health_check() -> Json<ResponseEnvelope<HealthResponse>> {
    Json(ResponseEnvelope::success(HealthResponse { status: "ok" }))
}

/// Path of the health check.
pub const PATH: &str = "/health";

/// Build health check routes.
pub fn routes() -> Router {
    Router::new().route(PATH, get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.data.map(|d| d.status), Some("ok"));
    }
}
