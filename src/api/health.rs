//! Health check endpoint (for load balancers).

use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

/// Simple health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the process answers
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes.
pub fn routes() -> Router {
    Router::new().route("/health", get(health_check))
}
