//! HTTP API surface.

mod agent;
mod health;

use axum::{Extension, Router};
use hera_core::Pipeline;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .merge(agent::routes())
        .merge(health::routes())
        .layer(Extension(pipeline))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
