//! Agent session and chat endpoints.
//!
//! The chat endpoint always replies 200 with a user-facing message; only a
//! failing session store surfaces as a 500, with the root cause kept to the
//! logs.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use hera_core::{Pipeline, TurnReply};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Response for session creation.
#[derive(Debug, Serialize)]
pub struct SessionCreated {
    /// The new session id
    pub session_id: String,
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    #[serde(default)]
    pub message: String,
}

async fn create_session(
    Extension(pipeline): Extension<Arc<Pipeline>>,
) -> Result<Json<SessionCreated>, StatusCode> {
    match pipeline.create_session().await {
        Ok(session_id) => Ok(Json(SessionCreated { session_id })),
        Err(e) => {
            error!(error = %e, "failed to create session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn chat(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnReply>, StatusCode> {
    match pipeline.handle_turn(&session_id, &request.message).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "turn failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Agent routes.
pub fn routes() -> Router {
    Router::new()
        .route("/agent/session", post(create_session))
        .route("/agent/chat/:session_id", post(chat))
}
