//! Chat turn HTTP handler.
//!
//! Endpoint:
//! - POST /api/v1/chat - Run one chat turn (creates a session when none given)

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    /// The user's message text.
    pub message: String,
    /// Optional system directive; defaults to the service-wide directive.
    #[serde(default)]
    pub system_message: Option<String>,
    /// Existing session to continue; absent starts a new session.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Response body for a completed chat turn.
#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    /// The assistant's reply.
    pub message: String,
    /// The session the turn belongs to (newly created when none was given).
    pub session_id: Uuid,
}

/// POST /api/v1/chat - Run one full chat turn.
pub async fn chat_turn(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<ChatTurnRequest>,
) -> Result<Json<ApiResponse<ChatTurnResponse>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let outcome = state
        .chat_service
        .handle_turn(
            auth.0,
            req.session_id,
            &req.message,
            req.system_message.as_deref(),
        )
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        ChatTurnResponse {
            message: outcome.reply,
            session_id: outcome.session_id,
        },
        request_id,
        elapsed,
    )
    .with_link("self", "/api/v1/chat")
    .with_link(
        "session",
        &format!("/api/v1/sessions/{}", outcome.session_id),
    );

    Ok(Json(resp))
}
