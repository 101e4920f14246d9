//! Session browsing HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/sessions      - List the caller's sessions
//! - GET    /api/v1/sessions/{id} - Get a session with its full transcript
//! - DELETE /api/v1/sessions/{id} - Delete a session and its messages

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use parley_types::chat::{ChatMessage, ChatSession};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// A session together with its full message transcript.
#[derive(Debug, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// GET /api/v1/sessions - List the caller's sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<ChatSession>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.chat_service.list_sessions(&auth.0).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(sessions, request_id, elapsed)
        .with_link("self", "/api/v1/sessions");

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id} - Get a session with its messages.
pub async fn get_session(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionDetail>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    let session = state
        .chat_service
        .get_session(&sid, &auth.0)
        .await?
        .ok_or(AppError::Repository(
            parley_types::error::RepositoryError::NotFound,
        ))?;

    // Ownership was checked above; the transcript query is id-only.
    let messages = state.chat_service.list_messages(&sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(SessionDetail { session, messages }, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{sid}"));

    Ok(Json(resp))
}

/// DELETE /api/v1/sessions/{id} - Delete a session and its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    state.chat_service.delete_session(&sid, &auth.0).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "deleted": true, "id": sid }),
        request_id,
        elapsed,
    )
    .with_link("sessions", "/api/v1/sessions");

    Ok(Json(resp))
}
