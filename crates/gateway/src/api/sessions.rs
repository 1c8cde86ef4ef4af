//! Read-only views of the conversation store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use sq_sessions::validate_session_key;

use super::api_error;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_sessions(State(state): State<AppState>) -> Response {
    match state.sessions().list().await {
        Ok(sessions) => Json(serde_json::json!({
            "count": sessions.len(),
            "sessions": sessions,
        }))
        .into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions/:key
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_session(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    if let Err(e) = validate_session_key(&key) {
        return api_error(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state.sessions().history(&key).await {
        Ok(messages) if messages.is_empty() => {
            api_error(StatusCode::NOT_FOUND, format!("session '{key}' not found"))
        }
        Ok(messages) => Json(serde_json::json!({
            "session_key": key,
            "messages": messages,
        }))
        .into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
