//! `POST /v1/chat` — run one turn and return what it committed.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use sq_sessions::new_session_key;

use super::api_error;
use crate::runtime::TurnError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation to continue. A fresh key is generated when absent.
    #[serde(default)]
    pub session_key: Option<String>,
    pub message: String,
}

/// A failed turn still answers 200: the apology is part of the
/// conversation and `error` says what went wrong.
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    let session_key = body.session_key.unwrap_or_else(new_session_key);

    match state.turns.run_turn(&session_key, &body.message).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e @ (TurnError::InvalidSessionKey(_) | TurnError::EmptyMessage)) => {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ TurnError::Busy(_)) => api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        Err(e @ TurnError::Store(_)) => {
            tracing::error!(session_key = %session_key, error = %e, "turn could not be committed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
