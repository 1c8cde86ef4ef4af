use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::api_error;
use crate::state::AppState;

/// `GET /v1/schema` — the snapshot the agent would be grounded on right now.
pub async fn get_schema(State(state): State<AppState>) -> Response {
    match state.schema.fetch_schema().await {
        Ok(snapshot) => Json(serde_json::json!({
            "tables": snapshot.tables,
            "table_count": snapshot.tables.len(),
            "column_count": snapshot.column_count(),
            "prompt": snapshot.render(),
        }))
        .into_response(),
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}
