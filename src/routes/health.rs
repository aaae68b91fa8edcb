use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let active_sessions = state.sessions.active_count().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "active_sessions": active_sessions })),
    )
}
