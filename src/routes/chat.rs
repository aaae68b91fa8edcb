use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::chat::{ChatConsole, ChatMessage, ConsoleSnapshot, ResponseMode};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitMessageRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct ModeRequest {
    pub mode: Option<String>,
}

fn parse_mode(raw: Option<&str>) -> AppResult<ResponseMode> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ResponseMode::default()),
        Some(value) => ResponseMode::parse(value)
            .ok_or_else(|| AppError::bad_request(format!("unknown response mode: {value}"))),
    }
}

#[derive(Serialize)]
pub struct SubmitMessageResponse {
    pub message: ChatMessage,
    pub console: ConsoleSnapshot,
}

async fn owned_console(
    state: &AppState,
    user: &AuthenticatedUser,
    console_id: Uuid,
) -> AppResult<Arc<ChatConsole>> {
    state
        .consoles
        .get(console_id, user.session_id)
        .await
        .ok_or_else(AppError::not_found)
}

/// The body is optional; without one the console starts in mixed mode.
pub async fn open_console(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ConsoleSnapshot>)> {
    let mode = if body.iter().all(u8::is_ascii_whitespace) {
        ResponseMode::default()
    } else {
        let request: ModeRequest = serde_json::from_slice(&body)
            .map_err(|err| AppError::bad_request(format!("invalid request body: {err}")))?;
        parse_mode(request.mode.as_deref())?
    };

    let console = state.consoles.open(user.session_id, mode).await;
    info!(
        console_id = %console.id(),
        user_id = %user.user_id,
        mode = mode.as_str(),
        "chat console opened"
    );
    Ok((StatusCode::CREATED, Json(console.snapshot())))
}

pub async fn set_console_mode(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(console_id): Path<Uuid>,
    Json(payload): Json<ModeRequest>,
) -> AppResult<Json<ConsoleSnapshot>> {
    let console = owned_console(&state, &user, console_id).await?;
    let raw = payload
        .mode
        .as_deref()
        .ok_or_else(|| AppError::bad_request("mode is required"))?;
    let mode = parse_mode(Some(raw))?;
    console.set_mode(mode);
    info!(console_id = %console_id, mode = mode.as_str(), "chat console mode changed");
    Ok(Json(console.snapshot()))
}

pub async fn get_console(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(console_id): Path<Uuid>,
) -> AppResult<Json<ConsoleSnapshot>> {
    let console = owned_console(&state, &user, console_id).await?;
    Ok(Json(console.snapshot()))
}

pub async fn close_console(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(console_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.consoles.close(console_id, user.session_id).await {
        return Err(AppError::not_found());
    }
    info!(console_id = %console_id, "chat console closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Answers 202 right away; the reply shows up in the transcript once the
/// console is idle again.
pub async fn submit_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(console_id): Path<Uuid>,
    Json(payload): Json<SubmitMessageRequest>,
) -> AppResult<(StatusCode, Json<SubmitMessageResponse>)> {
    let console = owned_console(&state, &user, console_id).await?;
    let message = console.submit(&payload.content)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitMessageResponse {
            message,
            console: console.snapshot(),
        }),
    ))
}

pub async fn reset_console(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(console_id): Path<Uuid>,
) -> AppResult<Json<ConsoleSnapshot>> {
    let console = owned_console(&state, &user, console_id).await?;
    console.reset();
    info!(console_id = %console_id, "chat console reset");
    Ok(Json(console.snapshot()))
}
