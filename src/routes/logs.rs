use axum::extract::{Json, Query, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::catalog::{LogFilter, TextQuery};
use crate::error::{AppError, AppResult, ErrorReport};
use crate::models::{AdminActivity, ChatLog, ResponseType, SystemError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LogListQuery {
    pub query: Option<String>,
    pub response_type: Option<String>,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub query: Option<String>,
    pub response_type: Option<String>,
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct LogListResponse {
    pub logs: Vec<ChatLog>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ActivityListResponse {
    pub activity: Vec<AdminActivity>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ErrorListResponse {
    pub errors: Vec<SystemError>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("csv") => Ok(ExportFormat::Csv),
            Some("json") => Ok(ExportFormat::Json),
            Some(other) => Err(AppError::bad_request(format!(
                "unsupported export format: {other}"
            ))),
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

fn log_filter(query: Option<&str>, response_type: Option<&str>) -> AppResult<LogFilter> {
    let response_type = match response_type.map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(value) => Some(
            ResponseType::parse(value)
                .ok_or_else(|| AppError::bad_request(format!("unknown response type: {value}")))?,
        ),
    };
    Ok(LogFilter {
        query: TextQuery::new(query),
        response_type,
    })
}

pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogListQuery>,
) -> AppResult<Json<LogListResponse>> {
    let filter = log_filter(params.query.as_deref(), params.response_type.as_deref())?;
    let catalog = state.catalog.read().await;
    let logs = catalog.list_chat_logs(&filter);
    let total = logs.len();
    Ok(Json(LogListResponse { logs, total }))
}

/// Renders chat logs as CSV with a header row. List fields are joined with `;`.
pub fn logs_to_csv(logs: &[ChatLog]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "timestamp",
        "user_name",
        "question",
        "answer",
        "response_type",
        "response_time",
        "feedback",
        "referenced_documents",
    ])?;

    for log in logs {
        writer.write_record([
            log.id.to_string(),
            log.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            log.user_name.clone(),
            log.question.clone(),
            log.answer.clone(),
            log.response_type.as_str().to_string(),
            format!("{:.1}", log.response_time),
            log.feedback
                .map(|feedback| feedback.as_str().to_string())
                .unwrap_or_default(),
            log.referenced_documents.join(";"),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| AppError::internal(format!("failed to finish csv export: {err}")))
}

pub async fn export_logs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ExportQuery>,
) -> AppResult<Response> {
    let format = ExportFormat::parse(params.format.as_deref())?;
    let filter = log_filter(params.query.as_deref(), params.response_type.as_deref())?;
    let logs = state.catalog.read().await.list_chat_logs(&filter);

    let body = match format {
        ExportFormat::Csv => logs_to_csv(&logs)?,
        ExportFormat::Json => serde_json::to_vec_pretty(&logs)?,
    };
    let filename = format!(
        "chat-logs-{}.{}",
        Utc::now().format("%Y%m%d"),
        format.extension()
    );
    info!(
        user_id = %user.user_id,
        rows = logs.len(),
        format = format.extension(),
        "chat logs exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn list_activity(State(state): State<AppState>) -> Json<ActivityListResponse> {
    let catalog = state.catalog.read().await;
    let activity = catalog.activity.search(&TextQuery::default());
    let total = activity.len();
    Json(ActivityListResponse { activity, total })
}

pub async fn list_errors(State(state): State<AppState>) -> Json<ErrorListResponse> {
    let catalog = state.catalog.read().await;
    let errors = catalog.errors.search(&TextQuery::default());
    let total = errors.len();
    Json(ErrorListResponse { errors, total })
}

/// Copies every internal-error response into the error feed.
pub async fn record_internal_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if let Some(report) = response.extensions().get::<ErrorReport>() {
        state.catalog.write().await.record_error(
            response.status().as_u16(),
            report.kind,
            method,
            path,
            report.message.clone(),
        );
    }
    response
}
