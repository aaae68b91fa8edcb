use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

use crate::catalog::CatalogError;
use crate::chat::ConsoleError;

pub type AppResult<T> = Result<T, AppError>;

/// Lets clients tell input they must fix apart from failures on our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::Validation, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized, "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorKind::Forbidden, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound, "resource not found")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ErrorKind::Conflict, message)
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal,
            error.to_string(),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Attached to internal-error responses so middleware can record them.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = (self.kind == ErrorKind::Internal).then(|| {
            tracing::error!(error = %self.message, "request failed");
            ErrorReport {
                kind: self.kind,
                message: self.message.clone(),
            }
        });
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            kind: self.kind,
        });
        let mut response = (status, body).into_response();
        if let Some(report) = report {
            response.extensions_mut().insert(report);
        }
        response
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: ErrorKind,
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound(what) => {
                Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound, format!("{what} not found"))
            }
            CatalogError::Invalid(message) => AppError::bad_request(message),
            CatalogError::Conflict(message) => AppError::conflict(message),
        }
    }
}

impl From<ConsoleError> for AppError {
    fn from(value: ConsoleError) -> Self {
        match value {
            ConsoleError::EmptyMessage => AppError::bad_request(value.to_string()),
            ConsoleError::Busy => AppError::conflict(value.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        AppError::internal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_map_to_client_kinds() {
        let err = AppError::from(CatalogError::NotFound("faq"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = AppError::from(CatalogError::invalid("name must not be empty"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = AppError::from(CatalogError::conflict("already reviewed"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn busy_console_is_a_conflict() {
        let err = AppError::from(ConsoleError::Busy);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(ConsoleError::EmptyMessage).kind(), ErrorKind::Validation);
    }

    #[test]
    fn infrastructure_failures_are_internal() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn only_internal_responses_carry_a_report() {
        let response = AppError::internal("disk full").into_response();
        let report = response.extensions().get::<ErrorReport>().cloned().unwrap();
        assert_eq!(report.kind, ErrorKind::Internal);
        assert_eq!(report.message, "disk full");

        let response = AppError::conflict("already reviewed").into_response();
        assert!(response.extensions().get::<ErrorReport>().is_none());
    }
}
