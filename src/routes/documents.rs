use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Json, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::DeleteConfirmation;
use crate::auth::AuthenticatedUser;
use crate::catalog::{Catalog, DocumentFilter, NewDocument, TextQuery};
use crate::error::{AppError, AppResult};
use crate::models::{AccessLevel, Document, DocumentStatus, Role};
use crate::state::AppState;
use crate::utils::text::{format_file_size, non_blank, split_list};

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "xlsx", "csv", "json"];

fn attachment_content_disposition(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch.is_control() => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// Lowercased extension of `filename` when it is one of the accepted upload types.
pub fn accepted_extension(filename: &str) -> Option<String> {
    let extension = FsPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

#[derive(Deserialize)]
pub struct DocumentListQuery {
    pub query: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: u64,
    pub size_label: String,
    pub upload_date: NaiveDate,
    pub uploaded_by: String,
    pub department_id: Option<Uuid>,
    pub department: Option<String>,
    pub tags: Vec<String>,
    pub access_level: AccessLevel,
    pub status: DocumentStatus,
    pub content_type: Option<String>,
    pub checksum: Option<String>,
    pub downloadable: bool,
}

impl DocumentResponse {
    fn from_document(document: Document, catalog: &Catalog) -> Self {
        Self {
            id: document.id,
            size_label: format_file_size(document.size),
            department: catalog.department_name(document.department_id),
            downloadable: document.storage_key.is_some(),
            name: document.name,
            file_type: document.file_type,
            size: document.size,
            upload_date: document.upload_date,
            uploaded_by: document.uploaded_by,
            department_id: document.department_id,
            tags: document.tags,
            access_level: document.access_level,
            status: document.status,
            content_type: document.content_type,
            checksum: document.checksum,
        }
    }
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: usize,
}

fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<DocumentStatus>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => DocumentStatus::parse(value)
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("unknown document status: {value}"))),
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<DocumentListQuery>,
) -> AppResult<Json<DocumentListResponse>> {
    let filter = DocumentFilter {
        query: TextQuery::new(params.query.as_deref()),
        status: parse_status_filter(params.status.as_deref())?,
    };

    let catalog = state.catalog.read().await;
    let documents: Vec<DocumentResponse> = catalog
        .list_documents(&filter)
        .into_iter()
        .map(|document| DocumentResponse::from_document(document, &catalog))
        .collect();
    let total = documents.len();

    Ok(Json(DocumentListResponse { documents, total }))
}

struct UploadForm {
    bytes: Vec<u8>,
    original_name: String,
    content_type: Option<String>,
    name: Option<String>,
    tags: Vec<String>,
    access_level: AccessLevel,
    department_id: Option<Uuid>,
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut name: Option<String> = None;
    let mut tags = Vec::new();
    let mut access_level = AccessLevel::Public;
    let mut department_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        let msg = format!("invalid multipart data: {err}");
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(msg)
    })? {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                original_name = field.file_name().map(|n| n.to_string());
                content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|err| {
                    let msg = format!("failed to read file bytes: {err}");
                    error!(error = %err, "failed to read file bytes");
                    AppError::bad_request(msg)
                })?;
                file_bytes = Some(data.to_vec());
            }
            Some(other @ ("name" | "tags" | "access_level" | "department_id")) => {
                let other = other.to_string();
                let value = field.text().await.map_err(|err| {
                    error!(error = %err, field = %other, "invalid form field");
                    AppError::bad_request(format!("invalid {other}: {err}"))
                })?;
                match other.as_str() {
                    "name" => name = non_blank(&value),
                    "tags" => tags = split_list(&value),
                    "access_level" => {
                        if !value.trim().is_empty() {
                            access_level = AccessLevel::parse(&value).ok_or_else(|| {
                                AppError::bad_request(format!("unknown access level: {value}"))
                            })?;
                        }
                    }
                    _ => {
                        if !value.trim().is_empty() {
                            let parsed = Uuid::parse_str(value.trim()).map_err(|_| {
                                AppError::bad_request("department_id must be a valid UUID")
                            })?;
                            department_id = Some(parsed);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| {
        error!("upload rejected: missing file field");
        AppError::bad_request("file field is required")
    })?;
    let original_name = original_name
        .as_deref()
        .and_then(non_blank)
        .ok_or_else(|| {
            error!("upload rejected: missing original filename");
            AppError::bad_request("filename is required")
        })?;

    Ok(UploadForm {
        bytes,
        original_name,
        content_type,
        name,
        tags,
        access_level,
        department_id,
    })
}

pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DocumentResponse>)> {
    let form = read_upload_form(multipart).await?;

    let extension = accepted_extension(&form.original_name).ok_or_else(|| {
        error!(original_name = %form.original_name, "upload rejected: unsupported file type");
        AppError::bad_request(format!(
            "unsupported file type; accepted: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    if form.bytes.is_empty() {
        error!("upload rejected: empty file payload");
        return Err(AppError::bad_request("file field must not be empty"));
    }
    if form.bytes.len() > state.config.upload_max_bytes {
        error!(size = form.bytes.len(), "upload rejected: file too large");
        return Err(AppError::bad_request(format!(
            "file exceeds the {} upload limit",
            format_file_size(state.config.upload_max_bytes as u64)
        )));
    }
    if let Some(department_id) = form.department_id {
        let catalog = state.catalog.read().await;
        if !catalog.departments.contains(department_id) {
            return Err(AppError::bad_request("department does not exist"));
        }
    }

    // Every upload gets its own object; identical bytes are never shared.
    let checksum = hex::encode(Sha256::digest(&form.bytes));
    let storage_key = format!("documents/{}.{extension}", Uuid::new_v4());
    let content_type = mime_guess::from_path(&form.original_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .or(form.content_type);
    let size = form.bytes.len() as u64;

    state
        .storage
        .put_object(&storage_key, form.bytes)
        .await
        .map_err(|err| AppError::internal(format!("failed to store upload: {err}")))?;

    let mut catalog = state.catalog.write().await;
    let added = catalog.add_document(NewDocument {
        name: form.name.unwrap_or_else(|| form.original_name.clone()),
        file_type: extension,
        size,
        uploaded_by: user.name.clone(),
        department_id: form.department_id,
        tags: form.tags,
        access_level: form.access_level,
        content_type,
        checksum: Some(checksum),
        storage_key: Some(storage_key.clone()),
    });

    let document = match added {
        Ok(document) => document,
        Err(err) => {
            drop(catalog);
            if let Err(cleanup) = state.storage.delete_object(&storage_key).await {
                warn!(error = %cleanup, key = %storage_key, "failed to remove orphaned upload");
            }
            error!(error = %err, original_name = %form.original_name, "document upload failed");
            return Err(err.into());
        }
    };
    info!(
        document_id = %document.id,
        original_name = %form.original_name,
        size = document.size,
        "document upload succeeded"
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_document(document, &catalog)),
    ))
}

pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> AppResult<StatusCode> {
    user.require_role(Role::Admin)?;
    confirmation.require()?;

    let removed = {
        let mut catalog = state.catalog.write().await;
        let Some(removed) = catalog.remove_document(document_id) else {
            return Ok(StatusCode::NO_CONTENT);
        };
        catalog.record_activity(user.name.clone(), "delete document", removed.name.clone());
        removed
    };
    info!(document_id = %removed.id, "document deleted");

    if let Some(key) = removed.storage_key.as_deref() {
        if let Err(err) = state.storage.delete_object(key).await {
            warn!(error = %err, key = %key, "failed to delete stored document");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn review(
    state: AppState,
    user: AuthenticatedUser,
    document_id: Uuid,
    decision: DocumentStatus,
) -> AppResult<Json<DocumentResponse>> {
    user.require_role(Role::Admin)?;

    let mut catalog = state.catalog.write().await;
    let document = catalog.review_document(document_id, decision)?;
    let action = match decision {
        DocumentStatus::Approved => "approve document",
        _ => "reject document",
    };
    catalog.record_activity(user.name.clone(), action, document.name.clone());
    info!(document_id = %document.id, status = decision.as_str(), "document reviewed");

    Ok(Json(DocumentResponse::from_document(document, &catalog)))
}

pub async fn approve_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentResponse>> {
    review(state, user, document_id, DocumentStatus::Approved).await
}

pub async fn reject_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentResponse>> {
    review(state, user, document_id, DocumentStatus::Rejected).await
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> AppResult<Response> {
    let document = {
        let catalog = state.catalog.read().await;
        catalog
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(AppError::not_found)?
    };
    let key = document.storage_key.as_deref().ok_or_else(AppError::not_found)?;

    let bytes = state
        .storage
        .get_object(key)
        .await
        .map_err(|err| AppError::internal(format!("failed to read stored document: {err}")))?;

    let content_type = document
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let filename = if FsPath::new(&document.name).extension().is_some() {
        document.name.clone()
    } else {
        format!("{}.{}", document.name, document.file_type)
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                attachment_content_disposition(&filename),
            ),
        ],
        Body::from(bytes),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        assert_eq!(accepted_extension("보고서.PDF").as_deref(), Some("pdf"));
        assert_eq!(accepted_extension("data.csv").as_deref(), Some("csv"));
        assert_eq!(accepted_extension("archive.zip"), None);
        assert_eq!(accepted_extension("README"), None);
    }

    #[test]
    fn content_disposition_escapes_and_encodes() {
        let value = attachment_content_disposition("가이드 \"v2\".pdf");
        assert!(value.starts_with("attachment; filename=\"가이드 _v2_.pdf\""));
        assert!(value.contains("filename*=UTF-8''%EA%B0%80"));
    }

    #[test]
    fn status_filter_treats_all_as_absent() {
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("approved")).unwrap(),
            Some(DocumentStatus::Approved)
        );
        assert!(parse_status_filter(Some("archived")).is_err());
    }
}
