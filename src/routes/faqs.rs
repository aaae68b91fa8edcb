use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::DeleteConfirmation;
use crate::auth::AuthenticatedUser;
use crate::catalog::{Catalog, FaqChanges, NewFaq, SuggestionApproval, TextQuery};
use crate::error::AppResult;
use crate::models::{Faq, FaqSuggestion, Role};
use crate::state::AppState;
use crate::utils::text::split_list;

#[derive(Deserialize)]
pub struct FaqListQuery {
    pub query: Option<String>,
}

/// `tags` and `references` are comma separated, as typed into the form.
#[derive(Deserialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: String,
    pub tags: String,
    pub department_id: Uuid,
    pub references: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateFaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub tags: Option<String>,
    pub department_id: Option<Uuid>,
    pub references: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveSuggestionRequest {
    pub department_id: Uuid,
    pub answer: Option<String>,
    pub tags: Option<String>,
}

#[derive(Serialize)]
pub struct FaqResponse {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub department_id: Uuid,
    pub department: Option<String>,
    pub created_at: NaiveDate,
    pub created_by: String,
    pub references: Vec<String>,
}

impl FaqResponse {
    fn from_faq(faq: Faq, catalog: &Catalog) -> Self {
        Self {
            department: catalog.department_name(Some(faq.department_id)),
            id: faq.id,
            question: faq.question,
            answer: faq.answer,
            tags: faq.tags,
            department_id: faq.department_id,
            created_at: faq.created_at,
            created_by: faq.created_by,
            references: faq.references,
        }
    }
}

#[derive(Serialize)]
pub struct FaqListResponse {
    pub faqs: Vec<FaqResponse>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct SuggestionListResponse {
    pub suggestions: Vec<FaqSuggestion>,
    pub total: usize,
}

pub async fn list_faqs(
    State(state): State<AppState>,
    Query(params): Query<FaqListQuery>,
) -> Json<FaqListResponse> {
    let query = TextQuery::new(params.query.as_deref());
    let catalog = state.catalog.read().await;
    let faqs: Vec<FaqResponse> = catalog
        .list_faqs(&query)
        .into_iter()
        .map(|faq| FaqResponse::from_faq(faq, &catalog))
        .collect();
    let total = faqs.len();
    Json(FaqListResponse { faqs, total })
}

pub async fn create_faq(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateFaqRequest>,
) -> AppResult<(StatusCode, Json<FaqResponse>)> {
    let mut catalog = state.catalog.write().await;
    let faq = catalog.add_faq(NewFaq {
        question: payload.question,
        answer: payload.answer,
        tags: split_list(&payload.tags),
        department_id: payload.department_id,
        created_by: user.name.clone(),
        references: payload
            .references
            .as_deref()
            .map(split_list)
            .unwrap_or_default(),
    })?;
    info!(faq_id = %faq.id, "faq created");

    Ok((StatusCode::CREATED, Json(FaqResponse::from_faq(faq, &catalog))))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(faq_id): Path<Uuid>,
    Json(payload): Json<UpdateFaqRequest>,
) -> AppResult<Json<FaqResponse>> {
    let changes = FaqChanges {
        question: payload.question,
        answer: payload.answer,
        tags: payload.tags.as_deref().map(split_list),
        department_id: payload.department_id,
        references: payload.references.as_deref().map(split_list),
    };

    let mut catalog = state.catalog.write().await;
    let faq = catalog.update_faq(faq_id, changes)?;
    info!(faq_id = %faq.id, "faq updated");

    Ok(Json(FaqResponse::from_faq(faq, &catalog)))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(faq_id): Path<Uuid>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> AppResult<StatusCode> {
    confirmation.require()?;

    let mut catalog = state.catalog.write().await;
    if let Some(removed) = catalog.remove_faq(faq_id) {
        catalog.record_activity(user.name.clone(), "delete faq", removed.question.clone());
        info!(faq_id = %removed.id, "faq deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_suggestions(State(state): State<AppState>) -> Json<SuggestionListResponse> {
    let catalog = state.catalog.read().await;
    let suggestions = catalog.pending_suggestions();
    let total = suggestions.len();
    Json(SuggestionListResponse { suggestions, total })
}

pub async fn approve_suggestion(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(suggestion_id): Path<Uuid>,
    Json(payload): Json<ApproveSuggestionRequest>,
) -> AppResult<(StatusCode, Json<FaqResponse>)> {
    user.require_role(Role::Admin)?;

    let mut catalog = state.catalog.write().await;
    let faq = catalog.approve_suggestion(
        suggestion_id,
        SuggestionApproval {
            department_id: payload.department_id,
            answer: payload.answer,
            tags: payload.tags.as_deref().map(split_list).unwrap_or_default(),
            approved_by: user.name.clone(),
        },
    )?;
    catalog.record_activity(user.name.clone(), "approve suggestion", faq.question.clone());
    info!(suggestion_id = %suggestion_id, faq_id = %faq.id, "faq suggestion approved");

    Ok((StatusCode::CREATED, Json(FaqResponse::from_faq(faq, &catalog))))
}

pub async fn reject_suggestion(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(suggestion_id): Path<Uuid>,
) -> AppResult<Json<FaqSuggestion>> {
    user.require_role(Role::Admin)?;

    let mut catalog = state.catalog.write().await;
    let suggestion = catalog.reject_suggestion(suggestion_id)?;
    catalog.record_activity(user.name.clone(), "reject suggestion", suggestion.question.clone());
    info!(suggestion_id = %suggestion.id, "faq suggestion rejected");

    Ok(Json(suggestion))
}
