use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::DeleteConfirmation;
use crate::auth::AuthenticatedUser;
use crate::catalog::{
    Catalog, DepartmentChanges, NewDepartment, NewInvitation, OrgChartNode, TextQuery,
};
use crate::error::{AppError, AppResult};
use crate::models::{Department, Invitation, Role};
use crate::state::AppState;
use crate::utils::json::{classify_nullable, classify_nullable_uuid, NullableValue};

#[derive(Deserialize)]
pub struct DepartmentListQuery {
    pub query: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct InviteUserRequest {
    pub email: String,
    pub department_id: Uuid,
    pub position: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct DepartmentResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub label: String,
    pub member_count: usize,
}

impl DepartmentResponse {
    fn from_department(department: &Department, catalog: &Catalog) -> Self {
        Self {
            id: department.id,
            name: department.name.clone(),
            parent_id: department.parent_id,
            organization_id: department.organization_id,
            label: catalog.hierarchy_label(department),
            member_count: catalog.count_members(department.id),
        }
    }
}

#[derive(Serialize)]
pub struct DepartmentListResponse {
    pub departments: Vec<DepartmentResponse>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct OrgChartResponse {
    pub organization_id: Uuid,
    pub departments: Vec<OrgChartNode>,
}

#[derive(Serialize)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub email: String,
    pub department_id: Uuid,
    pub department: Option<String>,
    pub position: String,
    pub role: Role,
    pub invited_by: String,
    pub created_at: NaiveDateTime,
}

impl InvitationResponse {
    fn from_invitation(invitation: Invitation, catalog: &Catalog) -> Self {
        Self {
            department: catalog.department_name(Some(invitation.department_id)),
            id: invitation.id,
            email: invitation.email,
            department_id: invitation.department_id,
            position: invitation.position,
            role: invitation.role,
            invited_by: invitation.invited_by,
            created_at: invitation.created_at,
        }
    }
}

pub async fn list_departments(
    State(state): State<AppState>,
    Query(params): Query<DepartmentListQuery>,
) -> Json<DepartmentListResponse> {
    let query = TextQuery::new(params.query.as_deref());
    let catalog = state.catalog.read().await;
    let departments: Vec<DepartmentResponse> = catalog
        .list_departments(&query)
        .iter()
        .map(|department| DepartmentResponse::from_department(department, &catalog))
        .collect();
    let total = departments.len();
    Json(DepartmentListResponse { departments, total })
}

pub async fn org_chart(State(state): State<AppState>) -> Json<OrgChartResponse> {
    let catalog = state.catalog.read().await;
    Json(OrgChartResponse {
        organization_id: catalog.organization_id(),
        departments: catalog.org_chart(),
    })
}

pub async fn create_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateDepartmentRequest>,
) -> AppResult<(StatusCode, Json<DepartmentResponse>)> {
    user.require_role(Role::Admin)?;

    let mut catalog = state.catalog.write().await;
    let department = catalog.add_department(NewDepartment {
        name: payload.name,
        parent_id: payload.parent_id,
    })?;
    catalog.record_activity(user.name.clone(), "create department", department.name.clone());
    info!(department_id = %department.id, "department created");

    Ok((
        StatusCode::CREATED,
        Json(DepartmentResponse::from_department(&department, &catalog)),
    ))
}

/// `parent_id: null` (or an empty string) moves the department to the top level.
pub async fn update_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(department_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<DepartmentResponse>> {
    user.require_role(Role::Admin)?;
    if !body.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }

    let name = match classify_nullable(body.get("name")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => None,
        NullableValue::Null => return Err(AppError::bad_request("name must not be empty")),
        NullableValue::String(value) => Some(value),
    };
    let parent_id =
        classify_nullable_uuid("parent_id", body.get("parent_id")).map_err(AppError::bad_request)?;

    if name.is_none() && parent_id.is_none() {
        return Err(AppError::bad_request("no changes provided"));
    }

    let mut catalog = state.catalog.write().await;
    let department =
        catalog.update_department(department_id, DepartmentChanges { name, parent_id })?;
    catalog.record_activity(user.name.clone(), "update department", department.name.clone());
    info!(department_id = %department.id, parent_id = ?department.parent_id, "department updated");

    Ok(Json(DepartmentResponse::from_department(&department, &catalog)))
}

pub async fn delete_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(department_id): Path<Uuid>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> AppResult<StatusCode> {
    user.require_role(Role::Admin)?;
    confirmation.require()?;

    let mut catalog = state.catalog.write().await;
    if let Some(removed) = catalog.remove_department(department_id) {
        catalog.record_activity(user.name.clone(), "delete department", removed.name.clone());
        info!(department_id = %removed.id, "department deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_invitations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<InvitationResponse>>> {
    user.require_role(Role::Admin)?;

    let catalog = state.catalog.read().await;
    let invitations = catalog
        .invitations
        .search(&TextQuery::default())
        .into_iter()
        .map(|invitation| InvitationResponse::from_invitation(invitation, &catalog))
        .collect();
    Ok(Json(invitations))
}

pub async fn invite_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<InviteUserRequest>,
) -> AppResult<(StatusCode, Json<InvitationResponse>)> {
    user.require_role(Role::Admin)?;

    let role = Role::parse(&payload.role)
        .ok_or_else(|| AppError::bad_request(format!("unknown role: {}", payload.role)))?;

    let mut catalog = state.catalog.write().await;
    let invitation = catalog.invite(NewInvitation {
        email: payload.email,
        department_id: payload.department_id,
        position: payload.position,
        role,
        invited_by: user.name.clone(),
    })?;
    catalog.record_activity(user.name.clone(), "invite user", invitation.email.clone());
    // Delivery of the invitation e-mail happens outside this service.
    info!(
        invitation_id = %invitation.id,
        email = %invitation.email,
        role = %invitation.role,
        "invitation issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse::from_invitation(invitation, &catalog)),
    ))
}
