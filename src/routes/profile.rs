use axum::extract::{Json, State};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::{password, AuthenticatedUser};
use crate::catalog::{Catalog, ProfileChanges};
use crate::error::{AppError, AppResult};
use crate::models::{Role, User};
use crate::state::AppState;
use crate::utils::json::{classify_nullable, NullableValue};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub nickname: Option<String>,
    pub department_id: Option<Uuid>,
    pub department: Option<String>,
    pub position: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl ProfileResponse {
    pub fn from_user(user: &User, catalog: &Catalog) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            nickname: user.nickname.clone(),
            department_id: user.department_id,
            department: catalog.department_name(user.department_id),
            position: user.position.clone(),
            role: user.role,
            profile_image: user.profile_image.clone(),
        }
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let catalog = state.catalog.read().await;
    let record = catalog.user(user.user_id).ok_or_else(AppError::not_found)?;
    Ok(Json(ProfileResponse::from_user(record, &catalog)))
}

fn optional_string(body: &Value, field: &str) -> AppResult<Option<String>> {
    match classify_nullable(body.get(field)).map_err(AppError::bad_request)? {
        NullableValue::Omitted | NullableValue::Null => Ok(None),
        NullableValue::String(value) => Ok(Some(value)),
    }
}

fn nullable_string(body: &Value, field: &str) -> AppResult<Option<Option<String>>> {
    match classify_nullable(body.get(field)).map_err(AppError::bad_request)? {
        NullableValue::Omitted => Ok(None),
        NullableValue::Null => Ok(Some(None)),
        NullableValue::String(value) => Ok(Some(Some(value))),
    }
}

/// Accepts `name`, `nickname`, `profile_image` and an optional password change
/// (`current_password`, `new_password`, `confirm_password`). Department,
/// position and role are managed by administrators and cannot be edited here.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<Value>,
) -> AppResult<Json<ProfileResponse>> {
    if !body.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }

    let name = optional_string(&body, "name")?;
    let nickname = nullable_string(&body, "nickname")?;
    let profile_image = nullable_string(&body, "profile_image")?;
    let new_password = optional_string(&body, "new_password")?;

    let password_hash = match new_password {
        Some(new_password) => {
            let confirmation = optional_string(&body, "confirm_password")?.unwrap_or_default();
            password::validate_new_password(&new_password, &confirmation)
                .map_err(AppError::bad_request)?;

            let current = optional_string(&body, "current_password")?.unwrap_or_default();
            let existing_hash = {
                let catalog = state.catalog.read().await;
                catalog
                    .user(user.user_id)
                    .and_then(|record| record.password_hash.clone())
            };
            if let Some(existing_hash) = existing_hash {
                let valid = password::verify_password(&current, &existing_hash)
                    .map_err(AppError::internal)?;
                if !valid {
                    return Err(AppError::bad_request("current password is incorrect"));
                }
            }
            Some(password::hash_password(&new_password).map_err(AppError::internal)?)
        }
        None => None,
    };
    let password_changed = password_hash.is_some();

    let mut catalog = state.catalog.write().await;
    let updated = catalog.update_profile(
        user.user_id,
        ProfileChanges {
            name,
            nickname,
            profile_image,
            password_hash,
        },
    )?;
    info!(user_id = %updated.id, password_changed, "profile updated");

    Ok(Json(ProfileResponse::from_user(&updated, &catalog)))
}
