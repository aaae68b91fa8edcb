use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::profile::ProfileResponse;
use crate::{
    auth::{password, AuthenticatedUser},
    catalog::NewUser,
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: ProfileResponse,
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub nickname: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub agree_terms: bool,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = {
        let catalog = state.catalog.read().await;
        catalog
            .find_user_by_email(&payload.email)
            .cloned()
            .ok_or_else(AppError::unauthorized)?
    };

    // Seeded accounts without a password cannot sign in.
    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or_else(AppError::unauthorized)?;
    let valid = password::verify_password(&payload.password, password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        warn!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::unauthorized());
    }

    state.reap_expired_sessions().await;
    let session_id = state.sessions.start(user.id, state.jwt.expiry()).await;
    let access_token = state
        .jwt
        .generate_token(user.id, session_id, &user.name, user.role)
        .map_err(AppError::from)?;
    info!(user_id = %user.id, session_id = %session_id, "session started");

    let catalog = state.catalog.read().await;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiry_minutes * 60,
        user: ProfileResponse::from_user(&user, &catalog),
    }))
}

/// Only invited addresses can sign up; the account takes the department,
/// position and role from its invitation.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<ProfileResponse>)> {
    if payload.password != payload.confirm_password {
        return Err(AppError::bad_request("passwords do not match"));
    }
    if !payload.agree_terms {
        return Err(AppError::bad_request("the terms of service must be accepted"));
    }
    password::validate_new_password(&payload.password, &payload.confirm_password)
        .map_err(AppError::bad_request)?;

    let email = payload.email.trim().to_string();
    {
        let catalog = state.catalog.read().await;
        if catalog.find_user_by_email(&email).is_some() {
            return Err(AppError::conflict("an account with this email already exists"));
        }
        if catalog.open_invitation(&email).is_none() {
            return Err(AppError::forbidden("signup requires an invitation"));
        }
    }

    let password_hash = password::hash_password(&payload.password).map_err(AppError::internal)?;

    let mut catalog = state.catalog.write().await;
    let invitation = catalog
        .open_invitation(&email)
        .cloned()
        .ok_or_else(|| AppError::forbidden("signup requires an invitation"))?;
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    let user = catalog.register_user(NewUser {
        email: invitation.email.clone(),
        name,
        nickname: payload.nickname,
        department_id: Some(invitation.department_id),
        position: invitation.position.clone(),
        role: invitation.role,
        password_hash: Some(password_hash),
    })?;
    catalog.take_invitation(&invitation.email);
    catalog.record_activity(user.name.clone(), "signup", user.email.clone());
    info!(user_id = %user.id, role = %user.role, "invited user signed up");

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse::from_user(&user, &catalog)),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    state.sessions.end(user.session_id).await;
    let closed = state.consoles.close_owned_by(user.session_id).await;
    info!(
        user_id = %user.user_id,
        session_id = %user.session_id,
        closed_consoles = closed,
        "session ended"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}
