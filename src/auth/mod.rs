pub mod jwt;
pub mod password;
pub mod session;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, models::Role, state::AppState};

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Fails with 403 unless the caller holds at least `minimum`.
    pub fn require_role(&self, minimum: Role) -> Result<(), AppError> {
        if self.role >= minimum {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{minimum} role or higher is required"
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        if !state.sessions.is_active(claims.sid, claims.sub).await {
            return Err(AppError::unauthorized());
        }

        // Role and name come from the catalog so changes apply without a new token.
        let catalog = state.catalog.read().await;
        let user = catalog.user(claims.sub).ok_or_else(AppError::unauthorized)?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            session_id: claims.sid,
            name: user.name.clone(),
            role: user.role,
        })
    }
}
