//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use flock_common::{AppError, Claims};
use flock_db::entities::user;

use crate::middleware::AuthState;

/// Authenticated caller, taken from the claims the auth middleware verified.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Self::from)
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))
    }
}

/// Authenticated caller whose account carries the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AuthState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AuthState,
    ) -> Result<Self, Self::Rejection> {
        let caller = AuthUser::from_request_parts(parts, state).await?;
        state.user_service.require_admin(&caller.id).await.map(Self)
    }
}
