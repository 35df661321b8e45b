//! Request extractors resolving the caller from `Authorization: Bearer <token>`
//! or, failing that, the `auth_token` cookie.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum_extra::extract::cookie::CookieJar;
use models::user::{self, Role};
use sea_orm::EntityTrait;
use service::auth::tokens::TokenKind;
use tracing::warn;

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Authenticated, active user.
pub struct CurrentUser(pub user::Model);

/// Caller if a valid token was sent, anonymous otherwise.
pub struct MaybeUser(pub Option<user::Model>);

/// Authenticated admin.
pub struct RequireAdmin(pub user::Model);

fn bearer_token(parts: &Parts) -> Result<Option<String>, ApiError> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| ApiError::unauthorized("Invalid Authorization header."))?;
        return match raw.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => {
                warn!(path = %parts.uri.path(), "invalid Authorization format (expect Bearer)");
                Err(ApiError::unauthorized("Invalid Authorization header."))
            }
        };
    }
    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|v| !v.is_empty()))
}

async fn resolve(state: &ServerState, token: &str) -> Result<user::Model, ApiError> {
    let claims = state.auth.tokens().verify(token, TokenKind::Access).map_err(|e| {
        warn!(error = %e, "token validation failed");
        ApiError::unauthorized("Invalid or expired token.")
    })?;
    let found = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(service::errors::ServiceError::from)?;
    match found {
        Some(u) if u.is_active => Ok(u),
        _ => Err(ApiError::unauthorized("User not found or inactive.")),
    }
}

#[axum::async_trait]
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))?;
        Ok(CurrentUser(resolve(state, &token).await?))
    }
}

#[axum::async_trait]
impl FromRequestParts<ServerState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let Ok(Some(token)) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };
        Ok(MaybeUser(resolve(state, &token).await.ok()))
    }
}

#[axum::async_trait]
impl FromRequestParts<ServerState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let CurrentUser(u) = CurrentUser::from_request_parts(parts, state).await?;
        if u.user_type != Role::Admin {
            return Err(ApiError::forbidden("You do not have permission to perform this action."));
        }
        Ok(RequireAdmin(u))
    }
}
