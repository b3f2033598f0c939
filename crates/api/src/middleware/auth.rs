//! Authentication extractors for route handlers.
//!
//! `CurrentUser` verifies the bearer token; `RequireAdmin` additionally
//! re-reads the role from the database so a deactivated or demoted role
//! locks its holders out before their tokens expire.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use davistore_core::{RoleName, UserId};

use crate::db::users::UserRepository;
use crate::error::ApiError;
use crate::services::auth::Claims;
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(claims): CurrentUser) -> impl IntoResponse {
///     format!("hello, user {}", claims.user_id())
/// }
/// ```
pub struct CurrentUser(pub Claims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens().verify_access(token)?;
        Ok(Self(claims))
    }
}

/// Extractor that requires a valid access token belonging to an active
/// admin role.
pub struct RequireAdmin(pub Claims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        ensure_admin(state, &claims).await?;
        Ok(Self(claims))
    }
}

/// Allow the request when the caller owns the target user, or is an admin.
///
/// # Errors
///
/// Returns `ApiError::Forbidden` for non-owner non-admin callers.
pub async fn ensure_owner_or_admin(
    state: &AppState,
    claims: &Claims,
    target: UserId,
) -> Result<(), ApiError> {
    if claims.user_id() == target {
        return Ok(());
    }
    ensure_admin(state, claims).await
}

/// Whether the caller currently holds the active admin role.
///
/// # Errors
///
/// Returns `ApiError::Repository` if the role lookup fails.
pub async fn is_admin(state: &AppState, claims: &Claims) -> Result<bool, ApiError> {
    let role = UserRepository::new(state.pool())
        .get_role(claims.role_id())
        .await?;

    Ok(role.is_some_and(|r| r.is_active && r.name == RoleName::Admin))
}

/// Check that the caller's role is the active admin role.
async fn ensure_admin(state: &AppState, claims: &Claims) -> Result<(), ApiError> {
    let role = UserRepository::new(state.pool())
        .get_role(claims.role_id())
        .await?
        .ok_or_else(|| ApiError::Forbidden("role not found".to_string()))?;

    if !role.is_active {
        return Err(ApiError::Forbidden("role is inactive".to_string()));
    }
    if role.name != RoleName::Admin {
        return Err(ApiError::Forbidden(
            "admin access required".to_string(),
        ));
    }

    Ok(())
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

    parse_bearer(value)
        .ok_or_else(|| ApiError::Unauthorized("expected 'Bearer <token>'".to_string()))
}

/// Parse a `Bearer <token>` header value.
fn parse_bearer(value: &str) -> Option<&str> {
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_accepts_token() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn test_parse_bearer_rejects_other_schemes() {
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("bearer abc"), None);
        assert_eq!(parse_bearer("abc"), None);
    }

    #[test]
    fn test_parse_bearer_rejects_empty_token() {
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer    "), None);
    }
}
