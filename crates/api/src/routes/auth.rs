//! Authentication route handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::models::user::UserWithRole;
use crate::response::{ApiResponse, Created};
use crate::services::auth::{AuthService, Registration, TokenPair};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User plus token pair returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserWithRole,
    pub tokens: TokenPair,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Created<AuthResponse>> {
    validate_name(&body.first_name, "first_name")?;
    validate_name(&body.last_name, "last_name")?;
    validate_phone(body.phone.as_deref())?;

    let service = AuthService::new(state.pool(), state.tokens());

    let (user, tokens) = service
        .register(Registration {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
        })
        .await?;

    tracing::info!(user_id = %user.user.id, "user registered");

    Ok(ApiResponse::created(AuthResponse { user, tokens }))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>> {
    let service = AuthService::new(state.pool(), state.tokens());

    let (user, tokens) = service.login(&body.email, &body.password).await?;

    tracing::info!(user_id = %user.user.id, "user logged in");

    Ok(ApiResponse::ok(AuthResponse { user, tokens }))
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<ApiResponse<TokenPair>> {
    let service = AuthService::new(state.pool(), state.tokens());

    let tokens = service.refresh(&body.refresh_token).await?;

    Ok(ApiResponse::ok(tokens))
}

/// `GET /api/v1/auth/me`
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<UserWithRole>> {
    let service = AuthService::new(state.pool(), state.tokens());

    let user = service.current_user(claims.user_id()).await?;

    Ok(ApiResponse::ok(user))
}

/// `POST /api/v1/auth/logout`
///
/// Tokens are stateless; the client discards them. This endpoint exists so
/// clients have a uniform logout call.
pub async fn logout(CurrentUser(claims): CurrentUser) -> ApiResponse<serde_json::Value> {
    tracing::info!(user_id = %claims.user_id(), "user logged out");

    ApiResponse::with_message(
        serde_json::Value::Null,
        "logged out, discard your tokens".to_string(),
    )
}

const MAX_NAME_LENGTH: usize = 100;
const MAX_PHONE_LENGTH: usize = 20;

fn validate_name(value: &str, field: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.len() < 2 || trimmed.len() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "{field} must be between 2 and {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_phone(phone: Option<&str>) -> Result<()> {
    let Some(phone) = phone else {
        return Ok(());
    };

    if phone.len() > MAX_PHONE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "phone cannot be longer than {MAX_PHONE_LENGTH} characters"
        )));
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ApiError::BadRequest(
            "phone may only contain digits and + - ( ) space".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_bounds() {
        assert!(validate_name("Ada", "first_name").is_ok());
        assert!(validate_name("A", "first_name").is_err());
        assert!(validate_name(&"a".repeat(101), "first_name").is_err());
        assert!(validate_name("  A  ", "first_name").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone(None).is_ok());
        assert!(validate_phone(Some("+1 (555) 123-4567")).is_ok());
        assert!(validate_phone(Some("call me maybe")).is_err());
        assert!(validate_phone(Some(&"1".repeat(21))).is_err());
    }
}
