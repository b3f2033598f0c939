//! User management route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use davistore_core::{Email, RoleId, UserId};

use crate::db::UserRepository;
use crate::db::users::{UserChanges, UserListFilter};
use crate::error::{ApiError, Result};
use crate::middleware::{CurrentUser, RequireAdmin, ensure_owner_or_admin, is_admin};
use crate::models::user::UserWithRole;
use crate::response::{ApiResponse, Pagination};
use crate::services::auth::{hash_password, validate_password};
use crate::state::AppState;

use super::PageQuery;

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for the user list (besides pagination).
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub role_id: Option<RoleId>,
}

/// Partial user update body.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<RoleId>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/v1/users` (admin)
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(page_query): Query<PageQuery>,
    Query(query): Query<UsersQuery>,
) -> Result<ApiResponse<Vec<UserWithRole>>> {
    let (page, limit, offset) = page_query.resolve();
    let filter = UserListFilter {
        search: query.search,
        is_active: query.is_active,
        role_id: query.role_id,
    };

    let (users, total) = UserRepository::new(state.pool())
        .list(&filter, limit, offset)
        .await?;

    Ok(ApiResponse::paginated(
        users,
        Pagination::new(page, limit, total),
    ))
}

/// `GET /api/v1/users/{id}` (owner or admin)
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserWithRole>> {
    let id = UserId::new(id);
    ensure_owner_or_admin(&state, &claims, id).await?;

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(ApiResponse::ok(user))
}

/// `PUT /api/v1/users/{id}` (owner or admin)
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<ApiResponse<UserWithRole>> {
    let id = UserId::new(id);
    ensure_owner_or_admin(&state, &claims, id).await?;

    // Role changes are an admin-only operation, even on your own account.
    if body.role_id.is_some() && !is_admin(&state, &claims).await? {
        return Err(ApiError::Forbidden(
            "only admins can change roles".to_string(),
        ));
    }

    let email = body
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(|e| ApiError::BadRequest(format!("invalid email: {e}")))?;

    let password_hash = match body.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let changes = UserChanges {
        email,
        password_hash,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        role_id: body.role_id,
    };

    let user = UserRepository::new(state.pool()).update(id, &changes).await?;

    Ok(ApiResponse::ok(user))
}

/// `DELETE /api/v1/users/{id}` (admin) - soft delete.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<ApiResponse<serde_json::Value>> {
    UserRepository::new(state.pool())
        .set_active(UserId::new(id), false)
        .await?;

    Ok(ApiResponse::with_message(
        serde_json::Value::Null,
        "user deactivated".to_string(),
    ))
}

/// `PATCH /api/v1/users/{id}/activate` (admin)
pub async fn activate(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserWithRole>> {
    set_active(&state, UserId::new(id), true).await
}

/// `PATCH /api/v1/users/{id}/deactivate` (admin)
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserWithRole>> {
    set_active(&state, UserId::new(id), false).await
}

async fn set_active(
    state: &AppState,
    id: UserId,
    is_active: bool,
) -> Result<ApiResponse<UserWithRole>> {
    let repo = UserRepository::new(state.pool());
    repo.set_active(id, is_active).await?;

    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(ApiResponse::ok(user))
}
