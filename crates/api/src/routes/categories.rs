//! Category route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use davistore_core::CategoryId;

use crate::db::CategoryRepository;
use crate::db::categories::{CategoryChanges, NewCategory};
use crate::error::{ApiError, Result};
use crate::middleware::RequireAdmin;
use crate::models::category::{Category, CategoryWithChildren, CategoryWithParent};
use crate::response::{ApiResponse, Created};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for the category list.
#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Category creation body.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
}

/// Partial category update body.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/v1/categories` (public)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> Result<ApiResponse<Vec<CategoryWithParent>>> {
    let categories = CategoryRepository::new(state.pool())
        .list(query.include_inactive)
        .await?;

    Ok(ApiResponse::ok(categories))
}

/// `GET /api/v1/categories/tree` (public)
pub async fn tree(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CategoryWithChildren>>> {
    let tree = CategoryRepository::new(state.pool()).tree().await?;

    Ok(ApiResponse::ok(tree))
}

/// `GET /api/v1/categories/slug/{slug}` (public)
pub async fn show_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<CategoryWithParent>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("category not found".to_string()))?;

    Ok(ApiResponse::ok(category))
}

/// `GET /api/v1/categories/{id}` (public)
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<CategoryWithParent>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_id(CategoryId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("category not found".to_string()))?;

    Ok(ApiResponse::ok(category))
}

/// `POST /api/v1/categories` (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<Created<Category>> {
    validate_name_and_slug(Some(&body.name), Some(&body.slug))?;

    let category = CategoryRepository::new(state.pool())
        .create(&NewCategory {
            name: body.name,
            slug: body.slug,
            description: body.description,
            parent_id: body.parent_id,
        })
        .await?;

    Ok(ApiResponse::created(category))
}

/// `PUT /api/v1/categories/{id}` (admin)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<ApiResponse<Category>> {
    validate_name_and_slug(body.name.as_deref(), body.slug.as_deref())?;

    let category = CategoryRepository::new(state.pool())
        .update(
            CategoryId::new(id),
            &CategoryChanges {
                name: body.name,
                slug: body.slug,
                description: body.description,
                parent_id: body.parent_id,
                is_active: body.is_active,
            },
        )
        .await?;

    Ok(ApiResponse::ok(category))
}

/// `DELETE /api/v1/categories/{id}` (admin)
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<ApiResponse<serde_json::Value>> {
    CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await?;

    Ok(ApiResponse::with_message(
        serde_json::Value::Null,
        "category deleted".to_string(),
    ))
}

fn validate_name_and_slug(name: Option<&str>, slug: Option<&str>) -> Result<()> {
    if let Some(name) = name
        && name.trim().is_empty()
    {
        return Err(ApiError::BadRequest("name cannot be empty".to_string()));
    }
    if let Some(slug) = slug {
        if slug.trim().is_empty() {
            return Err(ApiError::BadRequest("slug cannot be empty".to_string()));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ApiError::BadRequest(
                "slug may only contain lowercase letters, digits, and dashes".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(validate_name_and_slug(Some("Shoes"), Some("running-shoes")).is_ok());
        assert!(validate_name_and_slug(None, None).is_ok());
        assert!(validate_name_and_slug(Some(""), None).is_err());
        assert!(validate_name_and_slug(None, Some("Bad Slug")).is_err());
        assert!(validate_name_and_slug(None, Some("UPPER")).is_err());
        assert!(validate_name_and_slug(None, Some("")).is_err());
    }
}
