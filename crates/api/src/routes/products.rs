//! Product route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;

use davistore_core::{CategoryId, ProductId};

use crate::db::ProductRepository;
use crate::db::products::{NewProduct, ProductChanges, ProductListFilter};
use crate::error::{ApiError, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::{Product, ProductWithCategory};
use crate::response::{ApiResponse, Created, Pagination};
use crate::state::AppState;

use super::PageQuery;

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for the product list (besides pagination).
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub in_stock: bool,
}

/// Product creation body.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}

/// Partial product update body.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Absolute stock update body.
#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub stock_quantity: i32,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/v1/products` (public)
pub async fn list(
    State(state): State<AppState>,
    Query(page_query): Query<PageQuery>,
    Query(query): Query<ProductsQuery>,
) -> Result<ApiResponse<Vec<ProductWithCategory>>> {
    let (page, limit, offset) = page_query.resolve();
    let filter = ProductListFilter {
        category_id: query.category_id,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.search,
        is_active: query.is_active,
        in_stock: query.in_stock,
    };

    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, limit, offset)
        .await?;

    Ok(ApiResponse::paginated(
        products,
        Pagination::new(page, limit, total),
    ))
}

/// `GET /api/v1/products/sku/{sku}` (public)
pub async fn show_by_sku(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<ApiResponse<ProductWithCategory>> {
    let product = ProductRepository::new(state.pool())
        .get_by_sku(&sku)
        .await?
        .ok_or_else(|| ApiError::NotFound("product not found".to_string()))?;

    Ok(ApiResponse::ok(product))
}

/// `GET /api/v1/products/{id}` (public)
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<ProductWithCategory>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("product not found".to_string()))?;

    Ok(ApiResponse::ok(product))
}

/// `POST /api/v1/products` (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CreateProductRequest>,
) -> Result<Created<Product>> {
    if body.sku.trim().is_empty() {
        return Err(ApiError::BadRequest("SKU cannot be empty".to_string()));
    }
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name cannot be empty".to_string()));
    }
    validate_price_and_stock(Some(body.price), Some(body.stock_quantity))?;

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            sku: body.sku,
            name: body.name,
            description: body.description,
            price: body.price,
            stock_quantity: body.stock_quantity,
            category_id: body.category_id,
            image_url: body.image_url,
        })
        .await?;

    Ok(ApiResponse::created(product))
}

/// `PUT /api/v1/products/{id}` (admin)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<ApiResponse<Product>> {
    validate_price_and_stock(body.price, body.stock_quantity)?;

    let product = ProductRepository::new(state.pool())
        .update(
            ProductId::new(id),
            &ProductChanges {
                name: body.name,
                description: body.description,
                price: body.price,
                stock_quantity: body.stock_quantity,
                category_id: body.category_id,
                image_url: body.image_url,
                is_active: body.is_active,
            },
        )
        .await?;

    Ok(ApiResponse::ok(product))
}

/// `PATCH /api/v1/products/{id}/stock` (admin)
pub async fn set_stock(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStockRequest>,
) -> Result<ApiResponse<Product>> {
    validate_price_and_stock(None, Some(body.stock_quantity))?;

    let product = ProductRepository::new(state.pool())
        .set_stock(ProductId::new(id), body.stock_quantity)
        .await?;

    Ok(ApiResponse::ok(product))
}

/// `DELETE /api/v1/products/{id}` (admin)
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<ApiResponse<serde_json::Value>> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    Ok(ApiResponse::with_message(
        serde_json::Value::Null,
        "product deleted".to_string(),
    ))
}

fn validate_price_and_stock(price: Option<Decimal>, stock: Option<i32>) -> Result<()> {
    if let Some(price) = price
        && price < Decimal::ZERO
    {
        return Err(ApiError::BadRequest(
            "price cannot be negative".to_string(),
        ));
    }
    if let Some(stock) = stock
        && stock < 0
    {
        return Err(ApiError::BadRequest(
            "stock cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_and_stock_validation() {
        assert!(validate_price_and_stock(Some(Decimal::new(1999, 2)), Some(5)).is_ok());
        assert!(validate_price_and_stock(None, None).is_ok());
        assert!(validate_price_and_stock(Some(Decimal::from(-1)), None).is_err());
        assert!(validate_price_and_stock(None, Some(-3)).is_err());
        assert!(validate_price_and_stock(Some(Decimal::ZERO), Some(0)).is_ok());
    }
}
