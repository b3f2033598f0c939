//! Cart route handlers. All endpoints operate on the caller's active cart.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use davistore_core::{CartItemId, ProductId};

use crate::db::CartRepository;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::cart::{CartSummary, CartWithItems};
use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body for adding a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body for changing a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/v1/cart`
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<CartWithItems>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create(claims.user_id())
        .await?;

    Ok(ApiResponse::ok(cart))
}

/// `GET /api/v1/cart/summary`
pub async fn summary(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<CartSummary>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create(claims.user_id())
        .await?;

    Ok(ApiResponse::ok(cart.summary()))
}

/// `POST /api/v1/cart/items`
pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<AddToCartRequest>,
) -> Result<ApiResponse<CartWithItems>> {
    let cart = CartRepository::new(state.pool())
        .add_item(claims.user_id(), body.product_id, body.quantity)
        .await?;

    Ok(ApiResponse::ok(cart))
}

/// `PUT /api/v1/cart/items/{item_id}`
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(item_id): Path<i32>,
    Json(body): Json<UpdateCartItemRequest>,
) -> Result<ApiResponse<CartWithItems>> {
    let cart = CartRepository::new(state.pool())
        .update_item(claims.user_id(), CartItemId::new(item_id), body.quantity)
        .await?;

    Ok(ApiResponse::ok(cart))
}

/// `DELETE /api/v1/cart/items/{item_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(item_id): Path<i32>,
) -> Result<ApiResponse<CartWithItems>> {
    let cart = CartRepository::new(state.pool())
        .remove_item(claims.user_id(), CartItemId::new(item_id))
        .await?;

    Ok(ApiResponse::ok(cart))
}

/// `DELETE /api/v1/cart`
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<CartWithItems>> {
    let cart = CartRepository::new(state.pool())
        .clear(claims.user_id())
        .await?;

    Ok(ApiResponse::ok(cart))
}
