//! Order route handlers: checkout, queries, and status changes.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use davistore_core::{OrderId, OrderStatus, PaymentMethod};

use crate::db::OrderRepository;
use crate::db::orders::{NewOrder, OrderListFilter, ShippingAddress};
use crate::error::{ApiError, Result};
use crate::middleware::{CurrentUser, RequireAdmin, is_admin};
use crate::models::order::OrderWithItems;
use crate::response::{ApiResponse, Created, Pagination};
use crate::state::AppState;

use super::PageQuery;

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for the order list (besides pagination).
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
}

/// Shipping destination in the checkout body.
#[derive(Debug, Deserialize)]
pub struct ShippingAddressBody {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Checkout body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddressBody,
    pub notes: Option<String>,
}

/// Admin status change body.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/v1/orders`
///
/// Customers see their own orders; admins see everyone's.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(page_query): Query<PageQuery>,
    Query(query): Query<OrdersQuery>,
) -> Result<ApiResponse<Vec<OrderWithItems>>> {
    let (page, limit, offset) = page_query.resolve();

    let user_scope = if is_admin(&state, &claims).await? {
        None
    } else {
        Some(claims.user_id())
    };

    let filter = OrderListFilter {
        status: query.status,
        user_id: user_scope,
    };

    let (orders, total) = OrderRepository::new(state.pool())
        .list(&filter, limit, offset)
        .await?;

    Ok(ApiResponse::paginated(
        orders,
        Pagination::new(page, limit, total),
    ))
}

/// `GET /api/v1/orders/{id}` (owner or admin)
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse<OrderWithItems>> {
    let scope = if is_admin(&state, &claims).await? {
        None
    } else {
        Some(claims.user_id())
    };

    let order = OrderRepository::new(state.pool())
        .get_by_id(OrderId::new(id), scope)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;

    Ok(ApiResponse::ok(order))
}

/// `POST /api/v1/orders` - checkout the active cart.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Created<OrderWithItems>> {
    validate_shipping(&body.shipping_address)?;

    let order = OrderRepository::new(state.pool())
        .checkout(
            claims.user_id(),
            &NewOrder {
                payment_method: body.payment_method,
                shipping: ShippingAddress {
                    address: body.shipping_address.address,
                    city: body.shipping_address.city,
                    state: body.shipping_address.state,
                    zip: body.shipping_address.zip,
                    country: body.shipping_address.country,
                },
                notes: body.notes,
            },
        )
        .await?;

    tracing::info!(
        order_id = %order.order.id,
        user_id = %order.order.user_id,
        total = %order.order.total,
        "order created"
    );

    Ok(ApiResponse::created(order))
}

/// `PATCH /api/v1/orders/{id}/status` (admin)
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<ApiResponse<OrderWithItems>> {
    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), body.status, body.notes.as_deref())
        .await?;

    tracing::info!(order_id = %order.order.id, status = %order.order.status, "order status changed");

    Ok(ApiResponse::ok(order))
}

/// `POST /api/v1/orders/{id}/cancel` (owner)
pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse<OrderWithItems>> {
    let order = OrderRepository::new(state.pool())
        .cancel(OrderId::new(id), claims.user_id())
        .await?;

    tracing::info!(order_id = %order.order.id, "order cancelled by owner");

    Ok(ApiResponse::ok(order))
}

fn validate_shipping(shipping: &ShippingAddressBody) -> Result<()> {
    let fields = [
        ("address", &shipping.address),
        ("city", &shipping.city),
        ("state", &shipping.state),
        ("zip", &shipping.zip),
        ("country", &shipping.country),
    ];

    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "shipping {name} cannot be empty"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shipping() -> ShippingAddressBody {
        ShippingAddressBody {
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn test_validate_shipping_ok() {
        assert!(validate_shipping(&shipping()).is_ok());
    }

    #[test]
    fn test_validate_shipping_rejects_blank_field() {
        let mut body = shipping();
        body.city = "   ".to_string();
        let err = validate_shipping(&body).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("city")));
    }
}
