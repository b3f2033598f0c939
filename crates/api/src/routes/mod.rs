//! HTTP route handlers.
//!
//! # Route Structure (all under `/api/v1`)
//!
//! ```text
//! # Auth
//! POST /auth/register          - Register a new user (public)
//! POST /auth/login             - Login (public)
//! POST /auth/refresh           - Exchange a refresh token (public)
//! GET  /auth/me                - Current user (auth)
//! POST /auth/logout            - Stateless logout (auth)
//!
//! # Users
//! GET    /users                - List users (admin)
//! GET    /users/{id}           - Get user (owner or admin)
//! PUT    /users/{id}           - Update user (owner or admin)
//! DELETE /users/{id}           - Soft-delete user (admin)
//! PATCH  /users/{id}/activate  - Activate user (admin)
//! PATCH  /users/{id}/deactivate - Deactivate user (admin)
//!
//! # Categories
//! GET    /categories           - List categories (public)
//! GET    /categories/tree      - Root categories with children (public)
//! GET    /categories/slug/{slug} - Get by slug (public)
//! GET    /categories/{id}      - Get by ID (public)
//! POST   /categories           - Create (admin)
//! PUT    /categories/{id}      - Update (admin)
//! DELETE /categories/{id}      - Delete (admin)
//!
//! # Products
//! GET    /products             - List with filters (public)
//! GET    /products/sku/{sku}   - Get by SKU (public)
//! GET    /products/{id}        - Get by ID (public)
//! POST   /products             - Create (admin)
//! PUT    /products/{id}        - Update (admin)
//! PATCH  /products/{id}/stock  - Set stock (admin)
//! DELETE /products/{id}        - Delete (admin)
//!
//! # Cart (auth)
//! GET    /cart                 - Active cart with items
//! GET    /cart/summary         - Item counts and subtotal
//! POST   /cart/items           - Add product
//! PUT    /cart/items/{item_id} - Change quantity
//! DELETE /cart/items/{item_id} - Remove line
//! DELETE /cart                 - Clear cart
//!
//! # Orders (auth)
//! GET    /orders               - Own orders (all for admins)
//! GET    /orders/{id}          - Get order (owner or admin)
//! POST   /orders               - Checkout
//! PATCH  /orders/{id}/status   - Change status (admin)
//! POST   /orders/{id}/cancel   - Cancel pending order (owner)
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use serde::Deserialize;

use crate::state::AppState;

/// Default page size for list endpoints.
const DEFAULT_PAGE_SIZE: i64 = 10;
/// Hard cap on page size.
const MAX_PAGE_SIZE: i64 = 100;

/// Common `page`/`limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolve to a sane `(page, limit, offset)` triple.
    #[must_use]
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit, (page - 1) * limit)
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::remove),
        )
        .route("/{id}/activate", patch(users::activate))
        .route("/{id}/deactivate", patch(users::deactivate))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/tree", get(categories::tree))
        .route("/slug/{slug}", get(categories::show_by_slug))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::remove),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/sku/{sku}", get(products::show_by_sku))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/{id}/stock", patch(products::set_stock))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/summary", get(cart::summary))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create all versioned API routes.
pub fn routes() -> Router<AppState> {
    let v1 = Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes());

    Router::new().nest("/api/v1", v1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults() {
        let (page, limit, offset) = PageQuery::default().resolve();
        assert_eq!((page, limit, offset), (1, 10, 0));
    }

    #[test]
    fn test_page_query_offset() {
        let query = PageQuery {
            page: Some(3),
            limit: Some(25),
        };
        assert_eq!(query.resolve(), (3, 25, 50));
    }

    #[test]
    fn test_page_query_clamps_bad_values() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(query.resolve(), (1, MAX_PAGE_SIZE, 0));

        let query = PageQuery {
            page: Some(-5),
            limit: Some(-1),
        };
        assert_eq!(query.resolve(), (1, 1, 0));
    }
}
