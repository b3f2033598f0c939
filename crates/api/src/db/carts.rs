//! Cart repository.
//!
//! Every user has at most one active cart (enforced by a partial unique
//! index). When no active cart exists the user's most recent cart row is
//! recycled: its lines are cleared and its status flips back to active.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use davistore_core::{CartId, CartItemId, CartStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartItemWithProduct, CartWithItems};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let status: CartStatus = row.status.parse().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    quantity: i32,
    price_at_addition: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_name: String,
    product_sku: String,
    product_image_url: Option<String>,
    product_stock: i32,
    current_price: Decimal,
}

impl From<CartItemRow> for CartItemWithProduct {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price_at_addition: row.price_at_addition,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product_name: row.product_name,
            product_sku: row.product_sku,
            product_image_url: row.product_image_url,
            product_stock: row.product_stock,
            current_price: row.current_price,
        }
    }
}

const CART_COLUMNS: &str = "id, user_id, status, created_at, updated_at";

const CART_ITEM_COLUMNS: &str = "ci.id, ci.cart_id, ci.product_id, ci.quantity, \
     ci.price_at_addition, ci.created_at, ci.updated_at, \
     p.name AS product_name, p.sku AS product_sku, p.image_url AS product_image_url, \
     p.stock_quantity AS product_stock, p.price AS current_price";

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the user's active cart with items, creating (or recycling) the
    /// cart row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart = active_cart(&mut tx, user_id).await?;
        let items = load_items(&mut tx, cart.id).await?;
        tx.commit().await?;

        Ok(CartWithItems::assemble(cart.try_into()?, items_into(items)))
    }

    /// Add a product to the user's active cart.
    ///
    /// An existing line for the same product merges quantities. The catalog
    /// price is snapshotted into the line at insert time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Invalid` if the product is inactive, the
    /// quantity is not positive, or stock is insufficient.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartWithItems, RepositoryError> {
        if quantity <= 0 {
            return Err(RepositoryError::Invalid(
                "quantity must be greater than 0".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, (String, Decimal, i32, bool)>(
            "SELECT name, price, stock_quantity, is_active FROM products WHERE id = $1",
        )
        .bind(product_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((name, price, stock, is_active)) = product else {
            return Err(RepositoryError::NotFound);
        };

        if !is_active {
            return Err(RepositoryError::Invalid(
                "product is not available".to_owned(),
            ));
        }

        let cart = active_cart(&mut tx, user_id).await?;

        let existing = sqlx::query_as::<_, (i32, i32)>(
            "SELECT id, quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart.id)
        .bind(product_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let requested = existing.map_or(quantity, |(_, in_cart)| in_cart + quantity);
        if requested > stock {
            return Err(RepositoryError::Invalid(format!(
                "insufficient stock for {name}: {stock} available"
            )));
        }

        if let Some((item_id, _)) = existing {
            sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
                .bind(item_id)
                .bind(requested)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query(
                "INSERT INTO cart_items (cart_id, product_id, quantity, price_at_addition) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(cart.id)
            .bind(product_id.as_i32())
            .bind(quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_or_create(user_id).await
    }

    /// Change the quantity of a line in the user's active cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in an active cart.
    /// Returns `RepositoryError::Invalid` for foreign lines, non-positive
    /// quantities, or insufficient stock.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartWithItems, RepositoryError> {
        if quantity <= 0 {
            return Err(RepositoryError::Invalid(
                "quantity must be greater than 0".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let line = sqlx::query_as::<_, (i32, String, i32, i32)>(
            "SELECT c.user_id, p.name, p.stock_quantity, ci.cart_id \
             FROM cart_items ci \
             INNER JOIN carts c ON ci.cart_id = c.id \
             INNER JOIN products p ON ci.product_id = p.id \
             WHERE ci.id = $1 AND c.status = 'active'",
        )
        .bind(item_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((owner_id, name, stock, _cart_id)) = line else {
            return Err(RepositoryError::NotFound);
        };

        if owner_id != user_id.as_i32() {
            return Err(RepositoryError::Invalid(
                "cart item belongs to another user".to_owned(),
            ));
        }

        if quantity > stock {
            return Err(RepositoryError::Invalid(format!(
                "insufficient stock for {name}: {stock} available"
            )));
        }

        sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(item_id.as_i32())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_or_create(user_id).await
    }

    /// Remove a line from the user's active cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in an active cart.
    /// Returns `RepositoryError::Invalid` for foreign lines.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query_scalar::<_, i32>(
            "SELECT c.user_id FROM cart_items ci \
             INNER JOIN carts c ON ci.cart_id = c.id \
             WHERE ci.id = $1 AND c.status = 'active'",
        )
        .bind(item_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(owner_id) = owner else {
            return Err(RepositoryError::NotFound);
        };

        if owner_id != user_id.as_i32() {
            return Err(RepositoryError::Invalid(
                "cart item belongs to another user".to_owned(),
            ));
        }

        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_or_create(user_id).await
    }

    /// Remove every line from the user's active cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<CartWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart = active_cart(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_or_create(user_id).await
    }
}

/// Find the user's active cart within a transaction, recycling the most
/// recent old cart row or inserting a fresh one if none is active.
async fn active_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<CartRow, RepositoryError> {
    let query = format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND status = 'active'");
    if let Some(cart) = sqlx::query_as::<_, CartRow>(&query)
        .bind(user_id.as_i32())
        .fetch_optional(&mut **tx)
        .await?
    {
        return Ok(cart);
    }

    let leftover = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM carts WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1",
    )
    .bind(user_id.as_i32())
    .fetch_optional(&mut **tx)
    .await?;

    let cart = if let Some(cart_id) = leftover {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;

        let query = format!(
            "UPDATE carts SET status = 'active', updated_at = NOW() \
             WHERE id = $1 RETURNING {CART_COLUMNS}"
        );
        sqlx::query_as::<_, CartRow>(&query)
            .bind(cart_id)
            .fetch_one(&mut **tx)
            .await?
    } else {
        let query = format!(
            "INSERT INTO carts (user_id, status) VALUES ($1, 'active') RETURNING {CART_COLUMNS}"
        );
        sqlx::query_as::<_, CartRow>(&query)
            .bind(user_id.as_i32())
            .fetch_one(&mut **tx)
            .await?
    };

    Ok(cart)
}

async fn load_items(
    tx: &mut Transaction<'_, Postgres>,
    cart_id: i32,
) -> Result<Vec<CartItemRow>, RepositoryError> {
    let query = format!(
        "SELECT {CART_ITEM_COLUMNS} FROM cart_items ci \
         INNER JOIN products p ON ci.product_id = p.id \
         WHERE ci.cart_id = $1 ORDER BY ci.created_at DESC"
    );
    let rows = sqlx::query_as::<_, CartItemRow>(&query)
        .bind(cart_id)
        .fetch_all(&mut **tx)
        .await?;

    Ok(rows)
}

fn items_into(rows: Vec<CartItemRow>) -> Vec<CartItemWithProduct> {
    rows.into_iter().map(Into::into).collect()
}
