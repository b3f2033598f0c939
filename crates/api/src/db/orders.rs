//! Order repository: checkout, status transitions, and queries.
//!
//! Checkout and every status change run inside a single transaction so the
//! order, its lines, the payment, the cart, and product stock always move
//! together.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use davistore_core::{
    OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, ProductId, UserId,
    round_money,
};

use super::RepositoryError;
use crate::models::order::{
    Order, OrderItemWithProduct, OrderTotals, OrderWithItems, PaymentSummary,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: String,
    subtotal: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    shipping_address: String,
    shipping_city: String,
    shipping_state: String,
    shipping_zip: String,
    shipping_country: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            subtotal: row.subtotal,
            tax: row.tax,
            shipping_cost: row.shipping_cost,
            total: row.total,
            shipping_address: row.shipping_address,
            shipping_city: row.shipping_city,
            shipping_state: row.shipping_state,
            shipping_zip: row.shipping_zip,
            shipping_country: row.shipping_country,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
    created_at: DateTime<Utc>,
    product_name: String,
    product_sku: String,
    product_image_url: Option<String>,
}

impl From<OrderItemRow> for OrderItemWithProduct {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            created_at: row.created_at,
            product_name: row.product_name,
            product_sku: row.product_sku,
            product_image_url: row.product_image_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    method: String,
    status: String,
    transaction_id: Option<String>,
}

impl TryFrom<PaymentRow> for PaymentSummary {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method: PaymentMethod = row.method.parse().map_err(RepositoryError::DataCorruption)?;
        let status: PaymentStatus = row.status.parse().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: PaymentId::new(row.id),
            method,
            status,
            transaction_id: row.transaction_id,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, subtotal, tax, shipping_cost, total, \
     shipping_address, shipping_city, shipping_state, shipping_zip, shipping_country, \
     notes, created_at, updated_at";

// =============================================================================
// Input Types
// =============================================================================

/// Shipping destination captured at checkout.
#[derive(Debug, Clone)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Checkout request.
#[derive(Debug)]
pub struct NewOrder {
    pub payment_method: PaymentMethod,
    pub shipping: ShippingAddress,
    pub notes: Option<String>,
}

/// Filters for the order list endpoint.
#[derive(Debug, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    /// Restrict to one user's orders (customers see only their own).
    pub user_id: Option<UserId>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the user's active cart into an order (checkout).
    ///
    /// Validates stock per line, freezes the totals, inserts the order with
    /// its lines and a pending payment, decrements stock, and completes the
    /// cart. Everything runs in one transaction; any failure rolls the
    /// whole checkout back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the cart is empty or a line
    /// exceeds current stock.
    pub async fn checkout(
        &self,
        user_id: UserId,
        new_order: &NewOrder,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart_id = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM carts WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(cart_id) = cart_id else {
            return Err(RepositoryError::Invalid("cart is empty".to_owned()));
        };

        // (product_id, quantity, price_at_addition, name, stock)
        let lines = sqlx::query_as::<_, (i32, i32, Decimal, String, i32)>(
            "SELECT ci.product_id, ci.quantity, ci.price_at_addition, p.name, p.stock_quantity \
             FROM cart_items ci \
             INNER JOIN products p ON ci.product_id = p.id \
             WHERE ci.cart_id = $1 \
             ORDER BY ci.created_at",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(RepositoryError::Invalid("cart is empty".to_owned()));
        }

        for (_, quantity, _, name, stock) in &lines {
            if quantity > stock {
                return Err(RepositoryError::Invalid(format!(
                    "insufficient stock for {name}: {stock} available"
                )));
            }
        }

        let subtotal: Decimal = lines
            .iter()
            .map(|(_, quantity, price, _, _)| *price * Decimal::from(*quantity))
            .sum();
        let totals = OrderTotals::compute(subtotal);

        let order_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO orders (user_id, status, subtotal, tax, shipping_cost, total, \
                                 shipping_address, shipping_city, shipping_state, \
                                 shipping_zip, shipping_country, notes) \
             VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(totals.subtotal)
        .bind(totals.tax)
        .bind(totals.shipping_cost)
        .bind(totals.total)
        .bind(&new_order.shipping.address)
        .bind(&new_order.shipping.city)
        .bind(&new_order.shipping.state)
        .bind(&new_order.shipping.zip)
        .bind(&new_order.shipping.country)
        .bind(new_order.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for (product_id, quantity, price, _, _) in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(price)
            .bind(round_money(*price * Decimal::from(*quantity)))
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO payments (order_id, method, status, amount) \
             VALUES ($1, $2, 'pending', $3)",
        )
        .bind(order_id)
        .bind(new_order.payment_method.as_str())
        .bind(totals.total)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE carts SET status = 'completed', updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_by_id(OrderId::new(order_id), None)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get an order with its items and payment, optionally scoped to an
    /// owning user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(
        &self,
        id: OrderId,
        scope_user: Option<UserId>,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE id = $1 AND ($2::int IS NULL OR user_id = $2)"
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id.as_i32())
            .bind(scope_user.map(|u| u.as_i32()))
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price, \
                    oi.subtotal, oi.created_at, \
                    p.name AS product_name, p.sku AS product_sku, \
                    p.image_url AS product_image_url \
             FROM order_items oi \
             INNER JOIN products p ON oi.product_id = p.id \
             WHERE oi.order_id = $1 \
             ORDER BY oi.created_at DESC",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let payment = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, method, status, transaction_id FROM payments WHERE order_id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(Some(OrderWithItems {
            order: row.try_into()?,
            items: items.into_iter().map(Into::into).collect(),
            payment: payment.map(TryInto::try_into).transpose()?,
        }))
    }

    /// List orders with filters and pagination. Returns the page (each
    /// order with items and payment) and the total row count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderWithItems>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o WHERE TRUE");
        push_order_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT o.id FROM orders o WHERE TRUE");
        push_order_filters(&mut qb, filter);
        qb.push(" ORDER BY o.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let ids: Vec<i32> = qb.build_query_scalar().fetch_all(self.pool).await?;

        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = self.get_by_id(OrderId::new(id), None).await? {
                orders.push(order);
            }
        }

        Ok((orders, total))
    }

    /// Change an order's status (admin operation).
    ///
    /// `cancelled` and `completed` orders are frozen. Completing an order
    /// approves its payment; cancelling restores stock and refunds it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Invalid` for forbidden transitions.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, String>("SELECT status FROM orders WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Err(RepositoryError::NotFound);
        };
        let current: OrderStatus = current.parse().map_err(RepositoryError::DataCorruption)?;

        if !current.is_mutable() {
            return Err(RepositoryError::Invalid(format!(
                "a {current} order cannot be modified"
            )));
        }

        sqlx::query(
            "UPDATE orders SET status = $2, notes = COALESCE($3, notes), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(status.as_str())
        .bind(notes)
        .execute(&mut *tx)
        .await?;

        match status {
            OrderStatus::Completed => {
                sqlx::query(
                    "UPDATE payments SET status = 'approved', payment_date = NOW() \
                     WHERE order_id = $1",
                )
                .bind(id.as_i32())
                .execute(&mut *tx)
                .await?;
            }
            OrderStatus::Cancelled => {
                restock_order(&mut tx, id).await?;
                refund_payment(&mut tx, id).await?;
            }
            OrderStatus::Pending | OrderStatus::Processing => {}
        }

        tx.commit().await?;

        self.get_by_id(id, None).await?.ok_or(RepositoryError::NotFound)
    }

    /// Cancel an order on behalf of its owner.
    ///
    /// Only `pending` orders can be cancelled by customers; stock is
    /// restored and the payment refunded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Invalid` for foreign or non-pending orders.
    pub async fn cancel(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, (i32, String)>(
            "SELECT user_id, status FROM orders WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((owner_id, status)) = order else {
            return Err(RepositoryError::NotFound);
        };

        if owner_id != user_id.as_i32() {
            return Err(RepositoryError::Invalid(
                "order belongs to another user".to_owned(),
            ));
        }

        let status: OrderStatus = status.parse().map_err(RepositoryError::DataCorruption)?;
        if status != OrderStatus::Pending {
            return Err(RepositoryError::Invalid(
                "only pending orders can be cancelled".to_owned(),
            ));
        }

        restock_order(&mut tx, id).await?;

        sqlx::query("UPDATE orders SET status = 'cancelled', updated_at = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        refund_payment(&mut tx, id).await?;

        tx.commit().await?;

        self.get_by_id(id, Some(user_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

/// Give every line's quantity back to product stock.
async fn restock_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    let lines = sqlx::query_as::<_, (i32, i32)>(
        "SELECT product_id, quantity FROM order_items WHERE order_id = $1",
    )
    .bind(order_id.as_i32())
    .fetch_all(&mut **tx)
    .await?;

    for (product_id, quantity) in lines {
        sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn refund_payment(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE payments SET status = 'refunded' WHERE order_id = $1")
        .bind(order_id.as_i32())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderListFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status.as_str());
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND o.user_id = ").push_bind(user_id.as_i32());
    }
}
