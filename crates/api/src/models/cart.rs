//! Cart models.
//!
//! Cart lines snapshot the product price at the moment they are added
//! (`price_at_addition`); the current catalog price rides along for display.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use davistore_core::{CartId, CartItemId, CartStatus, ProductId, UserId, round_money};

/// A shopping cart row.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with product details.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemWithProduct {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price_at_addition: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_name: String,
    pub product_sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    pub product_stock: i32,
    pub current_price: Decimal,
}

/// A cart with its lines and derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartWithItems {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItemWithProduct>,
    pub total_items: i64,
    pub subtotal: Decimal,
}

impl CartWithItems {
    /// Assemble a cart from its row and lines, computing the totals.
    #[must_use]
    pub fn assemble(cart: Cart, items: Vec<CartItemWithProduct>) -> Self {
        let total_items = items.iter().map(|i| i64::from(i.quantity)).sum();
        let subtotal = round_money(
            items
                .iter()
                .map(|i| i.price_at_addition * Decimal::from(i.quantity))
                .sum(),
        );

        Self {
            cart,
            items,
            total_items,
            subtotal,
        }
    }

    /// Condensed view for the summary endpoint.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            total_items: self.total_items,
            subtotal: self.subtotal,
            items_count: self.items.len(),
        }
    }
}

/// Condensed cart view: counts and subtotal only.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub total_items: i64,
    pub subtotal: Decimal,
    pub items_count: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: Decimal) -> CartItemWithProduct {
        let now = Utc::now();
        CartItemWithProduct {
            id: CartItemId::new(1),
            cart_id: CartId::new(1),
            product_id: ProductId::new(1),
            quantity,
            price_at_addition: price,
            created_at: now,
            updated_at: now,
            product_name: "Widget".to_string(),
            product_sku: "WID-001".to_string(),
            product_image_url: None,
            product_stock: 10,
            current_price: price,
        }
    }

    fn cart() -> Cart {
        let now = Utc::now();
        Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            status: CartStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_assemble_totals() {
        let items = vec![
            line(2, Decimal::new(1999, 2)), // 2 x 19.99
            line(1, Decimal::new(500, 2)),  // 1 x 5.00
        ];
        let cart = CartWithItems::assemble(cart(), items);

        assert_eq!(cart.total_items, 3);
        assert_eq!(cart.subtotal, Decimal::new(4498, 2)); // 44.98
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = CartWithItems::assemble(cart(), vec![]);
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert_eq!(cart.summary().items_count, 0);
    }
}
