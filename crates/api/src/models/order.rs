//! Order, order item, and payment models, plus checkout total math.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use davistore_core::{
    OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, ProductId, UserId,
    round_money,
};

/// Tax rate applied at checkout (16% VAT).
pub const TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Flat shipping cost below the free-shipping threshold.
pub const SHIPPING_COST: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// An order row. Totals are computed once at checkout and frozen.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line joined with product details.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemWithProduct {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub product_sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
}

/// The payment attached to an order.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// An order with its lines and payment, the shape order endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemWithProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
}

/// The frozen money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute checkout totals from a cart subtotal.
    ///
    /// Tax is [`TAX_RATE`] of the subtotal; shipping is waived at or above
    /// [`FREE_SHIPPING_THRESHOLD`], otherwise [`SHIPPING_COST`] flat.
    #[must_use]
    pub fn compute(subtotal: Decimal) -> Self {
        let subtotal = round_money(subtotal);
        let tax = round_money(subtotal * TAX_RATE);
        let shipping_cost = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            SHIPPING_COST
        };
        let total = round_money(subtotal + tax + shipping_cost);

        Self {
            subtotal,
            tax,
            shipping_cost,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_have_expected_values() {
        assert_eq!(TAX_RATE.to_string(), "0.16");
        assert_eq!(FREE_SHIPPING_THRESHOLD.to_string(), "500");
        assert_eq!(SHIPPING_COST.to_string(), "50");
    }

    #[test]
    fn test_totals_below_free_shipping() {
        let totals = OrderTotals::compute(Decimal::from(100));
        assert_eq!(totals.subtotal, Decimal::from(100));
        assert_eq!(totals.tax, Decimal::new(1600, 2)); // 16.00
        assert_eq!(totals.shipping_cost, Decimal::from(50));
        assert_eq!(totals.total, Decimal::new(16_600, 2)); // 166.00
    }

    #[test]
    fn test_totals_at_free_shipping_threshold() {
        let totals = OrderTotals::compute(Decimal::from(500));
        assert_eq!(totals.shipping_cost, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::from(80));
        assert_eq!(totals.total, Decimal::from(580));
    }

    #[test]
    fn test_totals_round_to_cents() {
        // 33.33 * 0.16 = 5.3328 -> 5.33
        let totals = OrderTotals::compute(Decimal::new(3333, 2));
        assert_eq!(totals.tax, Decimal::new(533, 2));
        assert_eq!(totals.total, Decimal::new(8866, 2)); // 33.33 + 5.33 + 50
    }

    #[test]
    fn test_totals_zero_subtotal() {
        let totals = OrderTotals::compute(Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.shipping_cost, SHIPPING_COST);
        assert_eq!(totals.total, SHIPPING_COST);
    }
}
