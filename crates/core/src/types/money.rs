//! Money helpers.
//!
//! Prices and totals are `rust_decimal::Decimal` end to end; the database
//! columns are `NUMERIC(10,2)`. The only rule enforced here is scale: every
//! amount that leaves a computation is rounded to two decimal places so
//! stored and serialized values agree.

use rust_decimal::Decimal;

/// Number of decimal places for stored monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary amount to the storage scale (banker's rounding).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_truncates_sub_cent() {
        let amount = Decimal::new(123_456, 4); // 12.3456
        assert_eq!(round_money(amount), Decimal::new(1235, 2)); // 12.35
    }

    #[test]
    fn test_round_money_keeps_scale() {
        let amount = Decimal::new(1999, 2); // 19.99
        assert_eq!(round_money(amount), amount);
    }
}
