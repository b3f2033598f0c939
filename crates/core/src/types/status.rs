//! Status enums for storefront entities.
//!
//! All of these are stored as lowercase TEXT in `PostgreSQL` (with CHECK
//! constraints in the migrations) and round-trip through `Display`/`FromStr`.

use serde::{Deserialize, Serialize};

/// Role names known to the application.
///
/// Roles live in the `roles` table; these are the names the code gates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Regular storefront customer.
    Customer,
    /// Store administrator with full access.
    Admin,
}

/// Lifecycle of a shopping cart.
///
/// A user has at most one `Active` cart; checkout flips it to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

/// Order lifecycle.
///
/// `Cancelled` and `Completed` are terminal: no further transitions allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether an order in this status may still change status.
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Transfer,
}

/// Payment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Refunded,
}

macro_rules! impl_text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The lowercase text stored in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("invalid ", stringify!($name), ": {}"),
                        other
                    )),
                }
            }
        }
    };
}

impl_text_enum!(RoleName {
    Customer => "customer",
    Admin => "admin",
});

impl_text_enum!(CartStatus {
    Active => "active",
    Completed => "completed",
    Abandoned => "abandoned",
});

impl_text_enum!(OrderStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl_text_enum!(PaymentMethod {
    CreditCard => "credit_card",
    DebitCard => "debit_card",
    Paypal => "paypal",
    Transfer => "transfer",
});

impl_text_enum!(PaymentStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Refunded => "refunded",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }

        let method: PaymentMethod = "credit_card".parse().unwrap();
        assert_eq!(method, PaymentMethod::CreditCard);
    }

    #[test]
    fn test_unknown_text_rejected() {
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("cash".parse::<PaymentMethod>().is_err());
        assert!("root".parse::<RoleName>().is_err());
    }

    #[test]
    fn test_serde_matches_db_text() {
        let json = serde_json::to_string(&CartStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");

        let status: PaymentStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, PaymentStatus::Refunded);

        // serde names and database text must agree
        let json = serde_json::to_string(&PaymentMethod::DebitCard).unwrap();
        assert_eq!(json, format!("\"{}\"", PaymentMethod::DebitCard.as_str()));
    }

    #[test]
    fn test_terminal_statuses_are_immutable() {
        assert!(OrderStatus::Pending.is_mutable());
        assert!(OrderStatus::Processing.is_mutable());
        assert!(!OrderStatus::Completed.is_mutable());
        assert!(!OrderStatus::Cancelled.is_mutable());
    }
}
