//! Shared type definitions.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{
    CartId, CartItemId, CategoryId, OrderId, OrderItemId, PaymentId, ProductId, RoleId, UserId,
};
pub use money::round_money;
pub use status::{CartStatus, OrderStatus, PaymentMethod, PaymentStatus, RoleName};
