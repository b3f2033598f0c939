//! Request middleware and extractors.

pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, RequireAdmin, ensure_owner_or_admin, is_admin};
pub use request_id::request_id_middleware;
