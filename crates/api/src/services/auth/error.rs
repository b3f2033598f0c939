//! Authentication error types.

use davistore_core::EmailError;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password combination is wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with an email that is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// The account has been deactivated.
    #[error("user is inactive")]
    UserInactive,

    /// The account's role has been deactivated.
    #[error("role is inactive")]
    RoleInactive,

    /// No user for the given ID or email.
    #[error("user not found")]
    UserNotFound,

    /// The configured default role is missing from the database.
    #[error("role not found")]
    RoleNotFound,

    /// Password does not meet the strength policy.
    #[error("{0}")]
    WeakPassword(String),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A token is past its expiration.
    #[error("token expired")]
    TokenExpired,

    /// A token failed signature or structural validation.
    #[error("invalid token")]
    TokenInvalid,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Underlying repository failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
