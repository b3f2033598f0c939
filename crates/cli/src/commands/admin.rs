//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! ds-cli admin create -e admin@example.com -p 'Str0ngPass' --first-name Ada --last-name Admin
//! ```
//!
//! # Environment Variables
//!
//! - `DAVISTORE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use davistore_api::db;
use davistore_api::services::auth::{hash_password, validate_password};
use davistore_core::Email;

use super::CliError;

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `password` - Admin's password (validated against the API policy)
/// * `first_name` / `last_name` - Display name
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns `CliError` for invalid input, a taken email, or database
/// failures.
pub async fn create_user(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<i32, CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidEmail(e.to_string()))?;
    validate_password(password).map_err(|e| CliError::WeakPassword(e.to_string()))?;

    let password_hash =
        hash_password(password).map_err(|e| CliError::BadState(e.to_string()))?;

    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating admin user: {}", email);

    let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(CliError::UserExists(email.into_inner()));
    }

    let role_id = sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE name = 'admin'")
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| {
            CliError::BadState("admin role missing; run `ds-cli migrate` first".to_owned())
        })?;

    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (email, password_hash, first_name, last_name, role_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(first_name)
    .bind(last_name)
    .bind(role_id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user_id,
        email
    );

    Ok(user_id)
}
