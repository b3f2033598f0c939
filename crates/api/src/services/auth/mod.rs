//! Authentication service.
//!
//! Registration, login, token refresh, and the password policy live here;
//! the route handlers stay thin.

mod error;
mod tokens;

pub use error::AuthError;
pub use tokens::{Claims, TokenPair, TokenSigner};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use davistore_core::{Email, RoleName, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::user::UserWithRole;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration input. New accounts always get the `customer` role;
/// admins are created via the CLI or promoted by an existing admin.
#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Authentication service.
///
/// Handles user registration, login, and token refresh.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenSigner) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new user and issue its first token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password fails the policy.
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AuthError::RoleNotFound` if the default role is unseeded.
    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<(UserWithRole, TokenPair), AuthError> {
        validate_password(&registration.password)?;
        let email = Email::parse(&registration.email)?;

        if self.users.email_taken(&email, None).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let role_id = self
            .users
            .role_id_by_name(RoleName::Customer)
            .await?
            .ok_or(AuthError::RoleNotFound)?;

        let password_hash = hash_password(&registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                phone: registration.phone,
                role_id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let tokens = self.tokens.issue_pair(&user)?;
        Ok((user, tokens))
    }

    /// Login with email and password.
    ///
    /// Unknown emails and wrong passwords produce the same error so the
    /// response does not reveal which part was wrong.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for bad email/password.
    /// Returns `AuthError::UserInactive` / `AuthError::RoleInactive` for
    /// deactivated accounts.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserWithRole, TokenPair), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.user.is_active {
            return Err(AuthError::UserInactive);
        }
        if !user.role.is_active {
            return Err(AuthError::RoleInactive);
        }

        verify_password(password, &password_hash)?;

        let tokens = self.tokens.issue_pair(&user)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// The user is re-checked against the database so deactivation takes
    /// effect even while refresh tokens are still in the wild.
    ///
    /// # Errors
    ///
    /// Returns token errors from verification, `AuthError::UserNotFound`
    /// for deleted users, and inactive errors for deactivated accounts.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user = self
            .users
            .get_by_id(claims.user_id())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.user.is_active {
            return Err(AuthError::UserInactive);
        }
        if !user.role.is_active {
            return Err(AuthError::RoleInactive);
        }

        Ok(self.tokens.issue_pair(&user)?)
    }

    /// Get the current user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn current_user(&self, user_id: UserId) -> Result<UserWithRole, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate a password against the strength policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` naming the first failed requirement.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one uppercase letter".to_owned(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one lowercase letter".to_owned(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one number".to_owned(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_accepts_strong() {
        assert!(validate_password("Sup3rSecret").is_ok());
    }

    #[test]
    fn test_validate_password_too_short() {
        let err = validate_password("Ab1").unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(msg) if msg.contains("8 characters")));
    }

    #[test]
    fn test_validate_password_requires_uppercase() {
        let err = validate_password("alllower1").unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(msg) if msg.contains("uppercase")));
    }

    #[test]
    fn test_validate_password_requires_lowercase() {
        let err = validate_password("ALLUPPER1").unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(msg) if msg.contains("lowercase")));
    }

    #[test]
    fn test_validate_password_requires_digit() {
        let err = validate_password("NoDigitsHere").unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(msg) if msg.contains("number")));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("Sup3rSecret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Sup3rSecret", &hash).is_ok());
        assert!(matches!(
            verify_password("WrongPassword1", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("Sup3rSecret", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
