//! JWT issuance and verification.
//!
//! Two HS256 secrets are in play: access tokens are short-lived and sent on
//! every request; refresh tokens are long-lived and only accepted by the
//! refresh endpoint. Signing one kind with the other's secret fails
//! verification.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use davistore_core::{RoleId, UserId};

use crate::config::JwtConfig;
use crate::models::user::UserWithRole;

use super::AuthError;

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i32,
    /// User email at issuance time.
    pub email: String,
    /// Role ID at issuance time.
    pub role_id: i32,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The user this token was issued to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }

    /// The role recorded at issuance time.
    #[must_use]
    pub const fn role_id(&self) -> RoleId {
        RoleId::new(self.role_id)
    }
}

/// An access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies the two token kinds.
///
/// Keys are derived from the configured secrets once at startup.
pub struct TokenSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    refresh_ttl_secs: i64,
}

impl TokenSigner {
    /// Build a signer from JWT configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let access = config.access_secret.expose_secret().as_bytes();
        let refresh = config.refresh_secret.expose_secret().as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            access_ttl_secs: config.access_ttl_secs,
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    /// Issue an access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` if signing fails (should not
    /// happen with HS256 keys).
    pub fn issue_pair(&self, user: &UserWithRole) -> Result<TokenPair, AuthError> {
        let access_token = issue(user, &self.access_encoding, self.access_ttl_secs)?;
        let refresh_token = issue(user, &self.refresh_encoding, self.refresh_ttl_secs)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for stale tokens and
    /// `AuthError::TokenInvalid` for anything else that fails validation.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.access_decoding)
    }

    /// Verify a refresh token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for stale tokens and
    /// `AuthError::TokenInvalid` for anything else that fails validation.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.refresh_decoding)
    }
}

fn issue(user: &UserWithRole, key: &EncodingKey, ttl_secs: i64) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.user.id.as_i32(),
        email: user.user.email.as_str().to_owned(),
        role_id: user.user.role_id.as_i32(),
        iat: now,
        exp: now + ttl_secs,
    };

    encode(&Header::new(Algorithm::HS256), &claims, key).map_err(|_| AuthError::TokenInvalid)
}

fn verify(token: &str, key: &DecodingKey) -> Result<Claims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use davistore_core::{Email, RoleName};
    use secrecy::SecretString;

    use crate::models::user::{Role, User};

    fn signer(access_ttl: i64) -> TokenSigner {
        TokenSigner::new(&JwtConfig {
            access_secret: SecretString::from("access-test-key-0123456789abcdef"),
            access_ttl_secs: access_ttl,
            refresh_secret: SecretString::from("refresh-test-key-0123456789abcdef"),
            refresh_ttl_secs: access_ttl * 2,
        })
    }

    fn user() -> UserWithRole {
        let now = Utc::now();
        UserWithRole {
            user: User {
                id: UserId::new(7),
                email: Email::parse("jwt@example.com").unwrap(),
                first_name: "J".to_string(),
                last_name: "W".to_string(),
                phone: None,
                role_id: RoleId::new(1),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            role: Role {
                id: RoleId::new(1),
                name: RoleName::Customer,
                display_name: "Customer".to_string(),
                description: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn test_pair_roundtrip() {
        let signer = signer(900);
        let pair = signer.issue_pair(&user()).unwrap();

        let access = signer.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.user_id(), UserId::new(7));
        assert_eq!(access.email, "jwt@example.com");
        assert_eq!(access.role_id(), RoleId::new(1));

        let refresh = signer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.user_id(), UserId::new(7));
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let signer = signer(900);
        let pair = signer.issue_pair(&user()).unwrap();

        assert!(matches!(
            signer.verify_access(&pair.refresh_token),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            signer.verify_refresh(&pair.access_token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // expired well past the default validation leeway
        let signer = signer(-3600);
        let pair = signer.issue_pair(&user()).unwrap();

        assert!(matches!(
            signer.verify_access(&pair.access_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let signer = signer(900);
        assert!(matches!(
            signer.verify_access("not-a-token"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
