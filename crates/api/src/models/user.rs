//! User and role models.
//!
//! `User` never carries the password hash; repositories return the hash
//! separately where verification needs it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use davistore_core::{Email, RoleId, RoleName, UserId};

/// A role from the `roles` table.
#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user account (password hash excluded).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role_id: RoleId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user joined with its role, the shape most endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role: Role,
}

impl UserWithRole {
    /// Whether this account may act as an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.name == RoleName::Admin && self.role.is_active
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(role_name: RoleName, role_active: bool) -> UserWithRole {
        let now = Utc::now();
        UserWithRole {
            user: User {
                id: UserId::new(1),
                email: Email::parse("a@b.c").unwrap(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone: None,
                role_id: RoleId::new(2),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            role: Role {
                id: RoleId::new(2),
                name: role_name,
                display_name: "Role".to_string(),
                description: None,
                is_active: role_active,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn test_is_admin() {
        assert!(sample(RoleName::Admin, true).is_admin());
        assert!(!sample(RoleName::Admin, false).is_admin());
        assert!(!sample(RoleName::Customer, true).is_admin());
    }

    #[test]
    fn test_serialization_flattens_user_and_hides_hash() {
        let value = serde_json::to_value(sample(RoleName::Customer, true)).unwrap();
        assert_eq!(value["email"], "a@b.c");
        assert_eq!(value["role"]["name"], "customer");
        assert!(value.get("password_hash").is_none());
    }
}
