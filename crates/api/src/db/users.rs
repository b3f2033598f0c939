//! User and role repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use davistore_core::{Email, RoleId, RoleName, UserId};

use super::RepositoryError;
use crate::models::user::{Role, User, UserWithRole};

/// Shared SELECT list for user-with-role queries.
const USER_WITH_ROLE_COLUMNS: &str = "u.id, u.email, u.first_name, u.last_name, u.phone, \
     u.role_id, u.is_active, u.created_at, u.updated_at, \
     r.name AS role_name, r.display_name AS role_display_name, \
     r.description AS role_description, r.is_active AS role_is_active, \
     r.created_at AS role_created_at, r.updated_at AS role_updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserWithRoleRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role_id: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_name: String,
    role_display_name: String,
    role_description: Option<String>,
    role_is_active: bool,
    role_created_at: DateTime<Utc>,
    role_updated_at: DateTime<Utc>,
}

impl TryFrom<UserWithRoleRow> for UserWithRole {
    type Error = RepositoryError;

    fn try_from(row: UserWithRoleRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role_name: RoleName = row
            .role_name
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            user: User {
                id: UserId::new(row.id),
                email,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                role_id: RoleId::new(row.role_id),
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            role: Role {
                id: RoleId::new(row.role_id),
                name: role_name,
                display_name: row.role_display_name,
                description: row.role_description,
                is_active: row.role_is_active,
                created_at: row.role_created_at,
                updated_at: row.role_updated_at,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: i32,
    name: String,
    display_name: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
    type Error = RepositoryError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let name: RoleName = row.name.parse().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: RoleId::new(row.id),
            name,
            display_name: row.display_name,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Fields for inserting a new user.
#[derive(Debug)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role_id: RoleId,
}

/// Partial update of a user. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<Email>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<RoleId>,
}

impl UserChanges {
    /// Whether the update carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.role_id.is_none()
    }
}

/// Filters for the user list endpoint.
#[derive(Debug, Default)]
pub struct UserListFilter {
    /// Free-text match over email, first name, and last name.
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub role_id: Option<RoleId>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user and role database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a role by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_role(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, display_name, description, is_active, created_at, updated_at \
             FROM roles WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Look up a role ID by its well-known name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn role_id_by_name(&self, name: RoleName) -> Result<Option<RoleId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE name = $1")
            .bind(name.as_str())
            .fetch_optional(self.pool)
            .await?;

        Ok(id.map(RoleId::new))
    }

    /// Get a user with its role by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<UserWithRole>, RepositoryError> {
        let query = format!(
            "SELECT {USER_WITH_ROLE_COLUMNS} FROM users u \
             INNER JOIN roles r ON u.role_id = r.id WHERE u.id = $1"
        );
        let row = sqlx::query_as::<_, UserWithRoleRow>(&query)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user with its role and password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(UserWithRole, String)>, RepositoryError> {
        let query = format!(
            "SELECT {USER_WITH_ROLE_COLUMNS}, u.password_hash FROM users u \
             INNER JOIN roles r ON u.role_id = r.id WHERE u.email = $1"
        );
        let row = sqlx::query_as::<_, UserAuthRow>(&query)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => {
                let hash = r.password_hash.clone();
                let user = r.into_user()?;
                Ok(Some((user, hash)))
            }
            None => Ok(None),
        }
    }

    /// Whether an email is already taken, optionally excluding one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_taken(
        &self,
        email: &Email,
        exclude: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM users WHERE email = $1 AND ($2::int IS NULL OR id <> $2)",
        )
        .bind(email.as_str())
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_optional(self.pool)
        .await?;

        Ok(existing.is_some())
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::DataCorruption` if the role is missing.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<UserWithRole, RepositoryError> {
        let user_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone, role_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(new_user.email.as_str())
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.phone.as_deref())
        .bind(new_user.role_id.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already registered"))?;

        self.get_by_id(UserId::new(user_id)).await?.ok_or_else(|| {
            RepositoryError::DataCorruption("user vanished right after insert".to_owned())
        })
    }

    /// List users with filters and pagination. Returns the page and the
    /// total row count for the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list(
        &self,
        filter: &UserListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserWithRole>, i64), RepositoryError> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE TRUE");
        push_user_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_WITH_ROLE_COLUMNS} FROM users u \
             INNER JOIN roles r ON u.role_id = r.id WHERE TRUE"
        ));
        push_user_filters(&mut qb, filter);
        qb.push(" ORDER BY u.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<UserWithRoleRow> = qb.build_query_as().fetch_all(self.pool).await?;
        let users = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;

        Ok((users, total))
    }

    /// Apply a partial update to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the update is empty.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<UserWithRole, RepositoryError> {
        if changes.is_empty() {
            return Err(RepositoryError::Invalid("no fields to update".to_owned()));
        }

        let result = sqlx::query(
            "UPDATE users SET \
                 email = COALESCE($2, email), \
                 password_hash = COALESCE($3, password_hash), \
                 first_name = COALESCE($4, first_name), \
                 last_name = COALESCE($5, last_name), \
                 phone = COALESCE($6, phone), \
                 role_id = COALESCE($7, role_id), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.password_hash.as_deref())
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.role_id.map(|r| r.as_i32()))
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already in use"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Activate or deactivate a user (soft delete).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_active(&self, id: UserId, is_active: bool) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_i32())
                .bind(is_active)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Internal row for login queries: user-with-role plus password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserAuthRow {
    #[sqlx(flatten)]
    user: UserWithRoleRow,
    password_hash: String,
}

impl UserAuthRow {
    fn into_user(self) -> Result<UserWithRole, RepositoryError> {
        self.user.try_into()
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserListFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND u.is_active = ").push_bind(is_active);
    }
    if let Some(role_id) = filter.role_id {
        qb.push(" AND u.role_id = ").push_bind(role_id.as_i32());
    }
}
