//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use davistore_core::CategoryId;

use super::RepositoryError;
use crate::models::category::{Category, CategoryWithChildren, CategoryWithParent};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            parent_id: row.parent_id.map(CategoryId::new),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryWithParentRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    parent_name: Option<String>,
    parent_slug: Option<String>,
}

impl From<CategoryWithParentRow> for CategoryWithParent {
    fn from(row: CategoryWithParentRow) -> Self {
        Self {
            category: row.category.into(),
            parent_name: row.parent_name,
            parent_slug: row.parent_slug,
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Fields for inserting a new category.
#[derive(Debug)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
}

/// Partial update of a category. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

impl CategoryChanges {
    /// Whether the update carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.parent_id.is_none()
            && self.is_active.is_none()
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories with their parent's name/slug, ordered by name.
    ///
    /// Inactive categories are hidden unless `include_inactive` is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<CategoryWithParent>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryWithParentRow>(
            "SELECT c.id, c.name, c.slug, c.description, c.parent_id, c.is_active, \
                    c.created_at, c.updated_at, \
                    p.name AS parent_name, p.slug AS parent_slug \
             FROM categories c \
             LEFT JOIN categories p ON c.parent_id = p.id \
             WHERE ($1 OR c.is_active) \
             ORDER BY c.name ASC",
        )
        .bind(include_inactive)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active root categories with their active children.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn tree(&self) -> Result<Vec<CategoryWithChildren>, RepositoryError> {
        let roots = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, description, parent_id, is_active, created_at, updated_at \
             FROM categories WHERE parent_id IS NULL AND is_active ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        let mut tree = Vec::with_capacity(roots.len());
        for root in roots {
            let children = sqlx::query_as::<_, CategoryRow>(
                "SELECT id, name, slug, description, parent_id, is_active, created_at, updated_at \
                 FROM categories WHERE parent_id = $1 AND is_active ORDER BY name ASC",
            )
            .bind(root.id)
            .fetch_all(self.pool)
            .await?;

            tree.push(CategoryWithChildren {
                category: root.into(),
                children: children.into_iter().map(Into::into).collect(),
            });
        }

        Ok(tree)
    }

    /// Get a category (with parent info) by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryWithParent>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryWithParentRow>(
            "SELECT c.id, c.name, c.slug, c.description, c.parent_id, c.is_active, \
                    c.created_at, c.updated_at, \
                    p.name AS parent_name, p.slug AS parent_slug \
             FROM categories c \
             LEFT JOIN categories p ON c.parent_id = p.id \
             WHERE c.id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a category (with parent info) by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryWithParent>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryWithParentRow>(
            "SELECT c.id, c.name, c.slug, c.description, c.parent_id, c.is_active, \
                    c.created_at, c.updated_at, \
                    p.name AS parent_name, p.slug AS parent_slug \
             FROM categories c \
             LEFT JOIN categories p ON c.parent_id = p.id \
             WHERE c.slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Whether a category ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar::<_, i32>("SELECT id FROM categories WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Insert a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Invalid` if the parent doesn't exist.
    pub async fn create(&self, new_category: &NewCategory) -> Result<Category, RepositoryError> {
        if let Some(parent_id) = new_category.parent_id
            && !self.exists(parent_id).await?
        {
            return Err(RepositoryError::Invalid(
                "parent category does not exist".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (name, slug, description, parent_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, slug, description, parent_id, is_active, created_at, updated_at",
        )
        .bind(&new_category.name)
        .bind(&new_category.slug)
        .bind(new_category.description.as_deref())
        .bind(new_category.parent_id.map(|p| p.as_i32()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug already in use"))?;

        Ok(row.into())
    }

    /// Apply a partial update to a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the update is empty, the
    /// category would become its own parent, or the parent doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn update(
        &self,
        id: CategoryId,
        changes: &CategoryChanges,
    ) -> Result<Category, RepositoryError> {
        if changes.is_empty() {
            return Err(RepositoryError::Invalid("no fields to update".to_owned()));
        }

        if let Some(parent_id) = changes.parent_id {
            if parent_id == id {
                return Err(RepositoryError::Invalid(
                    "a category cannot be its own parent".to_owned(),
                ));
            }
            if !self.exists(parent_id).await? {
                return Err(RepositoryError::Invalid(
                    "parent category does not exist".to_owned(),
                ));
            }
        }

        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories SET \
                 name = COALESCE($2, name), \
                 slug = COALESCE($3, slug), \
                 description = COALESCE($4, description), \
                 parent_id = COALESCE($5, parent_id), \
                 is_active = COALESCE($6, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, slug, description, parent_id, is_active, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.slug.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.parent_id.map(|p| p.as_i32()))
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug already in use"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` while products or child
    /// categories still reference it.
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_products = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM products WHERE category_id = $1 LIMIT 1",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        if has_products.is_some() {
            return Err(RepositoryError::Invalid(
                "cannot delete a category with products".to_owned(),
            ));
        }

        let has_children = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM categories WHERE parent_id = $1 LIMIT 1",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        if has_children.is_some() {
            return Err(RepositoryError::Invalid(
                "cannot delete a category with subcategories".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
