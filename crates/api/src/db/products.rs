//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use davistore_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::product::{Product, ProductWithCategory};

/// Shared SELECT list for product-with-category queries.
const PRODUCT_WITH_CATEGORY_COLUMNS: &str = "p.id, p.sku, p.name, p.description, p.price, \
     p.stock_quantity, p.category_id, p.image_url, p.is_active, p.created_at, p.updated_at, \
     c.name AS category_name, c.slug AS category_slug";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    sku: String,
    name: String,
    description: String,
    price: Decimal,
    stock_quantity: i32,
    category_id: i32,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            sku: row.sku,
            name: row.name,
            description: row.description,
            price: row.price,
            stock_quantity: row.stock_quantity,
            category_id: CategoryId::new(row.category_id),
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductWithCategoryRow {
    #[sqlx(flatten)]
    product: ProductRow,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl From<ProductWithCategoryRow> for ProductWithCategory {
    fn from(row: ProductWithCategoryRow) -> Self {
        Self {
            product: row.product.into(),
            category_name: row.category_name,
            category_slug: row.category_slug,
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Fields for inserting a new product.
#[derive(Debug)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}

/// Partial update of a product. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    /// Whether the update carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock_quantity.is_none()
            && self.category_id.is_none()
            && self.image_url.is_none()
            && self.is_active.is_none()
    }
}

/// Filters for the product list endpoint.
#[derive(Debug, Default)]
pub struct ProductListFilter {
    pub category_id: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Free-text match over name, description, and SKU.
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub in_stock: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products with filters and pagination. Returns the page and the
    /// total row count for the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ProductWithCategory>, i64), RepositoryError> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE TRUE");
        push_product_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_WITH_CATEGORY_COLUMNS} FROM products p \
             LEFT JOIN categories c ON p.category_id = c.id WHERE TRUE"
        ));
        push_product_filters(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<ProductWithCategoryRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Get a product (with category info) by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let query = format!(
            "SELECT {PRODUCT_WITH_CATEGORY_COLUMNS} FROM products p \
             LEFT JOIN categories c ON p.category_id = c.id WHERE p.id = $1"
        );
        let row = sqlx::query_as::<_, ProductWithCategoryRow>(&query)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product (with category info) by SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_sku(
        &self,
        sku: &str,
    ) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let query = format!(
            "SELECT {PRODUCT_WITH_CATEGORY_COLUMNS} FROM products p \
             LEFT JOIN categories c ON p.category_id = c.id WHERE p.sku = $1"
        );
        let row = sqlx::query_as::<_, ProductWithCategoryRow>(&query)
            .bind(sku)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is taken.
    /// Returns `RepositoryError::Invalid` if the category doesn't exist.
    pub async fn create(&self, new_product: &NewProduct) -> Result<Product, RepositoryError> {
        let category_exists =
            sqlx::query_scalar::<_, i32>("SELECT id FROM categories WHERE id = $1")
                .bind(new_product.category_id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        if category_exists.is_none() {
            return Err(RepositoryError::Invalid(
                "category does not exist".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (sku, name, description, price, stock_quantity, category_id, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, sku, name, description, price, stock_quantity, category_id, \
                       image_url, is_active, created_at, updated_at",
        )
        .bind(&new_product.sku)
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price)
        .bind(new_product.stock_quantity)
        .bind(new_product.category_id.as_i32())
        .bind(new_product.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "SKU already in use"))?;

        Ok(row.into())
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the update is empty or the
    /// new category doesn't exist.
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        if changes.is_empty() {
            return Err(RepositoryError::Invalid("no fields to update".to_owned()));
        }

        if let Some(category_id) = changes.category_id {
            let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM categories WHERE id = $1")
                .bind(category_id.as_i32())
                .fetch_optional(self.pool)
                .await?;
            if exists.is_none() {
                return Err(RepositoryError::Invalid(
                    "category does not exist".to_owned(),
                ));
            }
        }

        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 stock_quantity = COALESCE($5, stock_quantity), \
                 category_id = COALESCE($6, category_id), \
                 image_url = COALESCE($7, image_url), \
                 is_active = COALESCE($8, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, sku, name, description, price, stock_quantity, category_id, \
                       image_url, is_active, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price)
        .bind(changes.stock_quantity)
        .bind(changes.category_id.map(|c| c.as_i32()))
        .bind(changes.image_url.as_deref())
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Set the absolute stock quantity of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET stock_quantity = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, sku, name, description, price, stock_quantity, category_id, \
                       image_url, is_active, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` while the product sits in an
    /// active cart or is referenced by any order.
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let in_active_cart = sqlx::query_scalar::<_, i32>(
            "SELECT ci.id FROM cart_items ci \
             INNER JOIN carts c ON ci.cart_id = c.id \
             WHERE ci.product_id = $1 AND c.status = 'active' LIMIT 1",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        if in_active_cart.is_some() {
            return Err(RepositoryError::Invalid(
                "cannot delete a product that sits in active carts".to_owned(),
            ));
        }

        let in_orders = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM order_items WHERE product_id = $1 LIMIT 1",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        if in_orders.is_some() {
            return Err(RepositoryError::Invalid(
                "cannot delete a product that is referenced by orders".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
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

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductListFilter) {
    if let Some(category_id) = filter.category_id {
        qb.push(" AND p.category_id = ").push_bind(category_id.as_i32());
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max_price);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND p.is_active = ").push_bind(is_active);
    }
    if filter.in_stock {
        qb.push(" AND p.stock_quantity > 0");
    }
}
