//! Category models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use davistore_core::CategoryId;

/// A product category. `parent_id` makes the tree self-referential.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category with its parent's name and slug joined in.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithParent {
    #[serde(flatten)]
    pub category: Category,
    pub parent_name: Option<String>,
    pub parent_slug: Option<String>,
}

/// A root category with its direct children, for the tree endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithChildren {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}
