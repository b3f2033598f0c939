//! Seed the database with demo catalog data.
//!
//! Inserts a small category tree and a handful of products. Re-running is
//! safe: rows are keyed on slug/SKU and conflicts are skipped.

use rust_decimal::Decimal;

use davistore_api::db;

use super::CliError;

struct SeedProduct {
    sku: &'static str,
    name: &'static str,
    description: &'static str,
    price: Decimal,
    stock: i32,
    category_slug: &'static str,
}

const CATEGORIES: &[(&str, &str, Option<&str>)] = &[
    ("Electronics", "electronics", None),
    ("Audio", "audio", Some("electronics")),
    ("Computers", "computers", Some("electronics")),
    ("Home", "home", None),
];

fn seed_products() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            sku: "AUD-001",
            name: "Wireless Headphones",
            description: "Over-ear wireless headphones with noise cancellation",
            price: Decimal::new(12_999, 2),
            stock: 40,
            category_slug: "audio",
        },
        SeedProduct {
            sku: "AUD-002",
            name: "Bluetooth Speaker",
            description: "Portable speaker with 12-hour battery",
            price: Decimal::new(5999, 2),
            stock: 60,
            category_slug: "audio",
        },
        SeedProduct {
            sku: "CMP-001",
            name: "Mechanical Keyboard",
            description: "Tenkeyless mechanical keyboard, brown switches",
            price: Decimal::new(8950, 2),
            stock: 25,
            category_slug: "computers",
        },
        SeedProduct {
            sku: "CMP-002",
            name: "27\" Monitor",
            description: "27-inch 1440p IPS monitor",
            price: Decimal::new(32_900, 2),
            stock: 15,
            category_slug: "computers",
        },
        SeedProduct {
            sku: "HOM-001",
            name: "Desk Lamp",
            description: "Adjustable LED desk lamp",
            price: Decimal::new(2450, 2),
            stock: 80,
            category_slug: "home",
        },
    ]
}

/// Insert demo categories and products.
///
/// # Errors
///
/// Returns `CliError` if the database URL is missing or a query fails.
pub async fn run() -> Result<(), CliError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Seeding categories...");
    for (name, slug, parent_slug) in CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (name, slug, parent_id) \
             VALUES ($1, $2, (SELECT id FROM categories WHERE slug = $3)) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(name)
        .bind(slug)
        .bind(parent_slug)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeding products...");
    let mut inserted = 0_u32;
    for product in seed_products() {
        let result = sqlx::query(
            "INSERT INTO products (sku, name, description, price, stock_quantity, category_id) \
             VALUES ($1, $2, $3, $4, $5, (SELECT id FROM categories WHERE slug = $6)) \
             ON CONFLICT (sku) DO NOTHING",
        )
        .bind(product.sku)
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.category_slug)
        .execute(&pool)
        .await?;

        inserted += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    tracing::info!(
        "Seeding complete! {} new products ({} skipped as existing)",
        inserted,
        seed_products().len() as u32 - inserted
    );

    Ok(())
}
