use crate::error::ApiError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Check if a product with the given name already exists in a shop
pub async fn check_duplicate_product(
    pool: &PgPool,
    shop_id: i32,
    name: &str,
) -> Result<bool, ApiError> {
    tracing::debug!("Checking for duplicate product: {}", name);

    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM products WHERE shop_id = $1 AND name = $2)",
    )
    .bind(shop_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(exists.unwrap_or(false))
}

/// Check if a product name is taken by a different product in the same shop
/// Used by the update path so a product can keep its own name
pub async fn check_duplicate_product_excluding_id(
    pool: &PgPool,
    shop_id: i32,
    name: &str,
    exclude_id: i32,
) -> Result<bool, ApiError> {
    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM products WHERE shop_id = $1 AND name = $2 AND id != $3)",
    )
    .bind(shop_id)
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(exists.unwrap_or(false))
}

/// Overwrite a product's current stock with an absolute value
///
/// The stocktake escape hatch: every other stock mutation in this codebase is
/// an atomic increment/decrement paired with an order or purchase-order write,
/// but a physical recount has no paired document, so this is a deliberate
/// read-free overwrite. Runs in its own transaction so the existence check and
/// the write cannot interleave with a concurrent delete of the product.
pub async fn set_stock_level(
    pool: &PgPool,
    shop_id: i32,
    product_id: i32,
    new_stock: i32,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND shop_id = $2)",
    )
    .bind(product_id)
    .bind(shop_id)
    .fetch_one(&mut *tx)
    .await?;

    if !exists.unwrap_or(false) {
        return Err(ApiError::NotFound {
            resource: "Product".to_string(),
            id: product_id.to_string(),
        });
    }

    sqlx::query("UPDATE products SET current_stock = $1, updated_at = NOW() WHERE id = $2")
        .bind(new_stock)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "Stocktake overwrite: product {} set to {} units",
        product_id,
        new_stock
    );
    Ok(())
}
