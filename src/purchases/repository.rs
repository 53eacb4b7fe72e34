use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::purchases::error::PurchaseError;
use crate::purchases::models::{PurchaseOrder, PurchaseOrderItem};

/// Deletion is a business-rule-gated undo, not a general operation: a receipt
/// older than this is assumed reconciled into accounting
const DELETE_WINDOW_HOURS: i64 = 24;

/// A resolved purchase line ready for persistence
#[derive(Debug, Clone)]
pub struct NewPurchaseItem {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// Repository for purchase-order operations
///
/// Like the order repository, every stock mutation happens inside the same
/// transaction as the purchase-order write it is paired with, as an atomic
/// increment/decrement.
#[derive(Clone)]
pub struct PurchasesRepository {
    pool: PgPool,
}

impl PurchasesRepository {
    /// Create a new PurchasesRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a received shipment: the purchase order, its items, and the
    /// stock/cost effects on each product, all in one transaction
    ///
    /// Each received line increments both stock counters and overwrites the
    /// product's cost price with the latest acquisition cost.
    pub async fn create(
        &self,
        shop_id: i32,
        supplier_name: &str,
        total_cost: Decimal,
        items: Vec<NewPurchaseItem>,
    ) -> Result<PurchaseOrder, PurchaseError> {
        let mut tx = self.pool.begin().await?;

        let purchase_order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (shop_id, supplier_name, total_cost)
            VALUES ($1, $2, $3)
            RETURNING id, shop_id, supplier_name, total_cost, created_at
            "#,
        )
        .bind(shop_id)
        .bind(supplier_name)
        .bind(total_cost)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (purchase_order_id, product_id, quantity, unit_cost)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(purchase_order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_cost)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock + $1,
                    total_stock = total_stock + $1,
                    cost_price = $2,
                    updated_at = NOW()
                WHERE id = $3 AND shop_id = $4
                "#,
            )
            .bind(item.quantity)
            .bind(item.unit_cost)
            .bind(item.product_id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(PurchaseError::ProductNotFound(item.product_id));
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Received purchase order {} from {}, {} lines",
            purchase_order.id,
            supplier_name,
            items.len()
        );
        Ok(purchase_order)
    }

    /// Delete a purchase order, reversing its stock receipt
    ///
    /// Only allowed within 24 hours of creation; after that the rejection is
    /// a business-rule error, deliberately distinct from not-found. The
    /// reversal decrements stock with the same >= guard as a sale, since
    /// received units may already have been sold on.
    pub async fn delete(&self, shop_id: i32, purchase_order_id: Uuid) -> Result<(), PurchaseError> {
        let mut tx = self.pool.begin().await?;

        let purchase_order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT id, shop_id, supplier_name, total_cost, created_at
             FROM purchase_orders WHERE id = $1 AND shop_id = $2",
        )
        .bind(purchase_order_id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PurchaseError::NotFound)?;

        if Utc::now() - purchase_order.created_at > Duration::hours(DELETE_WINDOW_HOURS) {
            return Err(PurchaseError::DeleteWindowExpired {
                window_hours: DELETE_WINDOW_HOURS,
            });
        }

        let items: Vec<(Option<i32>, i32)> = sqlx::query_as(
            "SELECT product_id, quantity FROM purchase_order_items WHERE purchase_order_id = $1",
        )
        .bind(purchase_order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in items {
            let Some(product_id) = product_id else {
                // Product deleted since receipt; nothing to reverse
                continue;
            };

            let updated = sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock - $1, updated_at = NOW()
                WHERE id = $2 AND current_stock >= $1
                "#,
            )
            .bind(quantity)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT current_stock FROM products WHERE id = $1")
                        .bind(product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                match available {
                    Some(available) => {
                        return Err(PurchaseError::StockAlreadyConsumed {
                            product_id,
                            available,
                            required: quantity,
                        });
                    }
                    // Product row vanished between the join and the update
                    None => continue,
                }
            }
        }

        sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(purchase_order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Deleted purchase order {} within its window", purchase_order_id);
        Ok(())
    }

    /// Find a purchase order by ID within a shop
    pub async fn find_by_id(
        &self,
        shop_id: i32,
        purchase_order_id: Uuid,
    ) -> Result<Option<PurchaseOrder>, PurchaseError> {
        let purchase_order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT id, shop_id, supplier_name, total_cost, created_at
             FROM purchase_orders WHERE id = $1 AND shop_id = $2",
        )
        .bind(purchase_order_id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase_order)
    }

    /// List a shop's purchase orders, newest first
    pub async fn list_by_shop(&self, shop_id: i32) -> Result<Vec<PurchaseOrder>, PurchaseError> {
        let purchase_orders = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT id, shop_id, supplier_name, total_cost, created_at
             FROM purchase_orders WHERE shop_id = $1
             ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchase_orders)
    }

    /// Find all items for a given purchase order
    pub async fn find_items(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderItem>, PurchaseError> {
        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT id, purchase_order_id, product_id, quantity, unit_cost
             FROM purchase_order_items WHERE purchase_order_id = $1
             ORDER BY id",
        )
        .bind(purchase_order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
