use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::orders::cart::{CartCalculator, CartLine, DiscountSpec, OverflowPolicy};
use crate::orders::error::OrderError;
use crate::orders::models::{Order, OrderItem, UpdatedItemRequest};

/// Pricing snapshot of a product, fetched for cart validation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductPricing {
    pub id: i32,
    pub name: String,
    pub sell_price: Decimal,
    pub floor_price: Decimal,
    pub cost_price: Decimal,
    pub current_stock: i32,
}

/// Repository for product lookups used by the order flows
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new ProductRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch pricing snapshots for a set of products, scoped to one shop
    pub async fn find_pricing_by_ids(
        &self,
        shop_id: i32,
        ids: &[i32],
    ) -> Result<Vec<ProductPricing>, OrderError> {
        let products = sqlx::query_as::<_, ProductPricing>(
            "SELECT id, name, sell_price, floor_price, cost_price, current_stock
             FROM products
             WHERE shop_id = $1 AND id = ANY($2)",
        )
        .bind(shop_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

/// A fully-resolved order line ready for persistence
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub sold_at: Decimal,
    pub cost_at_sale: Decimal,
    /// Per-unit share of the order discount
    pub discount: Decimal,
}

/// Row shape used by the edit path: the item joined with its product's
/// current floor price. A deleted product contributes its own sold_at as the
/// floor, i.e. no discount headroom on dangling lines.
#[derive(Debug, sqlx::FromRow)]
struct EditableItem {
    id: i32,
    product_id: Option<i32>,
    quantity: i32,
    sold_at: Decimal,
    floor_price: Decimal,
}

/// Repository for order operations
///
/// Every method that touches stock runs as one all-or-nothing transaction:
/// order rows, item rows and stock ledger deltas commit together or not at
/// all. Stock is only ever mutated by atomic increments/decrements so that
/// concurrent transactions on the same product compose under the database's
/// isolation level.
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    /// Create a new OrdersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with its items, decrementing stock for each line
    ///
    /// The decrement is guarded by `current_stock >= quantity`; a concurrent
    /// sale that got there first fails this transaction instead of driving
    /// stock negative.
    pub async fn create(
        &self,
        shop_id: i32,
        total_amount: Decimal,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (shop_id, total_amount)
            VALUES ($1, $2)
            RETURNING id, shop_id, total_amount, created_at, updated_at
            "#,
        )
        .bind(shop_id)
        .bind(total_amount)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (order_id, product_id, product_name, quantity, sold_at, cost_at_sale, discount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.sold_at)
            .bind(item.cost_at_sale)
            .bind(item.discount)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock - $1, updated_at = NOW()
                WHERE id = $2 AND shop_id = $3 AND current_stock >= $1
                "#,
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // Distinguish a vanished product from an oversold one; either
                // way the transaction is dropped and rolls back
                let available: Option<i32> = sqlx::query_scalar(
                    "SELECT current_stock FROM products WHERE id = $1 AND shop_id = $2",
                )
                .bind(item.product_id)
                .bind(shop_id)
                .fetch_optional(&mut *tx)
                .await?;

                return Err(match available {
                    Some(available) => OrderError::InsufficientStock {
                        product_id: item.product_id,
                        available,
                        requested: item.quantity,
                    },
                    None => OrderError::ProductNotFound(item.product_id),
                });
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Created order {} with {} items, total {}",
            order.id,
            items.len(),
            order.total_amount
        );
        Ok(order)
    }

    /// Edit an order: new quantities and a new discount specification
    ///
    /// Prices are never re-derived from current product state; the original
    /// sold_at snapshots price every recomputation. Stock is adjusted by the
    /// per-item delta (original minus new), not recomputed from scratch, so
    /// concurrent stock changes from other orders are preserved. Items edited
    /// down to zero (or below) are removed and their full quantity restored.
    pub async fn edit(
        &self,
        shop_id: i32,
        order_id: Uuid,
        updates: &[UpdatedItemRequest],
        spec: &DiscountSpec,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Order>(
            "SELECT id, shop_id, total_amount, created_at, updated_at
             FROM orders WHERE id = $1 AND shop_id = $2",
        )
        .bind(order_id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_none() {
            return Err(OrderError::NotFound);
        }

        let items = sqlx::query_as::<_, EditableItem>(
            r#"
            SELECT oi.id, oi.product_id, oi.quantity, oi.sold_at,
                   COALESCE(p.floor_price, oi.sold_at) AS floor_price
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let requested: HashMap<i32, i32> =
            updates.iter().map(|u| (u.id, u.quantity)).collect();

        for update in updates {
            if !items.iter().any(|i| i.id == update.id) {
                return Err(OrderError::ValidationError(format!(
                    "Item {} does not belong to this order",
                    update.id
                )));
            }
        }

        // Retained items form the new cart; the quote re-validates the
        // discount against current floor prices and original sold_at prices
        let retained: Vec<(&EditableItem, i32)> = items
            .iter()
            .filter_map(|item| {
                let new_quantity = *requested.get(&item.id).unwrap_or(&item.quantity);
                (new_quantity > 0).then_some((item, new_quantity))
            })
            .collect();

        let lines: Vec<CartLine> = retained
            .iter()
            .map(|(item, new_quantity)| CartLine {
                quantity: *new_quantity,
                sell_price: item.sold_at,
                floor_price: item.floor_price,
            })
            .collect();

        let quote = CartCalculator::quote(&lines, spec, OverflowPolicy::Reject)?;

        // Stock deltas, item by item
        for item in &items {
            let new_quantity = *requested.get(&item.id).unwrap_or(&item.quantity);
            let delta = item.quantity - new_quantity.max(0);

            if delta == 0 {
                continue;
            }

            let Some(product_id) = item.product_id else {
                if delta < 0 {
                    return Err(OrderError::ValidationError(format!(
                        "Cannot increase quantity of item {}: its product no longer exists",
                        item.id
                    )));
                }
                // Restoring stock for a vanished product is skipped, mirroring
                // the delete path
                continue;
            };

            if delta > 0 {
                sqlx::query(
                    "UPDATE products SET current_stock = current_stock + $1, updated_at = NOW()
                     WHERE id = $2",
                )
                .bind(delta)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            } else {
                let needed = -delta;
                let updated = sqlx::query(
                    r#"
                    UPDATE products
                    SET current_stock = current_stock - $1, updated_at = NOW()
                    WHERE id = $2 AND current_stock >= $1
                    "#,
                )
                .bind(needed)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    let available: Option<i32> = sqlx::query_scalar(
                        "SELECT current_stock FROM products WHERE id = $1",
                    )
                    .bind(product_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    return Err(match available {
                        Some(available) => OrderError::InsufficientStock {
                            product_id,
                            available,
                            requested: needed,
                        },
                        None => OrderError::ProductNotFound(product_id),
                    });
                }
            }
        }

        // Item rows: removed items go away, retained ones get the new
        // quantity and re-allocated per-unit discount
        for item in &items {
            let new_quantity = *requested.get(&item.id).unwrap_or(&item.quantity);
            if new_quantity <= 0 {
                sqlx::query("DELETE FROM order_items WHERE id = $1")
                    .bind(item.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for ((item, new_quantity), per_unit) in
            retained.iter().zip(quote.unit_discounts.iter())
        {
            sqlx::query("UPDATE order_items SET quantity = $1, discount = $2 WHERE id = $3")
                .bind(new_quantity)
                .bind(per_unit)
                .bind(item.id)
                .execute(&mut *tx)
                .await?;
        }

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET total_amount = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, shop_id, total_amount, created_at, updated_at
            "#,
        )
        .bind(quote.grand_total)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Edited order {}, new total {}", order.id, order.total_amount);
        Ok(order)
    }

    /// Delete an order, restoring stock for every item first
    ///
    /// Items whose product no longer exists are skipped rather than failing
    /// the whole deletion; one dangling reference must not block the reversal
    /// of the rest.
    pub async fn delete(&self, shop_id: i32, order_id: Uuid) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM orders WHERE id = $1 AND shop_id = $2")
                .bind(order_id)
                .bind(shop_id)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            return Err(OrderError::NotFound);
        }

        let items: Vec<(Option<i32>, i32)> = sqlx::query_as(
            "SELECT product_id, quantity FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in items {
            if let Some(product_id) = product_id {
                sqlx::query(
                    "UPDATE products SET current_stock = current_stock + $1, updated_at = NOW()
                     WHERE id = $2",
                )
                .bind(quantity)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        // Items cascade with the order row
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Deleted order {} and restored its stock", order_id);
        Ok(())
    }

    /// Find an order by ID within a shop
    pub async fn find_by_id(
        &self,
        shop_id: i32,
        order_id: Uuid,
    ) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, shop_id, total_amount, created_at, updated_at
             FROM orders WHERE id = $1 AND shop_id = $2",
        )
        .bind(order_id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// List a shop's orders, newest first
    pub async fn list_by_shop(&self, shop_id: i32) -> Result<Vec<Order>, OrderError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, shop_id, total_amount, created_at, updated_at
             FROM orders WHERE shop_id = $1
             ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

/// Repository for order item reads
#[derive(Clone)]
pub struct OrderItemsRepository {
    pool: PgPool,
}

impl OrderItemsRepository {
    /// Create a new OrderItemsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find all items for a given order
    pub async fn find_by_order_id(&self, order_id: Uuid) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, sold_at, cost_at_sale, discount
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    // Transactional behavior (rollback on failure, guarded decrements,
    // delta-based restocking) is exercised end to end in the DB-backed tests
    // in src/tests.rs; there is no meaningful unit to test here without a
    // live Postgres.
}
