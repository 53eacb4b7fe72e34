use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::reports::error::ReportError;
use crate::reports::models::{ProductSalesRow, PurchaseSummary, SalesSummary};

#[derive(sqlx::FromRow)]
struct OrderAggregate {
    order_count: i64,
    revenue: Decimal,
}

#[derive(sqlx::FromRow)]
struct ItemAggregate {
    cost: Decimal,
    discount_given: Decimal,
}

/// Repository for report aggregation queries
///
/// All figures derive from order/item snapshot columns; nothing here reads
/// current product prices.
#[derive(Clone)]
pub struct ReportsRepository {
    pool: PgPool,
}

impl ReportsRepository {
    /// Create a new ReportsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sales summary over an optional date range
    pub async fn sales_summary(
        &self,
        shop_id: i32,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<SalesSummary, ReportError> {
        let orders = sqlx::query_as::<_, OrderAggregate>(
            r#"
            SELECT COUNT(*) AS order_count,
                   COALESCE(SUM(total_amount), 0) AS revenue
            FROM orders
            WHERE shop_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ItemAggregate>(
            r#"
            SELECT COALESCE(SUM(oi.quantity * oi.cost_at_sale), 0) AS cost,
                   COALESCE(SUM(oi.quantity * oi.discount), 0) AS discount_given
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.shop_id = $1
              AND ($2::timestamptz IS NULL OR o.created_at >= $2)
              AND ($3::timestamptz IS NULL OR o.created_at < $3)
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary {
            order_count: orders.order_count,
            revenue: orders.revenue,
            cost: items.cost,
            discount_given: items.discount_given,
            profit: orders.revenue - items.cost,
        })
    }

    /// Top-selling products over an optional date range
    ///
    /// Grouped by the snapshotted name so lines survive product deletion.
    pub async fn top_products(
        &self,
        shop_id: i32,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ProductSalesRow>, ReportError> {
        let rows = sqlx::query_as::<_, ProductSalesRow>(
            r#"
            SELECT oi.product_name,
                   SUM(oi.quantity)::BIGINT AS units_sold,
                   COALESCE(SUM(oi.quantity * (oi.sold_at - oi.discount)), 0) AS revenue,
                   COALESCE(SUM(oi.quantity * (oi.sold_at - oi.discount - oi.cost_at_sale)), 0) AS profit
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.shop_id = $1
              AND ($2::timestamptz IS NULL OR o.created_at >= $2)
              AND ($3::timestamptz IS NULL OR o.created_at < $3)
            GROUP BY oi.product_name
            ORDER BY units_sold DESC
            LIMIT $4
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Purchase summary over an optional date range
    pub async fn purchase_summary(
        &self,
        shop_id: i32,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<PurchaseSummary, ReportError> {
        let summary = sqlx::query_as::<_, PurchaseSummary>(
            r#"
            SELECT COUNT(*) AS purchase_count,
                   COALESCE(SUM(total_cost), 0) AS total_spend
            FROM purchase_orders
            WHERE shop_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}
