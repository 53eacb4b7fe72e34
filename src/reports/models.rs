use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Optional date range for report queries; open ends mean "since the
/// beginning" / "until now"
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Aggregated sales figures over a range
///
/// Cost and profit come from the per-item `cost_at_sale`/`sold_at`/`discount`
/// snapshots, so historic reports stay stable when product prices change.
#[derive(Debug, Serialize)]
pub struct SalesSummary {
    pub order_count: i64,
    /// Sum of collected order totals
    pub revenue: Decimal,
    /// Sum of quantity x cost-at-sale over all items sold
    pub cost: Decimal,
    /// Sum of quantity x per-unit discount over all items sold
    pub discount_given: Decimal,
    pub profit: Decimal,
}

/// One product's sales over a range
#[derive(Debug, Serialize, FromRow)]
pub struct ProductSalesRow {
    pub product_name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

/// Aggregated purchase figures over a range
#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseSummary {
    pub purchase_count: i64,
    pub total_spend: Decimal,
}
