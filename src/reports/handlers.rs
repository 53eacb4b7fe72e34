// HTTP handlers for reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::auth::middleware::AuthenticatedShop;
use crate::reports::{ProductSalesRow, PurchaseSummary, RangeQuery, ReportError, SalesSummary};

/// Handler for GET /api/reports/sales
pub async fn sales_summary_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Query(range): Query<RangeQuery>,
) -> Result<Json<SalesSummary>, ReportError> {
    validate_range(&range)?;

    let summary = state
        .reports_repo
        .sales_summary(shop.shop_id, range.from, range.to)
        .await?;

    Ok(Json(summary))
}

/// Handler for GET /api/reports/top-products
pub async fn top_products_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<ProductSalesRow>>, ReportError> {
    validate_range(&range)?;

    let rows = state
        .reports_repo
        .top_products(shop.shop_id, range.from, range.to, 10)
        .await?;

    Ok(Json(rows))
}

/// Handler for GET /api/reports/purchases
pub async fn purchase_summary_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Query(range): Query<RangeQuery>,
) -> Result<Json<PurchaseSummary>, ReportError> {
    validate_range(&range)?;

    let summary = state
        .reports_repo
        .purchase_summary(shop.shop_id, range.from, range.to)
        .await?;

    Ok(Json(summary))
}

fn validate_range(range: &RangeQuery) -> Result<(), ReportError> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(ReportError::ValidationError(
                "'from' must not be after 'to'".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_range_rejects_inverted_bounds() {
        let from = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let to = chrono::Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let range = RangeQuery {
            from: Some(from),
            to: Some(to),
        };
        assert!(validate_range(&range).is_err());

        let open = RangeQuery {
            from: None,
            to: Some(to),
        };
        assert!(validate_range(&open).is_ok());
    }
}
