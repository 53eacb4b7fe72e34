// HTTP handlers for purchase-order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthenticatedShop;
use crate::purchases::{CreatePurchaseOrderRequest, PurchaseError, PurchaseOrderResponse};

/// Handler for POST /api/purchase-orders
/// Records a received shipment for the authenticated shop
pub async fn create_purchase_order_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Json(request): Json<CreatePurchaseOrderRequest>,
) -> Result<(StatusCode, Json<PurchaseOrderResponse>), PurchaseError> {
    request
        .validate()
        .map_err(|e| PurchaseError::ValidationError(e.to_string()))?;

    let purchase_order = state
        .purchase_service
        .create_purchase_order(shop.shop_id, request)
        .await?;

    let response = state
        .purchase_service
        .get_purchase_order(shop.shop_id, purchase_order.id)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /api/purchase-orders
/// Lists the shop's purchase orders
pub async fn get_purchase_orders_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
) -> Result<Json<Vec<PurchaseOrderResponse>>, PurchaseError> {
    let purchase_orders = state
        .purchase_service
        .list_purchase_orders(shop.shop_id)
        .await?;

    Ok(Json(purchase_orders))
}

/// Handler for GET /api/purchase-orders/{purchase_order_id}
pub async fn get_purchase_order_by_id_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Path(purchase_order_id): Path<Uuid>,
) -> Result<Json<PurchaseOrderResponse>, PurchaseError> {
    let purchase_order = state
        .purchase_service
        .get_purchase_order(shop.shop_id, purchase_order_id)
        .await?;

    Ok(Json(purchase_order))
}

/// Handler for DELETE /api/purchase-orders/{purchase_order_id}
/// Reverses a receipt; rejected outside the 24-hour window
pub async fn delete_purchase_order_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Path(purchase_order_id): Path<Uuid>,
) -> Result<StatusCode, PurchaseError> {
    state
        .purchase_service
        .delete_purchase_order(shop.shop_id, purchase_order_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
