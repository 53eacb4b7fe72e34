// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthenticatedShop;
use crate::orders::{
    CartQuote, CreateOrderRequest, EditOrderRequest, OrderError, OrderResponse, PreviewRequest,
};

/// Handler for POST /api/orders
/// Creates a new order (checkout) for the authenticated shop
pub async fn create_order_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state
        .order_service
        .create_order(shop.shop_id, request)
        .await?;

    let response = state.order_service.get_order(shop.shop_id, order.id).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/orders/preview
/// Quotes a live cart; an oversized discount is corrected to the maximum
pub async fn preview_cart_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<CartQuote>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let quote = state
        .order_service
        .preview_cart(shop.shop_id, request)
        .await?;

    Ok(Json(quote))
}

/// Handler for GET /api/orders
/// Retrieves order history for the authenticated shop
pub async fn get_order_history_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
) -> Result<Json<Vec<OrderResponse>>, OrderError> {
    let orders = state.order_service.list_orders(shop.shop_id).await?;

    Ok(Json(orders))
}

/// Handler for GET /api/orders/{order_id}
/// Retrieves a specific order by ID
pub async fn get_order_by_id_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state.order_service.get_order(shop.shop_id, order_id).await?;

    Ok(Json(order))
}

/// Handler for PUT /api/orders/{order_id}
/// Edits an order's quantities and discount
pub async fn edit_order_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Path(order_id): Path<Uuid>,
    Json(request): Json<EditOrderRequest>,
) -> Result<Json<OrderResponse>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state
        .order_service
        .edit_order(shop.shop_id, order_id, request)
        .await?;

    Ok(Json(order))
}

/// Handler for DELETE /api/orders/{order_id}
/// Deletes an order, restoring the stock its items consumed
pub async fn delete_order_handler(
    State(state): State<crate::AppState>,
    shop: AuthenticatedShop,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, OrderError> {
    state
        .order_service
        .delete_order(shop.shop_id, order_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
