use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for purchase-order operations
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Purchase order not found")]
    NotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Purchase orders can only be deleted within {window_hours} hours of creation")]
    DeleteWindowExpired { window_hours: i64 },

    #[error("Cannot reverse receipt of product {product_id}: {available} units left, {required} would be removed")]
    StockAlreadyConsumed {
        product_id: i32,
        available: i32,
        required: i32,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for PurchaseError {
    fn from(err: sqlx::Error) -> Self {
        PurchaseError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for PurchaseError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PurchaseError::DatabaseError(msg) => {
                tracing::error!("Database error in purchases: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            PurchaseError::NotFound => {
                (StatusCode::NOT_FOUND, "Purchase order not found".to_string())
            }
            PurchaseError::ProductNotFound(id) => (
                StatusCode::BAD_REQUEST,
                format!("Product with id {} not found", id),
            ),
            PurchaseError::InvalidQuantity(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // A business-rule rejection, deliberately distinct from not-found
            PurchaseError::DeleteWindowExpired { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            PurchaseError::StockAlreadyConsumed { .. } => {
                (StatusCode::CONFLICT, self.to_string())
            }
            PurchaseError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
