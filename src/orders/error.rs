use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Order not found")]
    NotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Insufficient stock for product {product_id}: {available} left, {requested} requested")]
    InsufficientStock {
        product_id: i32,
        available: i32,
        requested: i32,
    },

    #[error("Discount exceeds the maximum allowed of {max}")]
    DiscountExceedsMax { max: Decimal },

    #[error("Order total does not match the server calculation of {expected}")]
    TotalMismatch { expected: Decimal },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        // Discount and total errors carry the computed bound in the payload
        // so the client can offer a corrected value
        let (status, body) = match &self {
            OrderError::DatabaseError(msg) => {
                tracing::error!("Database error in orders: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "A database error occurred" }),
                )
            }
            OrderError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Order not found" }),
            ),
            OrderError::ProductNotFound(id) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Product with id {} not found", id) }),
            ),
            OrderError::InvalidQuantity(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            OrderError::InsufficientStock { .. } => {
                (StatusCode::CONFLICT, json!({ "error": self.to_string() }))
            }
            OrderError::DiscountExceedsMax { max } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "max_discount": max }),
            ),
            OrderError::TotalMismatch { expected } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "expected_total": expected }),
            ),
            OrderError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}
