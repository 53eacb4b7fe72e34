use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Domain model representing a received shipment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub shop_id: i32,
    pub supplier_name: String,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Domain model representing one product line within a purchase order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseOrderItem {
    pub id: i32,
    pub purchase_order_id: Uuid,
    pub product_id: Option<i32>,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// One line of an incoming shipment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseItemRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// Request DTO for recording a received shipment
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1, message = "Supplier name must not be empty"))]
    pub supplier_name: String,
    #[validate(length(min = 1, message = "Purchase order must contain at least one item"))]
    pub items: Vec<PurchaseItemRequest>,
}

/// Response DTO for a purchase order with its items
#[derive(Debug, Serialize)]
pub struct PurchaseOrderResponse {
    pub id: Uuid,
    pub shop_id: i32,
    pub supplier_name: String,
    pub total_cost: Decimal,
    pub items: Vec<PurchaseOrderItemResponse>,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for a purchase order item
#[derive(Debug, Serialize)]
pub struct PurchaseOrderItemResponse {
    pub id: i32,
    pub product_id: Option<i32>,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl From<PurchaseOrderItem> for PurchaseOrderItemResponse {
    fn from(item: PurchaseOrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_cost: item.unit_cost,
        }
    }
}
