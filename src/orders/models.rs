use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::orders::cart::DiscountKind;

/// Domain model representing a completed sale
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub shop_id: i32,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model representing one product line within an order
///
/// `sold_at` and `cost_at_sale` are snapshots taken at the moment of sale and
/// are never recomputed from the current product afterwards; profit reporting
/// depends on them staying put. `product_id` goes NULL if the product is
/// later deleted, which is why the name is also snapshotted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: Uuid,
    pub product_id: Option<i32>,
    pub product_name: String,
    pub quantity: i32,
    pub sold_at: Decimal,
    pub cost_at_sale: Decimal,
    /// Per-unit share of the order's total discount
    pub discount: Decimal,
}

/// One line of a submitted cart
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItemRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub sell_price: Decimal,
    pub cost_at_sale: Decimal,
    pub name: String,
}

/// Request DTO for creating an order (checkout)
///
/// `total_amount` is the client's locally-previewed grand total; the server
/// recomputes it with the same rules and rejects on any mismatch.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub cart_items: Vec<CartItemRequest>,
    /// Free-form discount input from the POS screen; absent means none
    pub discount_value: Option<String>,
    pub discount_type: Option<DiscountKind>,
    pub total_amount: Decimal,
}

/// One quantity change in an order edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedItemRequest {
    /// Order item id (not product id)
    pub id: i32,
    pub quantity: i32,
}

/// Request DTO for editing an existing order
#[derive(Debug, Deserialize, Validate)]
pub struct EditOrderRequest {
    #[validate(length(min = 1, message = "Edit must touch at least one item"))]
    pub updated_items: Vec<UpdatedItemRequest>,
    pub total_discount_input: Option<String>,
    pub discount_type: Option<DiscountKind>,
}

/// One line of a live cart preview (prices come from the database, not the
/// client)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PreviewItemRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Request DTO for the live cart preview
#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[validate(length(min = 1, message = "Cart must contain at least one item"))]
    pub items: Vec<PreviewItemRequest>,
    pub discount_value: Option<String>,
    pub discount_type: Option<DiscountKind>,
}

/// Response DTO for an order with its items
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub shop_id: i32,
    pub total_amount: Decimal,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response DTO for an order item
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: Option<i32>,
    pub product_name: String,
    pub quantity: i32,
    pub sold_at: Decimal,
    pub cost_at_sale: Decimal,
    pub discount: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            sold_at: item.sold_at,
            cost_at_sale: item.cost_at_sale,
            discount: item.discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_order_request_deserialization() {
        let json = r#"{
            "cart_items": [
                { "product_id": 3, "quantity": 2, "sell_price": "50", "cost_at_sale": "30", "name": "Arabica beans 1kg" }
            ],
            "discount_value": "10",
            "discount_type": "percent",
            "total_amount": "90"
        }"#;

        let request: CreateOrderRequest =
            serde_json::from_str(json).expect("Failed to deserialize CreateOrderRequest");

        assert_eq!(request.cart_items.len(), 1);
        assert_eq!(request.cart_items[0].product_id, 3);
        assert_eq!(request.cart_items[0].sell_price, dec!(50));
        assert_eq!(request.discount_type, Some(DiscountKind::Percent));
        assert_eq!(request.total_amount, dec!(90));
    }

    #[test]
    fn test_create_order_request_without_discount() {
        let json = r#"{
            "cart_items": [
                { "product_id": 1, "quantity": 1, "sell_price": "30", "cost_at_sale": "12", "name": "House blend" }
            ],
            "total_amount": "30"
        }"#;

        let request: CreateOrderRequest =
            serde_json::from_str(json).expect("Failed to deserialize CreateOrderRequest");

        assert_eq!(request.discount_value, None);
        assert_eq!(request.discount_type, None);
    }

    #[test]
    fn test_edit_order_request_deserialization() {
        let json = r#"{
            "updated_items": [
                { "id": 11, "quantity": 3 },
                { "id": 12, "quantity": 0 }
            ],
            "total_discount_input": "25",
            "discount_type": "fixed"
        }"#;

        let request: EditOrderRequest =
            serde_json::from_str(json).expect("Failed to deserialize EditOrderRequest");

        assert_eq!(request.updated_items.len(), 2);
        assert_eq!(request.updated_items[1].quantity, 0);
        assert_eq!(request.discount_type, Some(DiscountKind::Fixed));
    }

    #[test]
    fn test_discount_kind_round_trip() {
        let json = serde_json::to_string(&DiscountKind::Percent).unwrap();
        assert_eq!(json, "\"percent\"");
        let back: DiscountKind = serde_json::from_str("\"fixed\"").unwrap();
        assert_eq!(back, DiscountKind::Fixed);
    }
}
