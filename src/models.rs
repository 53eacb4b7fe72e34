use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents a sellable product owned by one shop
///
/// The stock ledger lives here: `current_stock` is decremented by sales and
/// incremented by purchase-order receipts, `total_stock` accumulates every
/// unit ever received. `current_stock` must never go negative; the order and
/// purchase repositories enforce that inside their transactions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    #[schema(example = 1)]
    pub id: i32,
    pub shop_id: i32,
    pub category_id: Option<i32>,
    #[schema(example = "Arabica beans 1kg")]
    pub name: String,
    /// Latest acquisition cost per unit
    #[schema(value_type = f64, example = 7.50)]
    pub cost_price: Decimal,
    #[schema(value_type = f64, example = 12.00)]
    pub sell_price: Decimal,
    /// Minimum permissible net price per unit after discount
    #[schema(value_type = f64, example = 9.00)]
    pub floor_price: Decimal,
    #[schema(example = 42)]
    pub current_stock: i32,
    /// Cumulative lifetime units received
    #[schema(example = 120)]
    pub total_stock: i32,
    /// Low-stock alert level
    #[schema(example = 5)]
    pub stock_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "crate::validation::validate_price_bounds"))]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "Product name must not be empty"))]
    #[schema(example = "Arabica beans 1kg")]
    pub name: String,
    pub category_id: Option<i32>,
    #[validate(custom = "crate::validation::validate_non_negative_price")]
    #[schema(value_type = f64, example = 7.50)]
    pub cost_price: Decimal,
    #[validate(custom = "crate::validation::validate_positive_price")]
    #[schema(value_type = f64, example = 12.00)]
    pub sell_price: Decimal,
    #[validate(custom = "crate::validation::validate_non_negative_price")]
    #[schema(value_type = f64, example = 9.00)]
    pub floor_price: Decimal,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    #[schema(example = 0)]
    pub current_stock: i32,
    #[validate(range(min = 0, message = "Stock threshold must not be negative"))]
    #[schema(example = 5)]
    pub stock_threshold: i32,
}

/// Request body for updating a product
///
/// All fields optional to support partial updates. `current_stock` here is
/// the stocktake escape hatch: a direct overwrite of the ledger, outside the
/// usual delta discipline.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, message = "Product name must not be empty"))]
    pub name: Option<String>,
    pub category_id: Option<i32>,
    #[validate(custom = "crate::validation::validate_optional_non_negative_price")]
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_optional_positive_price")]
    #[schema(value_type = Option<f64>)]
    pub sell_price: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_optional_non_negative_price")]
    #[schema(value_type = Option<f64>)]
    pub floor_price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub current_stock: Option<i32>,
    #[validate(range(min = 0, message = "Stock threshold must not be negative"))]
    pub stock_threshold: Option<i32>,
}

/// Represents a product category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub shop_id: i32,
    #[schema(example = "Beverages")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, message = "Category name must not be empty"))]
    #[schema(example = "Beverages")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_serialization() {
        let product = Product {
            id: 1,
            shop_id: 7,
            category_id: Some(2),
            name: "Arabica beans 1kg".to_string(),
            cost_price: dec!(7.50),
            sell_price: dec!(12.00),
            floor_price: dec!(9.00),
            current_stock: 42,
            total_stock: 120,
            stock_threshold: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&product).expect("Failed to serialize Product");

        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"name\":\"Arabica beans 1kg\""));
        assert!(json.contains("\"sell_price\":\"12.00\""));
        assert!(json.contains("\"current_stock\":42"));
        assert!(json.contains("\"total_stock\":120"));
    }

    #[test]
    fn test_create_product_deserialization() {
        let json = r#"{
            "name": "House blend 500g",
            "category_id": null,
            "cost_price": "4.25",
            "sell_price": "8.00",
            "floor_price": "5.00",
            "current_stock": 10,
            "stock_threshold": 3
        }"#;

        let create: CreateProduct =
            serde_json::from_str(json).expect("Failed to deserialize CreateProduct");

        assert_eq!(create.name, "House blend 500g");
        assert_eq!(create.category_id, None);
        assert_eq!(create.cost_price, dec!(4.25));
        assert_eq!(create.sell_price, dec!(8.00));
        assert_eq!(create.floor_price, dec!(5.00));
        assert_eq!(create.current_stock, 10);
    }

    #[test]
    fn test_create_product_validation_rejects_floor_above_sell() {
        use validator::Validate;

        let create = CreateProduct {
            name: "Bad floor".to_string(),
            category_id: None,
            cost_price: dec!(1.00),
            sell_price: dec!(5.00),
            floor_price: dec!(6.00),
            current_stock: 0,
            stock_threshold: 0,
        };

        assert!(create.validate().is_err());
    }

    #[test]
    fn test_update_product_partial_fields() {
        let json = r#"{
            "sell_price": "13.50",
            "current_stock": 99
        }"#;

        let update: UpdateProduct =
            serde_json::from_str(json).expect("Failed to deserialize UpdateProduct");

        assert_eq!(update.sell_price, Some(dec!(13.50)));
        assert_eq!(update.current_stock, Some(99));
        assert_eq!(update.name, None);
        assert_eq!(update.floor_price, None);
    }

    #[test]
    fn test_update_product_empty() {
        let update: UpdateProduct =
            serde_json::from_str("{}").expect("Failed to deserialize UpdateProduct");

        assert_eq!(update.name, None);
        assert_eq!(update.sell_price, None);
        assert_eq!(update.current_stock, None);
    }
}
