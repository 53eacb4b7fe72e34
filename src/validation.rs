// Validation utilities module
// Provides custom validation functions for domain-specific rules

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::models::CreateProduct;

/// Validates that a price is strictly positive
pub fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        Err(ValidationError::new("price_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a price is not negative (zero is allowed, e.g. floor price)
pub fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Validates optional strictly-positive prices (for Option<Decimal> fields)
pub fn validate_optional_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    validate_positive_price(price)
}

/// Validates optional non-negative prices (for Option<Decimal> fields)
pub fn validate_optional_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative_price(price)
}

/// Struct-level check: the floor price may never exceed the sell price,
/// otherwise no discount headroom exists and the product can never be sold
/// at its own listed price
pub fn validate_price_bounds(product: &CreateProduct) -> Result<(), ValidationError> {
    if product.floor_price > product.sell_price {
        Err(ValidationError::new("floor_price_exceeds_sell_price"))
    } else {
        Ok(())
    }
}
