use std::collections::HashMap;
use uuid::Uuid;

use crate::orders::cart::{
    CartCalculator, CartLine, CartQuote, DiscountKind, DiscountSpec, OverflowPolicy,
};
use crate::orders::error::OrderError;
use crate::orders::models::{
    CreateOrderRequest, EditOrderRequest, Order, OrderItemResponse, OrderResponse, PreviewRequest,
};
use crate::orders::repository::{
    NewOrderItem, OrderItemsRepository, OrdersRepository, ProductPricing, ProductRepository,
};

/// Service for order business logic
///
/// The service owns validation and the authoritative recomputation of the
/// client's preview; the repository owns the transactions.
#[derive(Clone)]
pub struct OrderService {
    orders_repo: OrdersRepository,
    order_items_repo: OrderItemsRepository,
    product_repo: ProductRepository,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        orders_repo: OrdersRepository,
        order_items_repo: OrderItemsRepository,
        product_repo: ProductRepository,
    ) -> Self {
        Self {
            orders_repo,
            order_items_repo,
            product_repo,
        }
    }

    /// Turn optional free-form discount input into a spec; absent input or an
    /// absent kind means no discount
    fn parse_discount(value: &Option<String>, kind: Option<DiscountKind>) -> DiscountSpec {
        match (value, kind) {
            (Some(raw), Some(kind)) => DiscountSpec::from_input(raw, kind),
            _ => DiscountSpec::none(),
        }
    }

    /// Create a new order (checkout)
    ///
    /// # Validation
    /// - Cart must be non-empty with positive quantities (rejected before any
    ///   transaction is opened)
    /// - All products must exist in the shop
    /// - The discount is re-validated against current floor prices
    /// - The client's previewed total must equal the server's recomputation;
    ///   both run identical rounding rules so a mismatch is a stale or
    ///   tampered cart
    pub async fn create_order(
        &self,
        shop_id: i32,
        request: CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        if request.cart_items.is_empty() {
            return Err(OrderError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }

        let product_ids: Vec<i32> = request
            .cart_items
            .iter()
            .map(|item| {
                if item.quantity <= 0 {
                    return Err(OrderError::InvalidQuantity(format!(
                        "Quantity must be positive, got {}",
                        item.quantity
                    )));
                }
                Ok(item.product_id)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let products = self
            .product_repo
            .find_pricing_by_ids(shop_id, &product_ids)
            .await?;
        let product_map: HashMap<i32, &ProductPricing> =
            products.iter().map(|p| (p.id, p)).collect();

        // Floor prices come from the database; sell price and cost snapshot
        // come from the submitted cart (the state the customer agreed to)
        let mut lines = Vec::with_capacity(request.cart_items.len());
        for item in &request.cart_items {
            let product = product_map
                .get(&item.product_id)
                .ok_or(OrderError::ProductNotFound(item.product_id))?;

            lines.push(CartLine {
                quantity: item.quantity,
                sell_price: item.sell_price,
                floor_price: product.floor_price,
            });
        }

        let spec = Self::parse_discount(&request.discount_value, request.discount_type);
        let quote = CartCalculator::quote(&lines, &spec, OverflowPolicy::Reject)?;

        if quote.grand_total != request.total_amount {
            return Err(OrderError::TotalMismatch {
                expected: quote.grand_total,
            });
        }

        let items: Vec<NewOrderItem> = request
            .cart_items
            .iter()
            .zip(quote.unit_discounts.iter())
            .map(|(item, per_unit)| NewOrderItem {
                product_id: item.product_id,
                product_name: item.name.clone(),
                quantity: item.quantity,
                sold_at: item.sell_price,
                cost_at_sale: item.cost_at_sale,
                discount: *per_unit,
            })
            .collect();

        self.orders_repo
            .create(shop_id, quote.grand_total, items)
            .await
    }

    /// Quote a live cart for the POS screen
    ///
    /// Prices are read from the database and an oversized discount is
    /// auto-corrected to the maximum (ClampToMax), unlike the order editor
    /// which rejects outright. The returned quote carries the corrected spec
    /// so the UI can update its input field.
    pub async fn preview_cart(
        &self,
        shop_id: i32,
        request: PreviewRequest,
    ) -> Result<CartQuote, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::ValidationError(
                "Cart must contain at least one item".to_string(),
            ));
        }

        let product_ids: Vec<i32> = request.items.iter().map(|i| i.product_id).collect();
        let products = self
            .product_repo
            .find_pricing_by_ids(shop_id, &product_ids)
            .await?;
        let product_map: HashMap<i32, &ProductPricing> =
            products.iter().map(|p| (p.id, p)).collect();

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = product_map
                .get(&item.product_id)
                .ok_or(OrderError::ProductNotFound(item.product_id))?;

            lines.push(CartLine {
                quantity: item.quantity,
                sell_price: product.sell_price,
                floor_price: product.floor_price,
            });
        }

        let spec = Self::parse_discount(&request.discount_value, request.discount_type);
        CartCalculator::quote(&lines, &spec, OverflowPolicy::ClampToMax)
    }

    /// Edit an existing order's quantities and discount
    pub async fn edit_order(
        &self,
        shop_id: i32,
        order_id: Uuid,
        request: EditOrderRequest,
    ) -> Result<OrderResponse, OrderError> {
        if request.updated_items.is_empty() {
            return Err(OrderError::ValidationError(
                "Edit must touch at least one item".to_string(),
            ));
        }

        for update in &request.updated_items {
            if update.quantity < 0 {
                return Err(OrderError::InvalidQuantity(format!(
                    "Quantity must not be negative, got {}",
                    update.quantity
                )));
            }
        }

        let spec = Self::parse_discount(&request.total_discount_input, request.discount_type);

        let order = self
            .orders_repo
            .edit(shop_id, order_id, &request.updated_items, &spec)
            .await?;

        self.assemble_response(order).await
    }

    /// Delete an order, restoring its stock
    pub async fn delete_order(&self, shop_id: i32, order_id: Uuid) -> Result<(), OrderError> {
        self.orders_repo.delete(shop_id, order_id).await
    }

    /// Get a specific order with its items
    pub async fn get_order(
        &self,
        shop_id: i32,
        order_id: Uuid,
    ) -> Result<OrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(shop_id, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        self.assemble_response(order).await
    }

    /// List all orders of a shop with their items, newest first
    pub async fn list_orders(&self, shop_id: i32) -> Result<Vec<OrderResponse>, OrderError> {
        let orders = self.orders_repo.list_by_shop(shop_id).await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            responses.push(self.assemble_response(order).await?);
        }

        Ok(responses)
    }

    async fn assemble_response(&self, order: Order) -> Result<OrderResponse, OrderError> {
        let items = self.order_items_repo.find_by_order_id(order.id).await?;

        let item_responses: Vec<OrderItemResponse> =
            items.into_iter().map(|item| item.into()).collect();

        Ok(OrderResponse {
            id: order.id,
            shop_id: order.shop_id,
            total_amount: order.total_amount,
            items: item_responses,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_discount_with_value_and_kind() {
        let spec = OrderService::parse_discount(
            &Some("12.5".to_string()),
            Some(DiscountKind::Percent),
        );
        assert_eq!(spec.value, dec!(12.5));
        assert_eq!(spec.kind, DiscountKind::Percent);
    }

    #[test]
    fn test_parse_discount_missing_kind_means_none() {
        let spec = OrderService::parse_discount(&Some("50".to_string()), None);
        assert_eq!(spec.value, rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn test_parse_discount_garbage_collapses_to_zero() {
        let spec = OrderService::parse_discount(
            &Some("free!!".to_string()),
            Some(DiscountKind::Fixed),
        );
        assert_eq!(spec.value, rust_decimal::Decimal::ZERO);
    }

    // The create/edit/delete flows depend on repository transactions and are
    // covered by the DB-backed tests in src/tests.rs.
}
