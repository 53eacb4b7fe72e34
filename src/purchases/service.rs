use rust_decimal::Decimal;
use uuid::Uuid;

use crate::purchases::error::PurchaseError;
use crate::purchases::models::{
    CreatePurchaseOrderRequest, PurchaseOrder, PurchaseOrderItemResponse, PurchaseOrderResponse,
};
use crate::purchases::repository::{NewPurchaseItem, PurchasesRepository};

/// Service for purchase-order business logic
#[derive(Clone)]
pub struct PurchaseService {
    purchases_repo: PurchasesRepository,
}

impl PurchaseService {
    /// Create a new PurchaseService
    pub fn new(purchases_repo: PurchasesRepository) -> Self {
        Self { purchases_repo }
    }

    /// Record a received shipment
    ///
    /// # Validation
    /// - At least one item, all quantities positive, unit costs non-negative
    /// - Total cost is derived server-side from the lines
    pub async fn create_purchase_order(
        &self,
        shop_id: i32,
        request: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrder, PurchaseError> {
        if request.items.is_empty() {
            return Err(PurchaseError::ValidationError(
                "Purchase order must contain at least one item".to_string(),
            ));
        }

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(PurchaseError::InvalidQuantity(format!(
                    "Quantity must be positive, got {}",
                    item.quantity
                )));
            }
            if item.unit_cost < Decimal::ZERO {
                return Err(PurchaseError::ValidationError(format!(
                    "Unit cost must not be negative, got {}",
                    item.unit_cost
                )));
            }

            items.push(NewPurchaseItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_cost: item.unit_cost,
            });
        }

        let total_cost: Decimal = items
            .iter()
            .map(|item| Decimal::from(item.quantity) * item.unit_cost)
            .sum();

        self.purchases_repo
            .create(shop_id, &request.supplier_name, total_cost, items)
            .await
    }

    /// Delete a purchase order (24-hour window enforced by the repository,
    /// inside the transaction)
    pub async fn delete_purchase_order(
        &self,
        shop_id: i32,
        purchase_order_id: Uuid,
    ) -> Result<(), PurchaseError> {
        self.purchases_repo.delete(shop_id, purchase_order_id).await
    }

    /// Get a specific purchase order with its items
    pub async fn get_purchase_order(
        &self,
        shop_id: i32,
        purchase_order_id: Uuid,
    ) -> Result<PurchaseOrderResponse, PurchaseError> {
        let purchase_order = self
            .purchases_repo
            .find_by_id(shop_id, purchase_order_id)
            .await?
            .ok_or(PurchaseError::NotFound)?;

        self.assemble_response(purchase_order).await
    }

    /// List all purchase orders of a shop with their items, newest first
    pub async fn list_purchase_orders(
        &self,
        shop_id: i32,
    ) -> Result<Vec<PurchaseOrderResponse>, PurchaseError> {
        let purchase_orders = self.purchases_repo.list_by_shop(shop_id).await?;

        let mut responses = Vec::with_capacity(purchase_orders.len());
        for purchase_order in purchase_orders {
            responses.push(self.assemble_response(purchase_order).await?);
        }

        Ok(responses)
    }

    async fn assemble_response(
        &self,
        purchase_order: PurchaseOrder,
    ) -> Result<PurchaseOrderResponse, PurchaseError> {
        let items = self.purchases_repo.find_items(purchase_order.id).await?;

        let item_responses: Vec<PurchaseOrderItemResponse> =
            items.into_iter().map(|item| item.into()).collect();

        Ok(PurchaseOrderResponse {
            id: purchase_order.id,
            shop_id: purchase_order.shop_id,
            supplier_name: purchase_order.supplier_name,
            total_cost: purchase_order.total_cost,
            items: item_responses,
            created_at: purchase_order.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_cost_derivation() {
        // The service derives total cost from lines, never trusting a client
        // figure; mirrored here as the plain arithmetic it is
        let items = [
            NewPurchaseItem {
                product_id: 1,
                quantity: 10,
                unit_cost: dec!(3.50),
            },
            NewPurchaseItem {
                product_id: 2,
                quantity: 4,
                unit_cost: dec!(12.25),
            },
        ];

        let total: Decimal = items
            .iter()
            .map(|item| Decimal::from(item.quantity) * item.unit_cost)
            .sum();

        assert_eq!(total, dec!(84.00));
    }
}
