use std::collections::HashSet;
use std::sync::Arc;

use bigdecimal::BigDecimal;

use super::errors::DomainError;

pub type ProductId = i64;
pub type CartId = i64;

/// Immutable view of the cache handed to readers. Replaced, never mutated.
pub type CartSnapshot = Arc<Cart>;

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub unit_price: BigDecimal,
    pub quantity: u32,
    /// Computed by the backend after promotions; never recomputed here.
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub cart_id: CartId,
    pub items: Vec<LineItem>,
    pub total_quantity: u64,
    pub total_amount: BigDecimal,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.item(product_id).map_or(0, |i| i.quantity)
    }

    /// Checks the invariants every authoritative cart must hold before it
    /// may replace the cache.
    pub fn verify_totals(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.product_id) {
                return Err(DomainError::InvalidResponse(format!(
                    "cart {} lists product {} more than once",
                    self.cart_id, item.product_id
                )));
            }
            if item.quantity == 0 {
                return Err(DomainError::InvalidResponse(format!(
                    "cart {} has a zero-quantity line for product {}",
                    self.cart_id, item.product_id
                )));
            }
        }

        let quantity: u64 = self.items.iter().map(|i| u64::from(i.quantity)).sum();
        if quantity != self.total_quantity {
            return Err(DomainError::InvalidResponse(format!(
                "cart {} totalQuantity {} does not match line sum {}",
                self.cart_id, self.total_quantity, quantity
            )));
        }

        let amount: BigDecimal = self.items.iter().map(|i| &i.line_total).sum();
        if amount != self.total_amount {
            return Err(DomainError::InvalidResponse(format!(
                "cart {} totalAmount {} does not match line sum {}",
                self.cart_id, self.total_amount, amount
            )));
        }

        Ok(())
    }
}

/// Quantities sent to the backend must be at least one. A line is dropped
/// with an explicit remove, never with a zero update.
pub fn validate_quantity(quantity: u32) -> Result<u32, DomainError> {
    if quantity == 0 {
        return Err(DomainError::ValidationFailure(
            "quantity must be at least 1; use remove to drop a line".to_string(),
        ));
    }
    Ok(quantity)
}
