//! Fixtures shared by the application tests.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{TimeZone, Utc};

use crate::domain::cart::{Cart, CartId, LineItem, ProductId};
use crate::domain::order::{Order, OrderId, OrderItemSnapshot, OrderStatus};

pub(crate) fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

/// Builds a consistent cart from `(product_id, quantity, unit_price, line_total)`.
pub(crate) fn cart(cart_id: CartId, lines: &[(ProductId, u32, &str, &str)]) -> Cart {
    let items: Vec<LineItem> = lines
        .iter()
        .map(|&(product_id, quantity, unit_price, line_total)| LineItem {
            product_id,
            name: format!("Product {product_id}"),
            sku: format!("SKU-{product_id}"),
            unit_price: dec(unit_price),
            quantity,
            line_total: dec(line_total),
        })
        .collect();
    Cart {
        cart_id,
        total_quantity: items.iter().map(|i| u64::from(i.quantity)).sum(),
        total_amount: items.iter().map(|i| &i.line_total).sum(),
        items,
    }
}

pub(crate) fn order(id: OrderId, status: OrderStatus) -> Order {
    Order {
        id,
        reference: format!("ORD-{id:05}"),
        total_amount: dec("100"),
        status,
        created_at: Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        items: vec![OrderItemSnapshot {
            product_name: "Product 7".to_string(),
            unit_price: dec("50"),
            quantity: 2,
        }],
    }
}
