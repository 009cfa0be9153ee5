use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::cart::{Cart, CartId, LineItem, ProductId};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderId, OrderItemSnapshot, PaymentRedirect, ReturnRequest};

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateItemBody {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct ReturnBody<'a> {
    pub reason: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

impl<'a> From<&'a ReturnRequest> for ReturnBody<'a> {
    fn from(request: &'a ReturnRequest) -> Self {
        Self {
            reason: &request.reason,
            comment: request.comment.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPaymentBody {
    pub order_id: OrderId,
}

// ── Response bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(deserialize_with = "decimal")]
    pub unit_price: BigDecimal,
    pub quantity: u32,
    #[serde(deserialize_with = "decimal")]
    pub line_total: BigDecimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_id: CartId,
    #[serde(default)]
    pub items: Vec<LineItemResponse>,
    pub total_quantity: u64,
    #[serde(deserialize_with = "decimal")]
    pub total_amount: BigDecimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_name: String,
    #[serde(deserialize_with = "decimal")]
    pub unit_price: BigDecimal,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub reference: String,
    #[serde(deserialize_with = "decimal")]
    pub total_amount: BigDecimal,
    pub status: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRedirectResponse {
    pub checkout_url: String,
    pub order_reference: String,
}

/// Error envelope; some endpoints say `error`, others `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(alias = "message")]
    pub error: Option<String>,
}

// ── Conversions ──────────────────────────────────────────────────────────────

impl From<CartResponse> for Cart {
    fn from(r: CartResponse) -> Self {
        Cart {
            cart_id: r.cart_id,
            items: r
                .items
                .into_iter()
                .map(|l| LineItem {
                    product_id: l.product_id,
                    name: l.name,
                    sku: l.sku,
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                    line_total: l.line_total,
                })
                .collect(),
            total_quantity: r.total_quantity,
            total_amount: r.total_amount,
        }
    }
}

impl TryFrom<OrderResponse> for Order {
    type Error = DomainError;

    fn try_from(r: OrderResponse) -> Result<Self, Self::Error> {
        Ok(Order {
            id: r.id,
            reference: r.reference,
            total_amount: r.total_amount,
            status: r.status.parse()?,
            created_at: r.created_at,
            items: r
                .items
                .into_iter()
                .map(|i| OrderItemSnapshot {
                    product_name: i.product_name,
                    unit_price: i.unit_price,
                    quantity: i.quantity,
                })
                .collect(),
        })
    }
}

impl From<PaymentRedirectResponse> for PaymentRedirect {
    fn from(r: PaymentRedirectResponse) -> Self {
        PaymentRedirect {
            checkout_url: r.checkout_url,
            order_reference: r.order_reference,
        }
    }
}

// ── Field decoders ───────────────────────────────────────────────────────────

/// Accepts amounts as JSON strings or numbers. Numbers go through their
/// shortest decimal rendering so `9.99` stays `9.99`.
fn decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let text = match Raw::deserialize(deserializer)? {
        Raw::Int(v) => v.to_string(),
        Raw::Float(v) => v.to_string(),
        Raw::Text(v) => v,
    };
    BigDecimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}

/// RFC 3339, or a zone-less local timestamp taken as UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
