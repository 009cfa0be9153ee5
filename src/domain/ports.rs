use async_trait::async_trait;

use super::cart::{Cart, ProductId};
use super::errors::DomainError;
use super::order::{Document, Order, OrderId, PaymentRedirect, ReturnRequest};

/// The remote commerce backend. Every cart method answers with the
/// authoritative cart after the write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommerceBackend: Send + Sync + 'static {
    async fn fetch_cart(&self) -> Result<Cart, DomainError>;
    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart, DomainError>;
    async fn update_item(&self, product_id: ProductId, quantity: u32)
        -> Result<Cart, DomainError>;
    async fn remove_item(&self, product_id: ProductId) -> Result<Cart, DomainError>;
    async fn clear_cart(&self) -> Result<Cart, DomainError>;

    async fn checkout(&self) -> Result<Order, DomainError>;
    async fn my_orders(&self) -> Result<Vec<Order>, DomainError>;
    async fn order(&self, id: OrderId) -> Result<Order, DomainError>;
    async fn cancel_order(&self, id: OrderId) -> Result<Order, DomainError>;
    async fn request_return(
        &self,
        id: OrderId,
        request: &ReturnRequest,
    ) -> Result<Order, DomainError>;

    async fn start_payment(&self, id: OrderId) -> Result<PaymentRedirect, DomainError>;
    /// Idempotent: confirming a settled session again returns the order.
    async fn confirm_payment(&self, session_id: &str) -> Result<Order, DomainError>;

    async fn invoice(&self, id: OrderId) -> Result<Document, DomainError>;
    async fn return_label(&self, id: OrderId) -> Result<Document, DomainError>;
}
