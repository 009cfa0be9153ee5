use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::application::cart_store::CartStore;
use crate::domain::errors::DomainError;
use crate::domain::order::CheckoutReceipt;
use crate::domain::ports::CommerceBackend;

struct Submitting<'a>(&'a AtomicBool);

impl<'a> Submitting<'a> {
    fn enter(flag: &'a AtomicBool) -> Result<Self, DomainError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(DomainError::ValidationFailure(
                "checkout already in progress".to_string(),
            ));
        }
        Ok(Self(flag))
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Turns the current cart into an order.
pub struct CheckoutOrchestrator<B> {
    backend: Arc<B>,
    cart: Arc<CartStore<B>>,
    submitting: AtomicBool,
}

impl<B: CommerceBackend> CheckoutOrchestrator<B> {
    pub fn new(backend: Arc<B>, cart: Arc<CartStore<B>>) -> Self {
        Self {
            backend,
            cart,
            submitting: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Submits the cached cart as an order.
    ///
    /// An empty or not yet loaded cart fails before any request is sent. On
    /// success the cart is re-fetched so the cache reflects the backend
    /// having emptied it. On failure the cart is left as it was so the user
    /// can retry.
    pub async fn checkout(&self) -> Result<CheckoutReceipt, DomainError> {
        let has_items = self.cart.snapshot().is_some_and(|cart| !cart.is_empty());
        if !has_items {
            return Err(DomainError::ValidationFailure(
                "cannot check out an empty cart".to_string(),
            ));
        }

        let order = {
            let _submitting = Submitting::enter(&self.submitting)?;
            self.backend.checkout().await?
        };
        info!(
            "order {} ({}) created, total {}",
            order.id, order.reference, order.total_amount
        );

        if let Err(e) = self.cart.load().await {
            warn!("cart refresh after checkout of order {} failed: {e}", order.id);
        }

        Ok(CheckoutReceipt {
            order_id: order.id,
            reference: order.reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;

    use super::*;
    use crate::application::test_helpers::{cart, order};
    use crate::domain::order::OrderStatus;
    use crate::domain::ports::MockCommerceBackend;

    fn orchestrator(
        backend: MockCommerceBackend,
    ) -> (
        Arc<CartStore<MockCommerceBackend>>,
        CheckoutOrchestrator<MockCommerceBackend>,
    ) {
        let backend = Arc::new(backend);
        let store = Arc::new(CartStore::new(Arc::clone(&backend)));
        let checkout = CheckoutOrchestrator::new(backend, Arc::clone(&store));
        (store, checkout)
    }

    #[tokio::test]
    async fn empty_cart_fails_without_network_calls() {
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_fetch_cart()
            .once()
            .returning(|| Ok(cart(1, &[])));
        backend.expect_checkout().never();
        let (store, checkout) = orchestrator(backend);
        store.load().await.expect("load succeeds");

        let result = checkout.checkout().await;

        assert!(matches!(result, Err(DomainError::ValidationFailure(_))));
    }

    #[tokio::test]
    async fn unloaded_cart_counts_as_empty() {
        let mut backend = MockCommerceBackend::new();
        backend.expect_fetch_cart().never();
        backend.expect_checkout().never();
        let (_store, checkout) = orchestrator(backend);

        let result = checkout.checkout().await;

        assert!(matches!(result, Err(DomainError::ValidationFailure(_))));
    }

    #[tokio::test]
    async fn success_returns_receipt_and_reloads_cart() {
        let mut seq = Sequence::new();
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(cart(1, &[(7, 2, "50", "100")])));
        backend
            .expect_checkout()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(order(31, OrderStatus::Pending)));
        backend
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(cart(1, &[])));
        let (store, checkout) = orchestrator(backend);
        store.load().await.expect("load succeeds");

        let receipt = checkout.checkout().await.expect("checkout succeeds");

        assert_eq!(receipt.order_id, 31);
        assert_eq!(receipt.reference, "ORD-00031");
        assert!(store.snapshot().is_some_and(|c| c.is_empty()));
        assert!(!checkout.is_submitting());
    }

    #[tokio::test]
    async fn failure_leaves_cart_for_retry() {
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_fetch_cart()
            .once()
            .returning(|| Ok(cart(1, &[(7, 2, "50", "100")])));
        backend
            .expect_checkout()
            .once()
            .returning(|| Err(DomainError::StockViolation("product 7 sold out".to_string())));
        let (store, checkout) = orchestrator(backend);
        let before = store.load().await.expect("load succeeds");

        let result = checkout.checkout().await;

        assert!(matches!(result, Err(DomainError::StockViolation(_))));
        assert_eq!(store.snapshot(), Some(before));
        assert!(!checkout.is_submitting());
    }

    #[tokio::test]
    async fn cart_emptied_elsewhere_is_a_validation_failure() {
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_fetch_cart()
            .once()
            .returning(|| Ok(cart(1, &[(7, 2, "50", "100")])));
        backend
            .expect_checkout()
            .once()
            .returning(|| Err(DomainError::ValidationFailure("Cart is empty".to_string())));
        let (store, checkout) = orchestrator(backend);
        store.load().await.expect("load succeeds");

        let result = checkout.checkout().await;

        assert_eq!(
            result,
            Err(DomainError::ValidationFailure("Cart is empty".to_string()))
        );
    }

    #[tokio::test]
    async fn receipt_survives_failed_cart_refresh() {
        let mut seq = Sequence::new();
        let mut backend = MockCommerceBackend::new();
        backend
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(cart(1, &[(7, 2, "50", "100")])));
        backend
            .expect_checkout()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(order(8, OrderStatus::Pending)));
        backend
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Err(DomainError::NetworkFailure("timeout".to_string())));
        let (store, checkout) = orchestrator(backend);
        store.load().await.expect("load succeeds");

        let receipt = checkout.checkout().await.expect("order was created");

        assert_eq!(receipt.order_id, 8);
    }
}
