use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};

use crate::domain::cart::{validate_quantity, Cart, CartSnapshot, ProductId};
use crate::domain::errors::DomainError;
use crate::domain::ports::CommerceBackend;

/// Result of offering a backend response to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The response replaced the cache.
    Replaced(CartSnapshot),
    /// A later request's response already landed; the cache kept it.
    Stale(CartSnapshot),
}

impl Applied {
    pub fn snapshot(self) -> CartSnapshot {
        match self {
            Applied::Replaced(cart) | Applied::Stale(cart) => cart,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Applied::Stale(_))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    cart: Option<CartSnapshot>,
    applied_sequence: u64,
}

/// Write-through replica of the server-owned cart.
///
/// Every mutation is a single backend round trip whose response becomes the
/// new cache through [`CartStore::apply_authoritative`]. Requests are tagged
/// with a monotonically increasing sequence number, and a response tagged
/// lower than the last applied one is dropped, so a slow superseded reply
/// can never undo a newer one.
pub struct CartStore<B> {
    backend: Arc<B>,
    next_sequence: AtomicU64,
    in_flight: AtomicUsize,
    state: Mutex<CacheState>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<B: CommerceBackend> CartStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            next_sequence: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The last authoritative cart, or `None` before the first load.
    pub fn snapshot(&self) -> Option<CartSnapshot> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cart
            .clone()
    }

    /// Whether any request is still awaiting its response.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn load(&self) -> Result<CartSnapshot, DomainError> {
        let sequence = self.issue_sequence();
        let _pending = InFlight::enter(&self.in_flight);
        debug!("cart load #{sequence}");
        let response = self.backend.fetch_cart().await;
        self.settle("load", sequence, response)
    }

    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartSnapshot, DomainError> {
        let quantity = validate_quantity(quantity)?;
        let sequence = self.issue_sequence();
        let response = {
            let _pending = InFlight::enter(&self.in_flight);
            debug!("cart add #{sequence}: product {product_id} x{quantity}");
            self.backend.add_item(product_id, quantity).await
        };
        self.settle_refreshing_on_stock("add", sequence, response)
            .await
    }

    pub async fn update(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, DomainError> {
        let quantity = validate_quantity(quantity)?;
        let sequence = self.issue_sequence();
        let response = {
            let _pending = InFlight::enter(&self.in_flight);
            debug!("cart update #{sequence}: product {product_id} -> {quantity}");
            self.backend.update_item(product_id, quantity).await
        };
        self.settle_refreshing_on_stock("update", sequence, response)
            .await
    }

    /// Drops the line. The backend treats removing an absent product as a no-op.
    pub async fn remove(&self, product_id: ProductId) -> Result<CartSnapshot, DomainError> {
        let sequence = self.issue_sequence();
        let _pending = InFlight::enter(&self.in_flight);
        debug!("cart remove #{sequence}: product {product_id}");
        let response = self.backend.remove_item(product_id).await;
        self.settle("remove", sequence, response)
    }

    pub async fn clear(&self) -> Result<CartSnapshot, DomainError> {
        let sequence = self.issue_sequence();
        let _pending = InFlight::enter(&self.in_flight);
        debug!("cart clear #{sequence}");
        let response = self.backend.clear_cart().await;
        self.settle("clear", sequence, response)
    }

    /// The only path that changes the cache.
    ///
    /// A response tagged lower than the cached one is discarded whatever its
    /// content. Otherwise the cart must satisfy its totals invariant to be
    /// applied.
    pub fn apply_authoritative(&self, cart: Cart, sequence: u64) -> Result<Applied, DomainError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = &state.cart {
            if sequence < state.applied_sequence {
                warn!(
                    "discarding stale cart response #{sequence}; #{} already applied",
                    state.applied_sequence
                );
                return Ok(Applied::Stale(Arc::clone(current)));
            }
        }

        if let Err(e) = cart.verify_totals() {
            warn!("rejecting cart response #{sequence}: {e}");
            return Err(e);
        }

        let snapshot = Arc::new(cart);
        state.cart = Some(Arc::clone(&snapshot));
        state.applied_sequence = sequence;
        debug!(
            "cart #{sequence} applied: {} lines, total {}",
            snapshot.items.len(),
            snapshot.total_amount
        );
        Ok(Applied::Replaced(snapshot))
    }

    fn issue_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn settle(
        &self,
        op: &str,
        sequence: u64,
        response: Result<Cart, DomainError>,
    ) -> Result<CartSnapshot, DomainError> {
        match response {
            Ok(cart) => Ok(self.apply_authoritative(cart, sequence)?.snapshot()),
            Err(e) => {
                debug!("cart {op} #{sequence} failed: {e}");
                Err(e)
            }
        }
    }

    /// A stock rejection means our view of the cart is out of date, so the
    /// cache is refreshed before the error is handed back.
    async fn settle_refreshing_on_stock(
        &self,
        op: &str,
        sequence: u64,
        response: Result<Cart, DomainError>,
    ) -> Result<CartSnapshot, DomainError> {
        match self.settle(op, sequence, response) {
            Err(e @ DomainError::StockViolation(_)) => {
                if let Err(reload) = self.load().await {
                    warn!("cart refresh after stock violation failed: {reload}");
                }
                Err(e)
            }
            other => other,
        }
    }
}
