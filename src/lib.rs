pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

use std::sync::Arc;

pub use application::cart_store::{Applied, CartStore};
pub use application::checkout::CheckoutOrchestrator;
pub use application::order_service::{OrderAction, OrderService};
pub use config::ClientConfig;
pub use domain::errors::DomainError;
pub use infrastructure::http_backend::HttpCommerceBackend;

/// The cart, checkout and order services wired to one shared backend.
///
/// Views receive the parts they need from here instead of reaching for a
/// global cart.
pub struct Storefront<B> {
    pub cart: Arc<CartStore<B>>,
    pub checkout: CheckoutOrchestrator<B>,
    pub orders: OrderService<B>,
}

impl<B: domain::ports::CommerceBackend> Storefront<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let cart = Arc::new(CartStore::new(Arc::clone(&backend)));
        Self {
            checkout: CheckoutOrchestrator::new(Arc::clone(&backend), Arc::clone(&cart)),
            orders: OrderService::new(backend),
            cart,
        }
    }
}

/// Build a [`Storefront`] talking HTTP to the backend described by `config`.
pub fn connect(config: ClientConfig) -> Result<Storefront<HttpCommerceBackend>, DomainError> {
    Ok(Storefront::new(Arc::new(HttpCommerceBackend::new(config)?)))
}
