use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::order::{
    Document, Order, OrderId, OrderStatus, PaymentRedirect, ReturnRequest,
};
use crate::domain::ports::CommerceBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    Cancel,
    RequestReturn,
    Pay,
}

struct Pending<'a> {
    in_flight: &'a Mutex<HashSet<(OrderId, OrderAction)>>,
    key: (OrderId, OrderAction),
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Order queries and customer-driven transition requests.
///
/// Every request is gated on the lifecycle predicates of the caller's last
/// known status. The status shown afterwards is always the one the backend
/// returned; a rejected request changes nothing locally.
pub struct OrderService<B> {
    backend: Arc<B>,
    in_flight: Mutex<HashSet<(OrderId, OrderAction)>>,
}

impl<B: CommerceBackend> OrderService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub async fn my_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.backend.my_orders().await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.backend.order(id).await
    }

    pub fn is_pending(&self, id: OrderId, action: OrderAction) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(id, action))
    }

    pub async fn cancel(&self, order: &Order) -> Result<Order, DomainError> {
        ensure(order, OrderStatus::can_cancel, "cancelled")?;
        let _pending = self.begin(order.id, OrderAction::Cancel)?;
        let updated = self.backend.cancel_order(order.id).await?;
        Ok(adopt(order, updated))
    }

    pub async fn request_return(
        &self,
        order: &Order,
        request: ReturnRequest,
    ) -> Result<Order, DomainError> {
        ensure(order, OrderStatus::can_request_return, "returned")?;
        let _pending = self.begin(order.id, OrderAction::RequestReturn)?;
        let updated = self.backend.request_return(order.id, &request).await?;
        Ok(adopt(order, updated))
    }

    /// Opens a payment-provider session; the caller redirects to its URL.
    pub async fn start_payment(&self, order: &Order) -> Result<PaymentRedirect, DomainError> {
        ensure(order, OrderStatus::can_pay, "paid")?;
        let _pending = self.begin(order.id, OrderAction::Pay)?;
        let redirect = self.backend.start_payment(order.id).await?;
        info!(
            "payment session opened for order {} ({})",
            order.id, redirect.order_reference
        );
        Ok(redirect)
    }

    /// Safe to call repeatedly for the same session; the backend answers a
    /// repeat with the already paid order. Any refusal is an error.
    pub async fn confirm_payment(&self, session_id: &str) -> Result<Order, DomainError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(DomainError::ValidationFailure(
                "a payment session id is required".to_string(),
            ));
        }
        let order = self.backend.confirm_payment(session_id).await?;
        info!(
            "payment session {session_id} confirmed for order {} ({})",
            order.id,
            order.status.as_str()
        );
        Ok(order)
    }

    pub async fn invoice(&self, order: &Order) -> Result<Document, DomainError> {
        ensure(order, OrderStatus::can_download_invoice, "invoiced")?;
        self.backend.invoice(order.id).await
    }

    pub async fn return_label(&self, order: &Order) -> Result<Document, DomainError> {
        ensure(order, OrderStatus::has_return_label, "given a return label")?;
        self.backend.return_label(order.id).await
    }

    fn begin(&self, id: OrderId, action: OrderAction) -> Result<Pending<'_>, DomainError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert((id, action)) {
            return Err(DomainError::ValidationFailure(format!(
                "{action:?} already in progress for order {id}"
            )));
        }
        Ok(Pending {
            in_flight: &self.in_flight,
            key: (id, action),
        })
    }
}

fn adopt(before: &Order, after: Order) -> Order {
    if before.status.can_transition_to(after.status) {
        info!(
            "order {} moved {} -> {}",
            after.id,
            before.status.as_str(),
            after.status.as_str()
        );
    } else {
        warn!(
            "order {} reported {} after {}; showing backend status",
            after.id,
            after.status.as_str(),
            before.status.as_str()
        );
    }
    after
}

fn ensure(order: &Order, allowed: fn(OrderStatus) -> bool, what: &str) -> Result<(), DomainError> {
    if allowed(order.status) {
        Ok(())
    } else {
        Err(DomainError::ValidationFailure(format!(
            "order {} cannot be {what} while {}",
            order.id,
            order.status.as_str()
        )))
    }
}
