use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;

pub type OrderId = i64;

/// Copy of a cart line frozen at checkout. Later catalog changes never
/// reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemSnapshot {
    pub product_name: String,
    pub unit_price: BigDecimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub reference: String,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemSnapshot>,
}

impl Order {
    pub fn actions(&self) -> OrderActions {
        OrderActions::from(self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    ReturnRequested,
    ReturnApproved,
    ReturnRejected,
}

/// Who is allowed to drive a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer,
    PaymentProvider,
    Operator,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::ReturnRequested,
        OrderStatus::ReturnApproved,
        OrderStatus::ReturnRejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::ReturnRequested => "RETURN_REQUESTED",
            OrderStatus::ReturnApproved => "RETURN_APPROVED",
            OrderStatus::ReturnRejected => "RETURN_REJECTED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending payment",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::ReturnRequested => "Return requested",
            OrderStatus::ReturnApproved => "Return approved",
            OrderStatus::ReturnRejected => "Return rejected",
        }
    }

    /// The actor that may move an order from `self` to `to`, or `None` when
    /// the transition is not part of the lifecycle.
    pub fn transition_actor(self, to: OrderStatus) -> Option<Actor> {
        use OrderStatus::*;
        match (self, to) {
            (Pending, Paid) => Some(Actor::PaymentProvider),
            (Pending, Cancelled) | (Paid, Cancelled) => Some(Actor::Customer),
            (Paid, Shipped) | (Shipped, Delivered) => Some(Actor::Operator),
            (Delivered, ReturnRequested) => Some(Actor::Customer),
            (ReturnRequested, ReturnApproved) | (ReturnRequested, ReturnRejected) => {
                Some(Actor::Operator)
            }
            _ => None,
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.transition_actor(to).is_some()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::ReturnRejected)
    }

    pub fn can_cancel(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    pub fn can_pay(self) -> bool {
        self == OrderStatus::Pending
    }

    pub fn can_download_invoice(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Delivered)
    }

    pub fn can_request_return(self) -> bool {
        self == OrderStatus::Delivered
    }

    pub fn has_return_label(self) -> bool {
        self == OrderStatus::ReturnApproved
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidResponse(format!("unknown order status '{s}'")))
    }
}

/// Which order actions a view may offer, computed from the status alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderActions {
    pub can_cancel: bool,
    pub can_pay: bool,
    pub can_download_invoice: bool,
    pub can_request_return: bool,
    pub has_return_label: bool,
}

impl OrderActions {
    /// Unrecognised status strings offer no actions at all.
    pub fn for_status(status: &str) -> Self {
        status
            .parse::<OrderStatus>()
            .map(OrderActions::from)
            .unwrap_or_default()
    }
}

impl From<OrderStatus> for OrderActions {
    fn from(status: OrderStatus) -> Self {
        OrderActions {
            can_cancel: status.can_cancel(),
            can_pay: status.can_pay(),
            can_download_invoice: status.can_download_invoice(),
            can_request_return: status.can_request_return(),
            has_return_label: status.has_return_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnRequest {
    pub reason: String,
    pub comment: Option<String>,
}

impl ReturnRequest {
    pub fn new(reason: impl Into<String>, comment: Option<String>) -> Result<Self, DomainError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::ValidationFailure(
                "a return reason is required".to_string(),
            ));
        }
        let comment = comment.filter(|c| !c.trim().is_empty());
        Ok(Self { reason, comment })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub checkout_url: String,
    pub order_reference: String,
}

/// Binary document served for an order (invoice or return label).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_only_from_pending_or_paid() {
        for status in OrderStatus::ALL {
            let expected = matches!(status, OrderStatus::Pending | OrderStatus::Paid);
            assert_eq!(status.can_cancel(), expected, "{status:?}");
        }
    }

    #[test]
    fn return_only_from_delivered() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_request_return(),
                status == OrderStatus::Delivered,
                "{status:?}"
            );
        }
    }

    #[test]
    fn invoice_available_when_paid_or_delivered() {
        assert!(OrderStatus::Paid.can_download_invoice());
        assert!(OrderStatus::Delivered.can_download_invoice());
        assert!(!OrderStatus::Pending.can_download_invoice());
        assert!(!OrderStatus::Shipped.can_download_invoice());
        assert!(!OrderStatus::Cancelled.can_download_invoice());
    }

    #[test]
    fn return_label_only_once_approved() {
        assert!(!OrderStatus::ReturnRequested.has_return_label());
        assert!(OrderStatus::ReturnApproved.has_return_label());
        assert!(!OrderStatus::ReturnRejected.has_return_label());
    }

    #[test]
    fn requested_return_closes_return_action() {
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::ReturnRequested));
        let actions = OrderActions::from(OrderStatus::ReturnRequested);
        assert!(!actions.can_request_return);
        assert!(!actions.has_return_label);
    }

    #[test]
    fn parses_wire_strings() {
        assert_eq!(
            "RETURN_REQUESTED".parse::<OrderStatus>(),
            Ok(OrderStatus::ReturnRequested)
        );
        assert_eq!(" paid ".parse::<OrderStatus>(), Ok(OrderStatus::Paid));
        assert!("REFUNDED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn actions_from_raw_status_strings() {
        let pending = OrderActions::for_status("PENDING");
        assert!(pending.can_cancel && pending.can_pay);
        assert!(!pending.can_download_invoice);

        assert_eq!(OrderActions::for_status("UNKNOWN"), OrderActions::default());
    }

    #[test]
    fn customer_may_only_cancel_and_request_return() {
        use OrderStatus::*;
        assert_eq!(Pending.transition_actor(Cancelled), Some(Actor::Customer));
        assert_eq!(Paid.transition_actor(Cancelled), Some(Actor::Customer));
        assert_eq!(Shipped.transition_actor(Cancelled), None);
        assert_eq!(Delivered.transition_actor(ReturnRequested), Some(Actor::Customer));
        assert_eq!(Pending.transition_actor(Paid), Some(Actor::PaymentProvider));
        assert_eq!(Paid.transition_actor(Shipped), Some(Actor::Operator));
        assert_eq!(
            ReturnRequested.transition_actor(ReturnRejected),
            Some(Actor::Operator)
        );
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for from in OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
        assert!(!OrderStatus::ReturnApproved.is_terminal());
    }

    #[test]
    fn return_request_needs_a_reason() {
        assert!(ReturnRequest::new("  ", None).is_err());
        let request =
            ReturnRequest::new("damaged", Some(String::new())).expect("reason present");
        assert_eq!(request.reason, "damaged");
        assert_eq!(request.comment, None);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(OrderStatus::ReturnApproved.to_string(), "Return approved");
        assert_eq!(OrderStatus::ReturnApproved.as_str(), "RETURN_APPROVED");
    }
}
