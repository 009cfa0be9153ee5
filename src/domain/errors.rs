use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested quantity exceeds what the backend has in stock.
    #[error("Stock violation: {0}")]
    StockViolation(String),
    /// The session is missing or expired; the caller should send the user to login.
    #[error("Not authenticated")]
    NotAuthenticated,
    /// The backend refused a transition because the order already moved on.
    #[error("Stale state: {0}")]
    StaleState(String),
    /// Transient transport failure. The cache is left untouched.
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    /// Rejected before any request was sent.
    #[error("Validation failure: {0}")]
    ValidationFailure(String),
    #[error("Not found")]
    NotFound,
    /// The backend answered with a body that could not be decoded or that
    /// breaks a cart invariant.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether retrying the same request may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::NetworkFailure(_))
    }

    /// Whether the caller should re-fetch before showing anything else.
    pub fn requires_refetch(&self) -> bool {
        matches!(
            self,
            DomainError::StockViolation(_) | DomainError::StaleState(_)
        )
    }
}
