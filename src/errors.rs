use reqwest::StatusCode;

use crate::domain::errors::DomainError;
use crate::infrastructure::models::ErrorResponse;

/// The kind of backend call that failed; the same status means different
/// things on different endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Cart mutations, where a rejection means stock ran out.
    Cart,
    /// Order creation. A conflict means stock ran out between viewing the
    /// cart and submitting it; a bad request means the cart was unusable.
    Checkout,
    /// Order transitions and payment sessions, where a conflict means the
    /// order already moved on.
    Transition,
    /// Everything else.
    Read,
}

/// Maps a non-success backend response to the error callers act on.
pub fn classify(status: StatusCode, body: &str, endpoint: Endpoint) -> DomainError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::NotAuthenticated,
        StatusCode::NOT_FOUND => DomainError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            match endpoint {
                Endpoint::Cart => DomainError::StockViolation(message),
                Endpoint::Checkout if status == StatusCode::CONFLICT => {
                    DomainError::StockViolation(message)
                }
                Endpoint::Checkout => DomainError::ValidationFailure(message),
                Endpoint::Transition => DomainError::StaleState(message),
                Endpoint::Read if status == StatusCode::CONFLICT => {
                    DomainError::StaleState(message)
                }
                Endpoint::Read => DomainError::ValidationFailure(message),
            }
        }
        _ => DomainError::NetworkFailure(format!("{status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_mean_not_authenticated() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            for endpoint in [
                Endpoint::Cart,
                Endpoint::Checkout,
                Endpoint::Transition,
                Endpoint::Read,
            ] {
                assert_eq!(
                    classify(status, "", endpoint),
                    DomainError::NotAuthenticated
                );
            }
        }
    }

    #[test]
    fn cart_conflict_is_stock_violation_with_backend_message() {
        let err = classify(
            StatusCode::CONFLICT,
            r#"{"error":"Only 2 items left in stock"}"#,
            Endpoint::Cart,
        );
        assert_eq!(
            err,
            DomainError::StockViolation("Only 2 items left in stock".to_string())
        );
    }

    #[test]
    fn checkout_separates_empty_cart_from_stock_conflict() {
        let empty = classify(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Cart is empty"}"#,
            Endpoint::Checkout,
        );
        let sold_out = classify(
            StatusCode::CONFLICT,
            r#"{"error":"Product 7 sold out"}"#,
            Endpoint::Checkout,
        );

        assert_eq!(empty, DomainError::ValidationFailure("Cart is empty".to_string()));
        assert_eq!(sold_out, DomainError::StockViolation("Product 7 sold out".to_string()));
    }

    #[test]
    fn transition_conflict_is_stale_state() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Order already shipped"}"#,
            Endpoint::Transition,
        );
        assert_eq!(
            err,
            DomainError::StaleState("Order already shipped".to_string())
        );
    }

    #[test]
    fn read_bad_request_is_validation_failure() {
        let err = classify(StatusCode::BAD_REQUEST, "not json", Endpoint::Read);
        assert_eq!(err, DomainError::ValidationFailure("Bad Request".to_string()));
    }

    #[test]
    fn not_found_maps_to_not_found() {
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "", Endpoint::Read),
            DomainError::NotFound
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify(StatusCode::BAD_GATEWAY, "", Endpoint::Cart);
        assert!(matches!(err, DomainError::NetworkFailure(_)));
        assert!(err.is_retryable());
    }
}
