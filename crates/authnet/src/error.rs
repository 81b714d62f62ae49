//! Unified error handling for the gateway integration.

use thiserror::Error;

use pineapple_core::{Price, PriceError, PaymentState};

use crate::repository::RepositoryError;

/// Errors surfaced by the gateway integration.
///
/// The variants partition into retryability classes:
/// - [`Transport`](Self::Transport) is the only retryable class (with
///   backoff); the transport timeout also lands here.
/// - [`Validation`](Self::Validation), [`InvalidState`](Self::InvalidState),
///   [`UnsupportedCardType`](Self::UnsupportedCardType) and
///   [`RefundExceedsAmount`](Self::RefundExceedsAmount) are caller errors.
/// - [`Declined`](Self::Declined) and [`HardDecline`](Self::HardDecline) are
///   business declines surfaced to the end user; a hard decline must never
///   be resubmitted.
/// - [`PaymentMethodInvalid`](Self::PaymentMethodInvalid) and
///   [`ProfileNotFound`](Self::ProfileNotFound) indicate stale remote state
///   that has already been cleaned up locally; the flow may be retried once
///   with fresh input.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller-supplied input was malformed; fix the input before retrying.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or protocol failure reaching the gateway.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway returned a payload that could not be interpreted.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Business decline reported by the gateway.
    #[error("payment declined ({code}): {message}")]
    Declined {
        /// Vendor message code (e.g. `E00027`).
        code: String,
        /// Vendor message text.
        message: String,
    },

    /// Decline the gateway marks as non-retryable; do not resubmit.
    #[error("hard decline: {0}")]
    HardDecline(String),

    /// The stored payment method was revoked and has been deleted locally;
    /// the customer must re-enter payment details.
    #[error("the provided payment method is no longer valid")]
    PaymentMethodInvalid,

    /// The stored customer profile reference was stale and has been
    /// cleared; retrying the whole flow once will create a fresh profile.
    #[error("the customer record could not be found")]
    ProfileNotFound,

    /// Requested refund exceeds what remains refundable on the payment.
    #[error("refund of {requested} exceeds remaining refundable {remaining}")]
    RefundExceedsAmount {
        /// Amount the caller asked to refund.
        requested: Price,
        /// Amount still available to refund.
        remaining: Price,
    },

    /// Operation invoked from a disallowed payment state.
    #[error("payment is {actual}, expected one of [{expected}]")]
    InvalidState {
        /// State the payment was actually in.
        actual: PaymentState,
        /// Comma-separated list of allowed source states.
        expected: String,
    },

    /// The gateway reported a card brand outside the supported set.
    #[error("unsupported credit card type {0:?}")]
    UnsupportedCardType(String),

    /// Host storage operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl GatewayError {
    /// Whether the operation may be retried as-is (with backoff).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<PriceError> for GatewayError {
    fn from(err: PriceError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::Declined {
            code: "E00027".to_string(),
            message: "The transaction was unsuccessful.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "payment declined (E00027): The transaction was unsuccessful."
        );

        let err = GatewayError::PaymentMethodInvalid;
        assert_eq!(
            err.to_string(),
            "the provided payment method is no longer valid"
        );
    }

    #[test]
    fn test_invalid_state_display() {
        let err = GatewayError::InvalidState {
            actual: PaymentState::Refunded,
            expected: "completed, partially_refunded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "payment is refunded, expected one of [completed, partially_refunded]"
        );
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(!GatewayError::Validation("bad".to_string()).is_retryable());
        assert!(!GatewayError::HardDecline("stolen card".to_string()).is_retryable());
        assert!(!GatewayError::ProfileNotFound.is_retryable());
    }

    #[test]
    fn test_price_error_converts_to_validation() {
        use pineapple_core::CurrencyCode;
        let err = PriceError::CurrencyMismatch {
            left: CurrencyCode::USD,
            right: CurrencyCode::EUR,
        };
        assert!(matches!(
            GatewayError::from(err),
            GatewayError::Validation(_)
        ));
    }
}
