//! Payment and payment-method entities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::id::{OrderId, PaymentId, PaymentMethodId};
use super::price::Price;
use super::status::PaymentState;

/// Separator between the two halves of a composite remote id.
const COMPOSITE_SEPARATOR: char = '|';

/// Errors from parsing a stored remote id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteIdError {
    /// The stored value is empty.
    #[error("remote id cannot be empty")]
    Empty,
    /// A composite id did not split into exactly two non-empty halves.
    #[error("malformed composite remote id: {0:?}")]
    MalformedComposite(String),
}

/// The gateway reference stored on a payment method.
///
/// The encoding is polymorphic by payment-method variant:
/// - a card on file for an authenticated customer stores just the payment
///   profile token (the customer profile id lives on the owner record);
/// - an anonymous card stores `customerProfileId|paymentProfileId`;
/// - a single-use eCheck token stores `dataDescriptor|dataValue`.
///
/// Both halves of a composite id are caller-opaque strings; only the `|`
/// separator is structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteId {
    /// A single payment-profile token.
    PaymentProfile(String),
    /// A `first|second` pair.
    Composite(String, String),
}

impl RemoteId {
    /// Build a composite id from its two halves.
    #[must_use]
    pub fn composite(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::Composite(first.into(), second.into())
    }

    /// Parse a stored remote id string.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteIdError`] for empty input or a composite value whose
    /// halves are not exactly two non-empty segments.
    pub fn parse(s: &str) -> Result<Self, RemoteIdError> {
        if s.is_empty() {
            return Err(RemoteIdError::Empty);
        }
        if !s.contains(COMPOSITE_SEPARATOR) {
            return Ok(Self::PaymentProfile(s.to_owned()));
        }
        match s.split(COMPOSITE_SEPARATOR).collect::<Vec<_>>()[..] {
            [first, second] if !first.is_empty() && !second.is_empty() => {
                Ok(Self::Composite(first.to_owned(), second.to_owned()))
            }
            _ => Err(RemoteIdError::MalformedComposite(s.to_owned())),
        }
    }

    /// The two halves of a composite id, or `None` for a plain token.
    #[must_use]
    pub fn as_composite(&self) -> Option<(&str, &str)> {
        match self {
            Self::Composite(first, second) => Some((first, second)),
            Self::PaymentProfile(_) => None,
        }
    }

    /// The plain payment-profile token, or `None` for a composite id.
    #[must_use]
    pub fn as_payment_profile(&self) -> Option<&str> {
        match self {
            Self::PaymentProfile(token) => Some(token),
            Self::Composite(..) => None,
        }
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentProfile(token) => write!(f, "{token}"),
            Self::Composite(first, second) => {
                write!(f, "{first}{COMPOSITE_SEPARATOR}{second}")
            }
        }
    }
}

/// Credit card brands accepted by the gateway integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Amex,
    #[serde(rename = "dinersclub")]
    DinersClub,
    Discover,
    Jcb,
    Mastercard,
    Visa,
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Amex => "amex",
            Self::DinersClub => "dinersclub",
            Self::Discover => "discover",
            Self::Jcb => "jcb",
            Self::Mastercard => "mastercard",
            Self::Visa => "visa",
        };
        write!(f, "{s}")
    }
}

/// Card details retained after tokenization.
///
/// Only non-sensitive display data: the raw card number never reaches this
/// system (tokenization happens client-side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    /// Card brand.
    pub brand: CardBrand,
    /// Last four digits of the card number.
    pub last4: String,
    /// Expiration month (1-12).
    pub expiration_month: u32,
    /// Expiration year (four digits).
    pub expiration_year: i32,
}

impl CardMetadata {
    /// The instant the card expires: the end of its expiration month (UTC).
    ///
    /// Returns `None` for out-of-range month/year values.
    #[must_use]
    pub fn expiration_timestamp(&self) -> Option<DateTime<Utc>> {
        let (year, month) = if self.expiration_month == 12 {
            (self.expiration_year.checked_add(1)?, 1)
        } else {
            (self.expiration_year, self.expiration_month + 1)
        };
        let next_month = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
        Some((next_month - chrono::Duration::seconds(1)).and_utc())
    }
}

/// The payment instrument family a method belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    /// Tokenized credit card, stored as a remote customer payment profile.
    CreditCard,
    /// Tokenized bank account; single-use, settled asynchronously.
    Echeck,
}

/// A stored payment method.
///
/// Created by the checkout flow with identity and billing data; the profile
/// manager fills in the remote id, card metadata, reusability and expiry
/// after talking to the gateway. Deletable by the gateway integration when
/// the vendor reports the stored token permanently invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Internal payment method ID.
    pub id: PaymentMethodId,
    /// Instrument family.
    pub kind: PaymentMethodKind,
    /// Gateway reference, once established.
    pub remote_id: Option<RemoteId>,
    /// Card display data (credit card methods only).
    pub card: Option<CardMetadata>,
    /// Billing address from the billing profile.
    pub billing_address: Option<Address>,
    /// Whether the method can be charged again after first use.
    pub reusable: bool,
    /// When the stored token stops being chargeable.
    pub expires_at: Option<DateTime<Utc>>,
}

impl PaymentMethod {
    /// A freshly created method with no gateway state yet.
    #[must_use]
    pub const fn new(id: PaymentMethodId, kind: PaymentMethodKind) -> Self {
        Self {
            id,
            kind,
            remote_id: None,
            card: None,
            billing_address: None,
            reusable: true,
            expires_at: None,
        }
    }
}

/// A payment against an order.
///
/// Created by the checkout flow; mutated exclusively by the transaction
/// orchestrator and settlement reconciler. One payment maps to exactly one
/// remote transaction at a time; refunds accumulate into
/// `refunded_amount` instead of spawning new entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Internal payment ID.
    pub id: PaymentId,
    /// The order this payment belongs to.
    pub order_id: OrderId,
    /// Authorized/captured amount.
    pub amount: Price,
    /// Workflow state.
    pub state: PaymentState,
    /// Gateway transaction id, once submitted.
    pub remote_id: Option<String>,
    /// Cumulative refunded amount.
    pub refunded_amount: Price,
}

impl Payment {
    /// A new payment in the `New` state with nothing refunded.
    #[must_use]
    pub const fn new(id: PaymentId, order_id: OrderId, amount: Price) -> Self {
        Self {
            id,
            order_id,
            amount,
            state: PaymentState::New,
            remote_id: None,
            refunded_amount: Price::zero(amount.currency_code),
        }
    }

    /// The amount still available to refund.
    #[must_use]
    pub fn remaining_refundable(&self) -> Price {
        Price::new(
            self.amount.amount - self.refunded_amount.amount,
            self.amount.currency_code,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::price::CurrencyCode;

    #[test]
    fn test_remote_id_parse_plain_token() {
        let id = RemoteId::parse("812354079").unwrap();
        assert_eq!(id.as_payment_profile(), Some("812354079"));
        assert_eq!(id.to_string(), "812354079");
    }

    #[test]
    fn test_remote_id_parse_composite() {
        let id = RemoteId::parse("39998916|812354079").unwrap();
        assert_eq!(id.as_composite(), Some(("39998916", "812354079")));
        assert_eq!(id.to_string(), "39998916|812354079");
    }

    #[test]
    fn test_remote_id_composite_halves_non_empty() {
        assert!(matches!(
            RemoteId::parse("|812354079"),
            Err(RemoteIdError::MalformedComposite(_))
        ));
        assert!(matches!(
            RemoteId::parse("39998916|"),
            Err(RemoteIdError::MalformedComposite(_))
        ));
        assert!(matches!(
            RemoteId::parse("a|b|c"),
            Err(RemoteIdError::MalformedComposite(_))
        ));
    }

    #[test]
    fn test_remote_id_parse_empty() {
        assert!(matches!(RemoteId::parse(""), Err(RemoteIdError::Empty)));
    }

    #[test]
    fn test_remote_id_display_roundtrip() {
        let id = RemoteId::composite("COMMON.ACCEPT.INAPP.PAYMENT", "token-value");
        let parsed = RemoteId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_card_expiration_timestamp_end_of_month() {
        let card = CardMetadata {
            brand: CardBrand::Visa,
            last4: "1111".to_string(),
            expiration_month: 1,
            expiration_year: 2027,
        };
        let expires = card.expiration_timestamp().unwrap();
        assert_eq!(expires.to_rfc3339(), "2027-01-31T23:59:59+00:00");
    }

    #[test]
    fn test_card_expiration_timestamp_december_rolls_year() {
        let card = CardMetadata {
            brand: CardBrand::Mastercard,
            last4: "4444".to_string(),
            expiration_month: 12,
            expiration_year: 2026,
        };
        let expires = card.expiration_timestamp().unwrap();
        assert_eq!(expires.to_rfc3339(), "2026-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_card_expiration_timestamp_invalid_month() {
        let card = CardMetadata {
            brand: CardBrand::Visa,
            last4: "1111".to_string(),
            expiration_month: 13,
            expiration_year: 2027,
        };
        assert!(card.expiration_timestamp().is_none());
    }

    #[test]
    fn test_payment_new_defaults() {
        let amount = Price::new("50.00".parse().unwrap(), CurrencyCode::USD);
        let payment = Payment::new(PaymentId::new(1), OrderId::new(2), amount);
        assert_eq!(payment.state, PaymentState::New);
        assert!(payment.remote_id.is_none());
        assert!(payment.refunded_amount.is_zero());
        assert_eq!(payment.remaining_refundable(), amount);
    }

    #[test]
    fn test_remaining_refundable_after_partial() {
        let amount = Price::new("50.00".parse().unwrap(), CurrencyCode::USD);
        let mut payment = Payment::new(PaymentId::new(1), OrderId::new(2), amount);
        payment.refunded_amount = Price::new("20.00".parse().unwrap(), CurrencyCode::USD);
        assert_eq!(
            payment.remaining_refundable().to_wire_string(),
            "30.00".to_string()
        );
    }

    #[test]
    fn test_card_brand_display() {
        assert_eq!(CardBrand::DinersClub.to_string(), "dinersclub");
        assert_eq!(CardBrand::Visa.to_string(), "visa");
    }
}
