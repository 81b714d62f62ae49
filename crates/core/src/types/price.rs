//! Type-safe price representation using decimal arithmetic.
//!
//! Monetary amounts are `rust_decimal::Decimal`, never floats. The gateway
//! serializes amounts as fixed-point strings with exactly two decimals; see
//! [`Price::to_wire_string`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors from price arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// Two prices with different currencies were combined.
    #[error("currency mismatch: {left:?} vs {right:?}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        left: CurrencyCode,
        /// Currency of the right-hand operand.
        right: CurrencyCode,
    },
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Add another price of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::CurrencyMismatch`] if the currencies differ.
    pub fn checked_add(&self, other: &Self) -> Result<Self, PriceError> {
        self.assert_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency_code))
    }

    /// Subtract another price of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::CurrencyMismatch`] if the currencies differ.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, PriceError> {
        self.assert_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency_code))
    }

    /// Format the amount as a fixed-point string with two decimals.
    ///
    /// This is the only representation ever sent over the wire; the gateway
    /// rejects floats and rounding drift is not acceptable for money.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        format!("{:.2}", self.amount)
    }

    fn assert_same_currency(&self, other: &Self) -> Result<(), PriceError> {
        if self.currency_code == other.currency_code {
            Ok(())
        } else {
            Err(PriceError::CurrencyMismatch {
                left: self.currency_code,
                right: other.currency_code,
            })
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {:?}", self.amount, self.currency_code)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}
