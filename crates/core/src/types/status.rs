//! Payment workflow state.

use serde::{Deserialize, Serialize};

/// Payment state within the local payment workflow.
///
/// Credit card payments move `New -> Completed` (auth + capture) or
/// `New -> Authorization` (auth only), then through the refund states.
/// eCheck payments move `New -> Pending` on submission because the gateway
/// settles them asynchronously; `Pending` is promoted to `Completed` locally
/// (or confirmed by settlement reconciliation) and can still be voided.
///
/// Transitions are enforced by the transaction orchestrator; the enum itself
/// is plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Created by checkout, nothing submitted to the gateway yet.
    #[default]
    New,
    /// Authorized but not captured.
    Authorization,
    /// Submitted, awaiting asynchronous settlement (eCheck only).
    Pending,
    /// Captured.
    Completed,
    /// Partially refunded; more refundable amount remains.
    PartiallyRefunded,
    /// Fully refunded.
    Refunded,
    /// Voided before settlement.
    Voided,
}

impl PaymentState {
    /// Whether a refund may be issued from this state.
    #[must_use]
    pub const fn is_refundable(self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyRefunded)
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Authorization => "authorization",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Voided => "voided",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PaymentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "authorization" => Ok(Self::Authorization),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "refunded" => Ok(Self::Refunded),
            "voided" => Ok(Self::Voided),
            _ => Err(format!("invalid payment state: {s}")),
        }
    }
}
