//! Customer (payment-method owner) identity.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::CustomerId;

/// The owner of payment methods, as read from the host user system.
///
/// The `remote_customer_id` field is the one piece of durable state this
/// integration manages on the owner record: the gateway-side customer
/// profile id. Anonymous owners never get one; their checkout tokens encode
/// the profile pair directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Internal customer ID.
    pub id: CustomerId,
    /// Account email, when known.
    pub email: Option<Email>,
    /// Whether this is a guest checkout identity.
    pub anonymous: bool,
    /// Gateway customer profile id, managed by the profile manager.
    pub remote_customer_id: Option<String>,
}

impl Customer {
    /// An authenticated customer with no gateway profile yet.
    #[must_use]
    pub const fn authenticated(id: CustomerId, email: Email) -> Self {
        Self {
            id,
            email: Some(email),
            anonymous: false,
            remote_customer_id: None,
        }
    }

    /// A guest checkout identity.
    #[must_use]
    pub const fn anonymous(id: CustomerId) -> Self {
        Self {
            id,
            email: None,
            anonymous: true,
            remote_customer_id: None,
        }
    }

    /// Whether the owner is a signed-in account (not a guest).
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !self.anonymous
    }
}
