//! Seams to the host system's payment storage.
//!
//! The host order-management system owns entity persistence. The gateway
//! integration needs exactly two storage operations of its own: deleting a
//! payment method the vendor revoked, and looking up pending eCheck
//! payments during settlement reconciliation. Everything else happens
//! through `&mut` borrows the caller persists afterwards.

use thiserror::Error;

use pineapple_core::{Payment, PaymentMethodId};

/// A host storage operation failed.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct RepositoryError(String);

impl RepositoryError {
    /// Wrap a host storage failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Deletion of stored payment methods.
pub trait PaymentMethodRepository {
    /// Remove a stored payment method after the gateway reports its token
    /// permanently invalid.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the host storage operation fails.
    fn delete(
        &self,
        id: PaymentMethodId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Lookup of payments awaiting settlement.
pub trait PaymentRepository {
    /// Pending eCheck payments whose remote transaction id is among
    /// `remote_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the host storage operation fails.
    fn find_pending_echeck(
        &self,
        remote_ids: &[String],
    ) -> impl Future<Output = Result<Vec<Payment>, RepositoryError>> + Send;
}
