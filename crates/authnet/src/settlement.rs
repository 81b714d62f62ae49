//! Settlement reconciliation for asynchronously settled eCheck payments.

use chrono::NaiveDateTime;
use tracing::{instrument, warn};

use pineapple_core::Payment;

use crate::api::{
    BatchListPayload, GetSettledBatchListEnvelope, GetSettledBatchListRequest,
    GetTransactionListEnvelope, GetTransactionListRequest, TransactionListPayload,
};
use crate::client::{GatewayClient, RequestKind};
use crate::error::GatewayError;
use crate::repository::PaymentRepository;

/// Batch payment method for eChecks.
const ECHECK_PAYMENT_METHOD: &str = "eCheck";
/// The only settlement state that counts as confirmed.
const SETTLED_SUCCESSFULLY: &str = "settledSuccessfully";
/// Settlement window date format.
const SETTLEMENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Maps settled gateway batches back to locally pending payments.
///
/// eChecks are captured optimistically at submission and settle on the
/// vendor's schedule; this reconciler is the authoritative confirmation
/// path that promotes `Pending` payments.
#[derive(Debug)]
pub struct SettlementReconciler<P: PaymentRepository> {
    client: GatewayClient,
    payments: P,
}

impl<P: PaymentRepository> SettlementReconciler<P> {
    /// Create a new reconciler.
    #[must_use]
    pub const fn new(client: GatewayClient, payments: P) -> Self {
        Self { client, payments }
    }

    /// Locally pending eCheck payments whose remote transaction settled in
    /// the given window.
    ///
    /// Queries the gateway for settled batches, keeps only eCheck batches
    /// that settled successfully, flattens their transaction ids, and
    /// returns the matching pending payments for the caller to promote to
    /// `Completed`. A non-Ok batch response yields an empty result.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] on network failure.
    /// - [`GatewayError::Repository`] when the local payment lookup fails.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn settled_echeck_payments(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Payment>, GatewayError> {
        let batch_ids = self.settled_echeck_batch_ids(from, to).await?;

        let mut remote_ids = Vec::new();
        for batch_id in batch_ids {
            remote_ids.extend(self.batch_transaction_ids(&batch_id).await?);
        }

        if remote_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.payments.find_pending_echeck(&remote_ids).await?)
    }

    /// IDs of eCheck batches that settled successfully in the window.
    async fn settled_echeck_batch_ids(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<String>, GatewayError> {
        let envelope = GetSettledBatchListEnvelope {
            get_settled_batch_list_request: GetSettledBatchListRequest {
                merchant_authentication: self.client.merchant_authentication(),
                include_statistics: false,
                first_settlement_date: from.format(SETTLEMENT_DATE_FORMAT).to_string(),
                last_settlement_date: to.format(SETTLEMENT_DATE_FORMAT).to_string(),
            },
        };
        let response = self
            .client
            .execute(RequestKind::GetSettledBatchList, &envelope)
            .await?;

        if !response.is_ok() {
            let code = response.first_message().map(|m| m.code.clone());
            warn!(?code, "settled batch list query failed");
            return Ok(Vec::new());
        }

        let payload: BatchListPayload = response.decode()?;
        let batches = payload
            .batch_list
            .map_or_else(Vec::new, |list| list.batch.into_vec());

        Ok(batches
            .into_iter()
            .filter(|batch| {
                batch.payment_method == ECHECK_PAYMENT_METHOD
                    && batch.settlement_state == SETTLED_SUCCESSFULLY
            })
            .map(|batch| batch.batch_id)
            .collect())
    }

    /// All transaction ids in a settled batch.
    async fn batch_transaction_ids(&self, batch_id: &str) -> Result<Vec<String>, GatewayError> {
        let envelope = GetTransactionListEnvelope {
            get_transaction_list_request: GetTransactionListRequest {
                merchant_authentication: self.client.merchant_authentication(),
                batch_id: batch_id.to_string(),
            },
        };
        let response = self
            .client
            .execute(RequestKind::GetTransactionList, &envelope)
            .await?;

        if !response.is_ok() {
            let code = response.first_message().map(|m| m.code.clone());
            warn!(batch_id, ?code, "transaction list query failed; skipping batch");
            return Ok(Vec::new());
        }

        let payload: TransactionListPayload = response.decode()?;
        Ok(payload
            .transactions
            .map_or_else(Vec::new, |list| list.transaction.into_vec())
            .into_iter()
            .map(|transaction| transaction.transaction_id)
            .collect())
    }
}
