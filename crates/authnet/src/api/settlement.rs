//! Settled-batch and transaction-list payloads for reconciliation.

use serde::{Deserialize, Serialize};

use super::{MerchantAuthentication, OneOrMany};

/// Top-level wrapper for querying settled batches over a date window.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSettledBatchListEnvelope {
    pub get_settled_batch_list_request: GetSettledBatchListRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSettledBatchListRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub include_statistics: bool,
    /// `%Y-%m-%dT%H:%M:%S`
    pub first_settlement_date: String,
    /// `%Y-%m-%dT%H:%M:%S`
    pub last_settlement_date: String,
}

/// Top-level wrapper for listing a batch's transactions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionListEnvelope {
    pub get_transaction_list_request: GetTransactionListRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionListRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub batch_id: String,
}

/// Payload of `getSettledBatchList`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListPayload {
    #[serde(default)]
    pub batch_list: Option<BatchList>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchList {
    /// Scalar for a single batch, list for several.
    pub batch: OneOrMany<SettlementBatch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBatch {
    pub batch_id: String,
    /// e.g. `settledSuccessfully`, `settlementError`
    pub settlement_state: String,
    /// e.g. `creditCard`, `eCheck`
    pub payment_method: String,
}

/// Payload of `getTransactionList`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListPayload {
    #[serde(default)]
    pub transactions: Option<TransactionList>,
    #[serde(default)]
    pub total_num_in_result_set: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionList {
    /// Scalar for a single transaction, list for several.
    pub transaction: OneOrMany<SettledTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledTransaction {
    #[serde(rename = "transId")]
    pub transaction_id: String,
}
