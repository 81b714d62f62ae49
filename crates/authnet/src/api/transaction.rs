//! Transaction request/response payloads (authorize, capture, refund).

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::MerchantAuthentication;

/// `transactionType` values used by this integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// Authorize only; capture happens later.
    #[serde(rename = "authOnlyTransaction")]
    AuthOnly,
    /// Authorize and capture in one step.
    #[serde(rename = "authCaptureTransaction")]
    AuthCapture,
    /// Refund against a settled transaction.
    #[serde(rename = "refundTransaction")]
    Refund,
}

/// Top-level wrapper; the outer key names the request kind on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionEnvelope {
    pub create_transaction_request: CreateTransactionRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub transaction_request: TransactionRequest,
}

/// The transaction body.
///
/// Field order follows the vendor schema. Optional blocks are omitted
/// entirely when unused; the vendor rejects blank fields.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction_type: TransactionType,
    /// Fixed-point decimal string, never a float.
    pub amount: String,
    pub payment: Option<PaymentData>,
    pub profile: Option<ProfileToCharge>,
    pub order: Option<OrderData>,
    pub line_items: Option<LineItems>,
    pub tax: Option<ExtendedAmount>,
    pub shipping: Option<ExtendedAmount>,
    #[serde(rename = "refTransId")]
    pub ref_trans_id: Option<String>,
    pub bill_to: Option<AddressData>,
    pub ship_to: Option<AddressData>,
    #[serde(rename = "customerIP")]
    pub customer_ip: Option<String>,
}

impl TransactionRequest {
    /// A request of the given type and amount with every optional block
    /// empty; builders fill in what the flow needs.
    #[must_use]
    pub const fn new(transaction_type: TransactionType, amount: String) -> Self {
        Self {
            transaction_type,
            amount,
            payment: None,
            profile: None,
            order: None,
            line_items: None,
            tax: None,
            shipping: None,
            ref_trans_id: None,
            bill_to: None,
            ship_to: None,
            customer_ip: None,
        }
    }
}

/// The `payment` block: either a one-time token or a masked card reference.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PaymentData {
    /// Tokenized payment data from client-side capture.
    Opaque {
        #[serde(rename = "opaqueData")]
        opaque_data: OpaqueData,
    },
    /// Masked card (last4 + MMYY), as required for refund verification.
    CreditCard {
        #[serde(rename = "creditCard")]
        credit_card: CreditCardRef,
    },
}

/// A one-time tokenized representation of card/account data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueData {
    pub data_descriptor: String,
    pub data_value: String,
}

/// Masked card reference; never carries a full card number.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardRef {
    /// Last four digits.
    pub card_number: String,
    /// `MMYY`, zero-padded.
    pub expiration_date: String,
}

/// The stored profile pair to charge.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileToCharge {
    pub customer_profile_id: String,
    pub payment_profile: PaymentProfileRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProfileRef {
    pub payment_profile_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub invoice_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItems {
    pub line_item: Vec<LineItemData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemData {
    pub item_id: String,
    /// At most 31 characters; longer labels are truncated upstream.
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
}

/// Amount block for tax and shipping totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedAmount {
    pub amount: String,
}

/// `billTo`/`shipTo` block.
///
/// Every field is optional on the wire; empty values must be omitted, not
/// sent as blank strings.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressData {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    /// Combined address line, capped at 60 characters.
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

/// Success payload of a `createTransaction` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub transaction_response: TransactionResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Gateway transaction id, stored as the payment's remote id.
    #[serde(rename = "transId")]
    pub transaction_id: String,
}
