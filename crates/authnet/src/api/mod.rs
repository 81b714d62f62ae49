//! Wire contract for the gateway's JSON API.
//!
//! Field names are bit-exact with the vendor schema (camelCase, XML-derived
//! wrapper objects like `customerPaymentProfileIdList.numericString`). Two
//! vendor quirks are normalized here, before any business logic runs:
//!
//! - a single element is returned as a scalar object while multiple come
//!   back as a list ([`OneOrMany`] folds both into a `Vec`);
//! - every response carries a `messages` envelope whose `resultCode` must be
//!   inspected before any other field is trusted ([`RemoteResponse`]).

mod profile;
mod settlement;
mod transaction;

pub use profile::{
    CreateCustomerPaymentProfileEnvelope, CreateCustomerPaymentProfileRequest,
    CreateCustomerProfileEnvelope, CreateCustomerProfileRequest, CreatePaymentProfilePayload,
    CreateProfilePayload, CustomerProfileData, CustomerType, NumericStringList,
    PaymentProfileData, StringList, VALIDATION_MODE_LIVE,
};
pub use settlement::{
    BatchList, BatchListPayload, GetSettledBatchListEnvelope, GetSettledBatchListRequest,
    GetTransactionListEnvelope, GetTransactionListRequest, SettledTransaction, SettlementBatch,
    TransactionList, TransactionListPayload,
};
pub use transaction::{
    AddressData, CreateTransactionEnvelope, CreateTransactionRequest, CreditCardRef, ExtendedAmount,
    LineItemData, LineItems, OpaqueData, OrderData, PaymentData, PaymentProfileRef,
    ProfileToCharge, TransactionPayload, TransactionRequest, TransactionResponse, TransactionType,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// Vendor message codes with special handling.
pub mod codes {
    /// Duplicate resource - recoverable by reusing the existing record.
    pub const DUPLICATE_RECORD: &str = "E00039";
    /// Invalid/stale reference - triggers local cleanup.
    pub const INVALID_REFERENCE: &str = "E00040";
}

/// Merchant credentials block present in every request envelope.
///
/// Implements `Debug` manually to redact the transaction key.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAuthentication {
    /// API login ID.
    pub name: String,
    /// Transaction key (HIGH PRIVILEGE).
    pub transaction_key: String,
}

impl std::fmt::Debug for MerchantAuthentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantAuthentication")
            .field("name", &self.name)
            .field("transaction_key", &"[REDACTED]")
            .finish()
    }
}

/// Gateway result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ResultCode {
    #[default]
    Ok,
    Error,
}

/// A single entry of the response `messages.message` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Vendor message code (e.g. `I00001`, `E00039`).
    pub code: String,
    /// Human-readable message text.
    pub text: String,
}

/// The `messages` envelope every response carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessages {
    /// Overall outcome.
    pub result_code: ResultCode,
    /// Ordered message list; the first entry is the primary outcome.
    #[serde(default)]
    pub message: Vec<ResponseMessage>,
}

/// A transaction-level error entry (`transactionResponse.errors[]`).
///
/// Presence of these marks a hard, non-retryable decline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    /// Vendor error code.
    pub error_code: String,
    /// Vendor error text.
    pub error_text: String,
}

/// A parsed gateway response.
///
/// Holds the typed `messages` envelope plus the raw payload. A non-Ok
/// result code means no other response field may be trusted - the payload
/// may be partially or entirely absent - so callers must check
/// [`result_code`](Self::result_code) before calling
/// [`decode`](Self::decode).
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    messages: ResponseMessages,
    contents: Value,
}

impl RemoteResponse {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidResponse`] when the `messages`
    /// envelope is missing or malformed - a decline still carries it, so
    /// its absence is a protocol failure, not a business outcome.
    pub fn from_value(contents: Value) -> Result<Self, GatewayError> {
        let messages = contents.get("messages").ok_or_else(|| {
            GatewayError::InvalidResponse("response is missing the messages envelope".to_string())
        })?;
        let messages: ResponseMessages = serde_json::from_value(messages.clone())
            .map_err(|e| GatewayError::InvalidResponse(format!("malformed messages envelope: {e}")))?;
        Ok(Self { messages, contents })
    }

    /// The overall result code.
    #[must_use]
    pub const fn result_code(&self) -> ResultCode {
        self.messages.result_code
    }

    /// Whether the gateway reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.messages.result_code == ResultCode::Ok
    }

    /// The ordered message list.
    #[must_use]
    pub fn messages(&self) -> &[ResponseMessage] {
        &self.messages.message
    }

    /// The primary outcome message, when present.
    #[must_use]
    pub fn first_message(&self) -> Option<&ResponseMessage> {
        self.messages.message.first()
    }

    /// Transaction-level errors carried inside `transactionResponse`.
    ///
    /// Empty when absent; scalar and list shapes are both handled.
    #[must_use]
    pub fn transaction_errors(&self) -> Vec<TransactionError> {
        self.contents
            .pointer("/transactionResponse/errors")
            .and_then(|v| serde_json::from_value::<OneOrMany<TransactionError>>(v.clone()).ok())
            .map_or_else(Vec::new, OneOrMany::into_vec)
    }

    /// Decode the payload into a typed structure.
    ///
    /// Call only after checking [`result_code`](Self::result_code): fields
    /// may legitimately be absent on declines.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidResponse`] when the payload does not
    /// match the expected shape.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.contents.clone())
            .map_err(|e| GatewayError::InvalidResponse(format!("unexpected payload shape: {e}")))
    }

    /// A string field at a JSON pointer path, when present.
    #[must_use]
    pub fn string_at(&self, pointer: &str) -> Option<String> {
        self.contents
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// The raw payload.
    #[must_use]
    pub const fn contents(&self) -> &Value {
        &self.contents
    }
}

/// The vendor's scalar-vs-list shape ambiguity.
///
/// A single batch/transaction/string is returned as a scalar while multiple
/// are returned as a list. Always normalized into a `Vec` immediately after
/// parsing, before any business logic touches the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Scalar shape.
    One(T),
    /// List shape.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Normalize into a `Vec`.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    /// The first element, consuming the container.
    #[must_use]
    pub fn into_first(self) -> Option<T> {
        self.into_vec().into_iter().next()
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}
