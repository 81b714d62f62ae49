//! Low-level gateway transport.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;

use crate::api::{MerchantAuthentication, RemoteResponse};
use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// The operation a request envelope carries.
///
/// The gateway multiplexes every operation over a single endpoint - the
/// envelope's outer JSON key is the real discriminator - so this enum only
/// labels requests for tracing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    CreateTransaction,
    CreateCustomerProfile,
    CreateCustomerPaymentProfile,
    GetSettledBatchList,
    GetTransactionList,
}

impl RequestKind {
    /// The wire name of the request kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTransaction => "createTransactionRequest",
            Self::CreateCustomerProfile => "createCustomerProfileRequest",
            Self::CreateCustomerPaymentProfile => "createCustomerPaymentProfileRequest",
            Self::GetSettledBatchList => "getSettledBatchListRequest",
            Self::GetTransactionList => "getTransactionListRequest",
        }
    }
}

/// Gateway API client.
///
/// Sends structured request envelopes to the gateway endpoint and parses
/// structured responses. Fails with a transport-class error on network or
/// protocol failure; business declines never error here - they surface as a
/// non-Ok result code plus a message/error list the caller interprets.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    http: reqwest::Client,
    endpoint: String,
    api_login_id: String,
    transaction_key: String,
}

impl GatewayClient {
    /// Create a new gateway client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayClientInner {
                http,
                endpoint: config.endpoint.clone(),
                api_login_id: config.api_login_id.clone(),
                transaction_key: config.transaction_key.expose_secret().to_string(),
            }),
        })
    }

    /// The credentials block embedded in every request envelope.
    #[must_use]
    pub fn merchant_authentication(&self) -> MerchantAuthentication {
        MerchantAuthentication {
            name: self.inner.api_login_id.clone(),
            transaction_key: self.inner.transaction_key.clone(),
        }
    }

    /// Execute a request against the gateway.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] on network failure, timeout, or a
    ///   non-2xx HTTP status.
    /// - [`GatewayError::InvalidResponse`] when the body is not a valid
    ///   response document.
    ///
    /// A business decline is NOT an error here: the returned
    /// [`RemoteResponse`] carries a non-Ok result code the caller must
    /// inspect before trusting any payload field.
    #[instrument(skip(self, body), fields(kind = kind.as_str()))]
    pub async fn execute<B: Serialize + Sync>(
        &self,
        kind: RequestKind,
        body: &B,
    ) -> Result<RemoteResponse, GatewayError> {
        let response = self
            .inner
            .http
            .post(&self.inner.endpoint)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        // The gateway prefixes JSON bodies with a UTF-8 BOM.
        let body = strip_utf8_bom(&bytes);
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| GatewayError::InvalidResponse(format!("malformed response body: {e}")))?;

        RemoteResponse::from_value(value)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("endpoint", &self.inner.endpoint)
            .field("api_login_id", &self.inner.api_login_id)
            .finish_non_exhaustive()
    }
}

fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}
