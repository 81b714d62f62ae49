//! Integration tests for Pineapple Payments.
//!
//! # Test Categories
//!
//! - `payment_flows` - Card authorize/capture/refund and eCheck flows
//! - `profiles` - Customer/payment profile creation and recovery paths
//! - `settlement` - Settled-batch reconciliation
//!
//! The tests run the real gateway components against [`MockGateway`], an
//! in-process HTTP server that serves scripted JSON responses and records
//! every request body for wire-shape assertions. No network access and no
//! gateway credentials are required.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::State, routing::post};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use pineapple_authnet::repository::{
    PaymentMethodRepository, PaymentRepository, RepositoryError,
};
use pineapple_authnet::{GatewayClient, GatewayConfig};
use pineapple_core::{
    Address, CurrencyCode, Order, OrderId, OrderItem, OrderItemId, Payment, PaymentId,
    PaymentMethodId, PaymentState, Price,
};

/// An in-process gateway double.
///
/// Serves the scripted responses in order, one per request, and records
/// request bodies. Unscripted requests get a generic error response so a
/// test that under-scripts fails loudly instead of hanging.
pub struct MockGateway {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockGateway {
    /// Start a mock gateway that will serve `responses` in order.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(responses: Vec<Value>) -> Self {
        let state = MockState {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/", post(serve_scripted_response))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock gateway");
        let addr = listener.local_addr().expect("mock gateway local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock gateway");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Gateway configuration pointing at this mock.
    #[must_use]
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig {
            api_login_id: "test-login".to_string(),
            transaction_key: SecretString::from("5KP3u95vRz4B2jmc"),
            endpoint: format!("http://{}/", self.addr),
            timeout: Duration::from_secs(5),
        }
    }

    /// A client wired to this mock.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client fails to build.
    #[must_use]
    pub fn client(&self) -> GatewayClient {
        GatewayClient::new(&self.config()).expect("build gateway client")
    }

    /// Request bodies received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the request log mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve_scripted_response(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.requests.lock().expect("requests lock").push(body);
    let response = state
        .responses
        .lock()
        .expect("responses lock")
        .pop_front()
        .unwrap_or_else(|| {
            json!({
                "messages": {
                    "resultCode": "Error",
                    "message": [{"code": "E00001", "text": "Unscripted request."}]
                }
            })
        });
    Json(response)
}

// =============================================================================
// Host-storage doubles
// =============================================================================

/// Records payment-method deletions.
#[derive(Clone, Default)]
pub struct RecordingPaymentMethods {
    deleted: Arc<Mutex<Vec<PaymentMethodId>>>,
}

impl RecordingPaymentMethods {
    /// IDs deleted so far.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn deleted(&self) -> Vec<PaymentMethodId> {
        self.deleted.lock().expect("deleted lock").clone()
    }
}

impl PaymentMethodRepository for RecordingPaymentMethods {
    async fn delete(&self, id: PaymentMethodId) -> Result<(), RepositoryError> {
        self.deleted.lock().expect("deleted lock").push(id);
        Ok(())
    }
}

/// A fixed set of local payments to reconcile against.
#[derive(Clone, Default)]
pub struct FixedPayments {
    payments: Arc<Mutex<Vec<Payment>>>,
}

impl FixedPayments {
    /// A store seeded with the given payments.
    #[must_use]
    pub fn with(payments: Vec<Payment>) -> Self {
        Self {
            payments: Arc::new(Mutex::new(payments)),
        }
    }
}

impl PaymentRepository for FixedPayments {
    async fn find_pending_echeck(
        &self,
        remote_ids: &[String],
    ) -> Result<Vec<Payment>, RepositoryError> {
        Ok(self
            .payments
            .lock()
            .expect("payments lock")
            .iter()
            .filter(|payment| {
                payment.state == PaymentState::Pending
                    && payment
                        .remote_id
                        .as_ref()
                        .is_some_and(|id| remote_ids.contains(id))
            })
            .cloned()
            .collect())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A USD price from a decimal string.
///
/// # Panics
///
/// Panics on a malformed decimal string.
#[must_use]
pub fn usd(amount: &str) -> Price {
    Price::new(amount.parse().expect("decimal literal"), CurrencyCode::USD)
}

/// An order with one line item, tax, shipping and a shipping address.
#[must_use]
pub fn sample_order() -> Order {
    Order {
        id: OrderId::new(17),
        order_number: Some("2026-0042".to_string()),
        ip_address: Some("203.0.113.7".to_string()),
        items: vec![OrderItem {
            id: OrderItemId::new(9),
            label: "Organic Pineapple".to_string(),
            quantity: 2,
            unit_price: usd("18.00"),
        }],
        tax_total: usd("3.20"),
        shipping_total: usd("10.80"),
        shipment: Some(pineapple_core::Shipment {
            shipping_address: sample_address(),
        }),
    }
}

/// A complete US address.
#[must_use]
pub fn sample_address() -> Address {
    Address {
        given_name: "Ada".to_string(),
        family_name: "Lovelace".to_string(),
        organization: None,
        address_line1: "123 Main St".to_string(),
        address_line2: Some("Apt 4".to_string()),
        locality: Some("Portland".to_string()),
        administrative_area: Some("OR".to_string()),
        postal_code: Some("97201".to_string()),
        country_code: "US".to_string(),
    }
}

/// A `New` $50.00 payment.
#[must_use]
pub fn fifty_dollar_payment() -> Payment {
    Payment::new(PaymentId::new(1), OrderId::new(17), usd("50.00"))
}

/// A successful `createTransaction` response carrying `trans_id`.
#[must_use]
pub fn transaction_ok(trans_id: &str) -> Value {
    json!({
        "transactionResponse": {
            "responseCode": "1",
            "transId": trans_id,
            "accountNumber": "XXXX1111"
        },
        "messages": {
            "resultCode": "Ok",
            "message": [{"code": "I00001", "text": "Successful."}]
        }
    })
}

/// An error response with a single message.
#[must_use]
pub fn error_response(code: &str, text: &str) -> Value {
    json!({
        "messages": {
            "resultCode": "Error",
            "message": [{"code": code, "text": text}]
        }
    })
}

/// A comma-delimited validation response with `brand` at the card-type
/// offset used by the legacy direct-response format.
#[must_use]
pub fn validation_response(brand: &str) -> String {
    let mut fields = vec![String::new(); 55];
    if let Some(slot) = fields.get_mut(51) {
        brand.clone_into(slot);
    }
    fields.join(",")
}
