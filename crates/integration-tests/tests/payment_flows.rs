//! End-to-end card and eCheck payment flows against the mock gateway.

use serde_json::{Value, json};

use pineapple_authnet::{GatewayError, TransactionOrchestrator};
use pineapple_core::{
    CardBrand, CardMetadata, Customer, CustomerId, Email, PaymentMethod, PaymentMethodId,
    PaymentMethodKind, PaymentState, RemoteId,
};
use pineapple_integration_tests::{
    MockGateway, RecordingPaymentMethods, error_response, fifty_dollar_payment, sample_order,
    transaction_ok, usd,
};

fn card_method() -> PaymentMethod {
    let mut method = PaymentMethod::new(PaymentMethodId::new(3), PaymentMethodKind::CreditCard);
    method.remote_id = Some(RemoteId::PaymentProfile("812354079".to_string()));
    method.card = Some(CardMetadata {
        brand: CardBrand::Visa,
        last4: "1111".to_string(),
        expiration_month: 4,
        expiration_year: 2027,
    });
    method
}

fn echeck_method() -> PaymentMethod {
    let mut method = PaymentMethod::new(PaymentMethodId::new(4), PaymentMethodKind::Echeck);
    method.remote_id = Some(RemoteId::composite(
        "COMMON.ACCEPT.INAPP.PAYMENT",
        "echeck-token",
    ));
    method.billing_address = Some(pineapple_integration_tests::sample_address());
    method.reusable = false;
    method
}

fn owner() -> Customer {
    let mut owner = Customer::authenticated(
        CustomerId::new(5),
        Email::parse("shopper@example.com").expect("email"),
    );
    owner.remote_customer_id = Some("39998916".to_string());
    owner
}

fn transaction_request(body: &Value) -> &Value {
    body.pointer("/createTransactionRequest/transactionRequest")
        .expect("transactionRequest block")
}

#[tokio::test]
async fn authorize_only_moves_payment_to_authorization() {
    let gateway = MockGateway::start(vec![transaction_ok("60157186288")]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();

    orchestrator
        .authorize(&mut payment, &card_method(), &owner(), &sample_order(), false)
        .await
        .expect("authorize");

    assert_eq!(payment.state, PaymentState::Authorization);
    assert_eq!(payment.remote_id.as_deref(), Some("60157186288"));

    let requests = gateway.requests();
    let request = transaction_request(requests.first().expect("one request"));
    assert_eq!(request["transactionType"], json!("authOnlyTransaction"));
    assert_eq!(request["amount"], json!("50.00"));
    assert_eq!(request["profile"]["customerProfileId"], json!("39998916"));
    assert_eq!(
        request["profile"]["paymentProfile"]["paymentProfileId"],
        json!("812354079")
    );
}

#[tokio::test]
async fn auth_capture_completes_payment() {
    let gateway = MockGateway::start(vec![transaction_ok("60157186289")]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();

    orchestrator
        .authorize(&mut payment, &card_method(), &owner(), &sample_order(), true)
        .await
        .expect("authorize and capture");

    assert_eq!(payment.state, PaymentState::Completed);
    assert_eq!(payment.remote_id.as_deref(), Some("60157186289"));

    let requests = gateway.requests();
    let request = transaction_request(requests.first().expect("one request"));
    assert_eq!(request["transactionType"], json!("authCaptureTransaction"));
}

#[tokio::test]
async fn request_carries_order_details() {
    let gateway = MockGateway::start(vec![transaction_ok("60157186290")]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();

    let mut order = sample_order();
    order.order_number = None; // fall back to the internal order id
    order.items[0].label = "An exceptionally long product label that overflows".to_string();
    let shipping_address = &mut order.shipment.as_mut().expect("shipment").shipping_address;
    shipping_address.organization = Some(String::new());
    shipping_address.postal_code = None;

    orchestrator
        .authorize(&mut payment, &card_method(), &owner(), &order, true)
        .await
        .expect("authorize");

    let requests = gateway.requests();
    let request = transaction_request(requests.first().expect("one request"));

    assert_eq!(request["order"]["invoiceNumber"], json!("17"));
    assert_eq!(request["customerIP"], json!("203.0.113.7"));
    assert_eq!(request["tax"]["amount"], json!("3.20"));
    assert_eq!(request["shipping"]["amount"], json!("10.80"));

    let name = request["lineItems"]["lineItem"][0]["name"]
        .as_str()
        .expect("line item name");
    assert_eq!(name, "An exceptionally long produc...");
    assert_eq!(name.len(), 31);

    // Empty optional address fields are omitted, not sent as blanks.
    let ship_to = request["shipTo"].as_object().expect("shipTo block");
    assert!(!ship_to.contains_key("company"));
    assert!(!ship_to.contains_key("zip"));
    assert_eq!(ship_to["city"], json!("Portland"));
    assert_eq!(ship_to["address"], json!("123 Main St Apt 4"));
    assert_eq!(ship_to["country"], json!("US"));
}

#[tokio::test]
async fn e00040_decline_deletes_method_and_leaves_payment_untouched() {
    let gateway = MockGateway::start(vec![error_response(
        "E00040",
        "The record cannot be found.",
    )])
    .await;
    let methods = RecordingPaymentMethods::default();
    let orchestrator = TransactionOrchestrator::new(gateway.client(), methods.clone());
    let mut payment = fifty_dollar_payment();
    let method = card_method();

    let err = orchestrator
        .authorize(&mut payment, &method, &owner(), &sample_order(), true)
        .await
        .expect_err("decline");

    assert!(matches!(err, GatewayError::PaymentMethodInvalid));
    assert_eq!(methods.deleted(), vec![method.id]);
    assert_eq!(payment.state, PaymentState::New);
    assert!(payment.remote_id.is_none());
}

#[tokio::test]
async fn generic_decline_is_reported_with_message() {
    let gateway = MockGateway::start(vec![error_response(
        "E00027",
        "The transaction was unsuccessful.",
    )])
    .await;
    let methods = RecordingPaymentMethods::default();
    let orchestrator = TransactionOrchestrator::new(gateway.client(), methods.clone());
    let mut payment = fifty_dollar_payment();

    let err = orchestrator
        .authorize(&mut payment, &card_method(), &owner(), &sample_order(), true)
        .await
        .expect_err("decline");

    match err {
        GatewayError::Declined { code, message } => {
            assert_eq!(code, "E00027");
            assert_eq!(message, "The transaction was unsuccessful.");
        }
        other => panic!("expected Declined, got {other:?}"),
    }
    assert!(methods.deleted().is_empty());
    assert_eq!(payment.state, PaymentState::New);
}

#[tokio::test]
async fn hard_errors_reclassify_as_hard_decline() {
    let response = json!({
        "transactionResponse": {
            "errors": [{"errorCode": "2", "errorText": "This transaction has been declined."}]
        },
        "messages": {
            "resultCode": "Error",
            "message": [{"code": "E00027", "text": "The transaction was unsuccessful."}]
        }
    });
    let gateway = MockGateway::start(vec![response]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();

    let err = orchestrator
        .authorize(&mut payment, &card_method(), &owner(), &sample_order(), true)
        .await
        .expect_err("hard decline");

    assert!(
        matches!(err, GatewayError::HardDecline(text) if text == "This transaction has been declined.")
    );
    assert_eq!(payment.state, PaymentState::New);
}

#[tokio::test]
async fn authorize_guards_source_state() {
    let gateway = MockGateway::start(vec![]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();
    payment.state = PaymentState::Completed;

    let err = orchestrator
        .authorize(&mut payment, &card_method(), &owner(), &sample_order(), true)
        .await
        .expect_err("state guard");

    assert!(matches!(err, GatewayError::InvalidState { .. }));
    assert_eq!(payment.state, PaymentState::Completed);
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn echeck_submission_parks_payment_in_pending() {
    let gateway = MockGateway::start(vec![transaction_ok("40012345678")]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();

    orchestrator
        .submit_echeck(&mut payment, &echeck_method(), &sample_order())
        .await
        .expect("submit echeck");

    assert_eq!(payment.state, PaymentState::Pending);
    assert_eq!(payment.remote_id.as_deref(), Some("40012345678"));

    let requests = gateway.requests();
    let request = transaction_request(requests.first().expect("one request"));
    assert_eq!(request["transactionType"], json!("authCaptureTransaction"));
    assert_eq!(
        request["payment"]["opaqueData"]["dataDescriptor"],
        json!("COMMON.ACCEPT.INAPP.PAYMENT")
    );
    assert_eq!(
        request["payment"]["opaqueData"]["dataValue"],
        json!("echeck-token")
    );
    assert_eq!(request["billTo"]["firstName"], json!("Ada"));
}

#[tokio::test]
async fn echeck_capture_and_void_are_local_only() {
    let gateway = MockGateway::start(vec![]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());

    let mut captured = fifty_dollar_payment();
    captured.state = PaymentState::Pending;
    orchestrator
        .capture_echeck(&mut captured, None)
        .expect("capture");
    assert_eq!(captured.state, PaymentState::Completed);

    let mut voided = fifty_dollar_payment();
    voided.state = PaymentState::Pending;
    orchestrator.void_echeck(&mut voided).expect("void");
    assert_eq!(voided.state, PaymentState::Voided);

    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn full_refund_marks_payment_refunded() {
    let gateway = MockGateway::start(vec![transaction_ok("70011112222")]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();
    payment.state = PaymentState::Completed;
    payment.remote_id = Some("60157186288".to_string());

    orchestrator
        .refund(&mut payment, &card_method(), &sample_order(), None)
        .await
        .expect("refund");

    assert_eq!(payment.state, PaymentState::Refunded);
    assert_eq!(payment.refunded_amount, usd("50.00"));

    let requests = gateway.requests();
    let request = transaction_request(requests.first().expect("one request"));
    assert_eq!(request["transactionType"], json!("refundTransaction"));
    assert_eq!(request["amount"], json!("50.00"));
    assert_eq!(request["refTransId"], json!("60157186288"));
    assert_eq!(request["payment"]["creditCard"]["cardNumber"], json!("1111"));
    assert_eq!(
        request["payment"]["creditCard"]["expirationDate"],
        json!("0427")
    );
}

#[tokio::test]
async fn partial_refund_sequence_accumulates_and_caps() {
    let gateway = MockGateway::start(vec![
        transaction_ok("70011112223"),
        transaction_ok("70011112224"),
    ])
    .await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let method = card_method();
    let order = sample_order();

    let mut payment = fifty_dollar_payment();
    payment.state = PaymentState::Completed;
    payment.remote_id = Some("60157186288".to_string());

    orchestrator
        .refund(&mut payment, &method, &order, Some(usd("20.00")))
        .await
        .expect("partial refund");
    assert_eq!(payment.state, PaymentState::PartiallyRefunded);
    assert_eq!(payment.refunded_amount, usd("20.00"));

    orchestrator
        .refund(&mut payment, &method, &order, Some(usd("30.00")))
        .await
        .expect("second refund");
    assert_eq!(payment.state, PaymentState::Refunded);
    assert_eq!(payment.refunded_amount, usd("50.00"));

    let before = gateway.requests().len();
    let err = orchestrator
        .refund(&mut payment, &method, &order, Some(usd("0.01")))
        .await
        .expect_err("exceeding refund");
    assert!(matches!(err, GatewayError::RefundExceedsAmount { .. }));
    assert_eq!(payment.refunded_amount, usd("50.00"));
    assert_eq!(payment.state, PaymentState::Refunded);
    assert_eq!(gateway.requests().len(), before);
}

#[tokio::test]
async fn refund_exceeding_remaining_amount_is_rejected_before_submission() {
    let gateway = MockGateway::start(vec![transaction_ok("70011112225")]).await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let method = card_method();
    let order = sample_order();

    let mut payment = fifty_dollar_payment();
    payment.state = PaymentState::Completed;
    payment.remote_id = Some("60157186288".to_string());

    orchestrator
        .refund(&mut payment, &method, &order, Some(usd("20.00")))
        .await
        .expect("partial refund");

    let before = gateway.requests().len();
    let err = orchestrator
        .refund(&mut payment, &method, &order, Some(usd("30.01")))
        .await
        .expect_err("exceeding refund");
    assert!(matches!(err, GatewayError::RefundExceedsAmount { .. }));
    assert_eq!(payment.refunded_amount, usd("20.00"));
    assert_eq!(payment.state, PaymentState::PartiallyRefunded);
    assert_eq!(gateway.requests().len(), before);
}

#[tokio::test]
async fn refund_decline_leaves_refunded_amount_unchanged() {
    let gateway = MockGateway::start(vec![error_response(
        "E00027",
        "The referenced transaction does not meet the criteria for issuing a credit.",
    )])
    .await;
    let orchestrator =
        TransactionOrchestrator::new(gateway.client(), RecordingPaymentMethods::default());
    let mut payment = fifty_dollar_payment();
    payment.state = PaymentState::Completed;
    payment.remote_id = Some("60157186288".to_string());

    let err = orchestrator
        .refund(&mut payment, &card_method(), &sample_order(), None)
        .await
        .expect_err("refund decline");

    assert!(matches!(err, GatewayError::Declined { .. }));
    assert!(payment.refunded_amount.is_zero());
    assert_eq!(payment.state, PaymentState::Completed);
}
