//! Settled-batch reconciliation against the mock gateway.

use chrono::NaiveDate;
use serde_json::{Value, json};

use pineapple_authnet::SettlementReconciler;
use pineapple_core::{OrderId, Payment, PaymentId, PaymentState};
use pineapple_integration_tests::{FixedPayments, MockGateway, error_response, usd};

fn window() -> (chrono::NaiveDateTime, chrono::NaiveDateTime) {
    let from = NaiveDate::from_ymd_opt(2026, 8, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("from date");
    let to = NaiveDate::from_ymd_opt(2026, 8, 7)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .expect("to date");
    (from, to)
}

fn pending_echeck(id: i32, remote_id: &str) -> Payment {
    let mut payment = Payment::new(PaymentId::new(id), OrderId::new(id), usd("25.00"));
    payment.state = PaymentState::Pending;
    payment.remote_id = Some(remote_id.to_string());
    payment
}

fn batch_list_response(batch: Value) -> Value {
    json!({
        "batchList": {"batch": batch},
        "messages": {"resultCode": "Ok", "message": [{"code": "I00001", "text": "Successful."}]}
    })
}

fn transaction_list_response(transaction: Value, total: i64) -> Value {
    json!({
        "transactions": {"transaction": transaction},
        "totalNumInResultSet": total,
        "messages": {"resultCode": "Ok", "message": [{"code": "I00001", "text": "Successful."}]}
    })
}

#[tokio::test]
async fn scalar_and_list_shapes_yield_the_same_settled_set() {
    let (from, to) = window();
    let pending = vec![pending_echeck(1, "40000000001")];

    // Scalar shapes: one batch, one transaction.
    let scalar_gateway = MockGateway::start(vec![
        batch_list_response(json!({
            "batchId": "101",
            "settlementState": "settledSuccessfully",
            "paymentMethod": "eCheck"
        })),
        transaction_list_response(json!({"transId": "40000000001"}), 1),
    ])
    .await;
    let scalar = SettlementReconciler::new(
        scalar_gateway.client(),
        FixedPayments::with(pending.clone()),
    )
    .settled_echeck_payments(from, to)
    .await
    .expect("scalar shapes");

    // List shapes: three batches (two filtered out), transaction list.
    let list_gateway = MockGateway::start(vec![
        batch_list_response(json!([
            {"batchId": "101", "settlementState": "settledSuccessfully", "paymentMethod": "eCheck"},
            {"batchId": "102", "settlementState": "settledSuccessfully", "paymentMethod": "creditCard"},
            {"batchId": "103", "settlementState": "settlementError", "paymentMethod": "eCheck"}
        ])),
        transaction_list_response(json!([{"transId": "40000000001"}]), 1),
    ])
    .await;
    let list = SettlementReconciler::new(list_gateway.client(), FixedPayments::with(pending))
        .settled_echeck_payments(from, to)
        .await
        .expect("list shapes");

    let scalar_ids: Vec<_> = scalar.iter().map(|p| p.id).collect();
    let list_ids: Vec<_> = list.iter().map(|p| p.id).collect();
    assert_eq!(scalar_ids, list_ids);
    assert_eq!(scalar_ids, vec![PaymentId::new(1)]);
}

#[tokio::test]
async fn non_echeck_and_unsettled_batches_are_not_queried() {
    let (from, to) = window();
    let gateway = MockGateway::start(vec![batch_list_response(json!([
        {"batchId": "201", "settlementState": "settledSuccessfully", "paymentMethod": "creditCard"},
        {"batchId": "202", "settlementState": "settlementError", "paymentMethod": "eCheck"}
    ]))])
    .await;

    let settled = SettlementReconciler::new(gateway.client(), FixedPayments::default())
        .settled_echeck_payments(from, to)
        .await
        .expect("no matching batches");

    assert!(settled.is_empty());
    // Only the batch-list query went out; no per-batch transaction lists.
    assert_eq!(gateway.requests().len(), 1);
}

#[tokio::test]
async fn transaction_ids_flatten_across_batches() {
    let (from, to) = window();
    let gateway = MockGateway::start(vec![
        batch_list_response(json!([
            {"batchId": "301", "settlementState": "settledSuccessfully", "paymentMethod": "eCheck"},
            {"batchId": "302", "settlementState": "settledSuccessfully", "paymentMethod": "eCheck"}
        ])),
        transaction_list_response(json!([{"transId": "40000000010"}, {"transId": "40000000011"}]), 2),
        transaction_list_response(json!({"transId": "40000000012"}), 1),
    ])
    .await;

    let pending = vec![
        pending_echeck(1, "40000000010"),
        pending_echeck(2, "40000000011"),
        pending_echeck(3, "40000000012"),
        // Still awaiting settlement; must not be returned.
        pending_echeck(4, "40000000099"),
    ];
    let settled = SettlementReconciler::new(gateway.client(), FixedPayments::with(pending))
        .settled_echeck_payments(from, to)
        .await
        .expect("flattened ids");

    let ids: Vec<_> = settled.iter().map(|p| p.id).collect();
    assert_eq!(
        ids,
        vec![PaymentId::new(1), PaymentId::new(2), PaymentId::new(3)]
    );

    // Batch list + one transaction list per settled eCheck batch.
    assert_eq!(gateway.requests().len(), 3);
    let requests = gateway.requests();
    let batch_request = requests
        .first()
        .and_then(|r| r.get("getSettledBatchListRequest"))
        .expect("batch list request");
    assert_eq!(batch_request["includeStatistics"], json!(false));
    assert_eq!(
        batch_request["firstSettlementDate"],
        json!("2026-08-01T00:00:00")
    );
    assert_eq!(
        batch_request["lastSettlementDate"],
        json!("2026-08-07T23:59:59")
    );
    assert_eq!(
        requests
            .get(1)
            .and_then(|r| r.pointer("/getTransactionListRequest/batchId")),
        Some(&json!("301"))
    );
}

#[tokio::test]
async fn failed_batch_query_yields_empty_result() {
    let (from, to) = window();
    let gateway = MockGateway::start(vec![error_response(
        "E00003",
        "An error occurred while parsing the request.",
    )])
    .await;

    let settled = SettlementReconciler::new(
        gateway.client(),
        FixedPayments::with(vec![pending_echeck(1, "40000000001")]),
    )
    .settled_echeck_payments(from, to)
    .await
    .expect("degrades to empty");

    assert!(settled.is_empty());
}

#[tokio::test]
async fn settled_transactions_without_local_match_return_nothing() {
    let (from, to) = window();
    let gateway = MockGateway::start(vec![
        batch_list_response(json!({
            "batchId": "401",
            "settlementState": "settledSuccessfully",
            "paymentMethod": "eCheck"
        })),
        transaction_list_response(json!({"transId": "49999999999"}), 1),
    ])
    .await;

    // A completed payment with that id must not come back as pending.
    let mut completed = pending_echeck(9, "49999999999");
    completed.state = PaymentState::Completed;

    let settled = SettlementReconciler::new(gateway.client(), FixedPayments::with(vec![completed]))
        .settled_echeck_payments(from, to)
        .await
        .expect("no pending matches");

    assert!(settled.is_empty());
}
