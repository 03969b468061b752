//! HTTP surface, driven through the router with `oneshot`.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::{FundingMode, Harness, S1_FILE, incoming, ufx_doc, ufx_file};
use settlements_processor::gateway::{self, AppState};
use settlements_processor::health::HealthHandle;
use settlements_processor::payment::{
    PaymentError, PaymentEvent, PaymentId, PaymentInstruction, PaymentStatus,
};
use settlements_processor::provider::outbound_channel;
use settlements_processor::queue::MessageQueue;
use settlements_processor::store::{CurrencyReport, InstructionStore, Report, UpdateOutcome};
use settlements_processor::usecase::MakePayment;

fn app(harness: &Harness, health: HealthHandle) -> Router {
    let state = AppState::new(
        harness.store.clone(),
        harness.make_payment.clone(),
        harness.replay.clone(),
        health,
    )
    .with_dead_letter_queue(harness.dead_letters.clone());
    gateway::router(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json)
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create(app: &Router, body: String) -> PaymentId {
    let (status, json) = send(app, "POST", "/payments", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_str().unwrap().parse().unwrap()
}

async fn fetch(app: &Router, id: PaymentId) -> PaymentInstruction {
    let (status, json) = send(app, "GET", &format!("/payments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(json).unwrap()
}

fn body(mid: &str, amount: &str, iso_code: &str) -> String {
    serde_json::to_string(&incoming(mid, amount, iso_code)).unwrap()
}

#[tokio::test]
async fn s3_bad_currency_is_stored_rejected() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());

    let id = create(&app, body("9001", "10", "wfwgwef")).await;
    let instruction = fetch(&app, id).await;
    assert_eq!(instruction.status, PaymentStatus::Rejected);
    assert_eq!(instruction.domain_failure_reason_code(), "INVALID_CURRENCY");
    // nothing handed to a provider
    assert!(harness.drain_outbound().await.is_empty());
}

#[tokio::test]
async fn s4_duplicate_of_successful_returns_first_id() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());

    let first = create(&app, body("9001", "10", "EUR")).await;
    let outcome = harness
        .store
        .update_payment(first, PaymentStatus::Successful, PaymentEvent::processing_succeeded())
        .await
        .unwrap();
    assert!(outcome.is_applied());

    let second = create(&app, body("9001", "10", "EUR")).await;
    assert_eq!(second, first);
    assert_eq!(harness.store.len().await, 1);
}

#[tokio::test]
async fn s5_failed_instruction_can_be_resubmitted() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());

    let first = create(&app, body("9001", "10", "EUR")).await;
    harness
        .store
        .update_payment(first, PaymentStatus::Failed, PaymentEvent::processing_failed(None))
        .await
        .unwrap();

    let second = create(&app, body("9001", "10", "EUR")).await;
    assert_ne!(second, first);
    assert_eq!(fetch(&app, second).await.status, PaymentStatus::Received);
    assert_eq!(fetch(&app, first).await.status, PaymentStatus::Failed);
    assert_eq!(harness.store.len().await, 2);
}

#[tokio::test]
async fn invalid_json_and_unknown_ids() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());

    let (status, json) = send(&app, "POST", "/payments", Some("{not json".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_PARAMETER");

    // well-formed JSON missing required fields
    let (status, _) = send(&app, "POST", "/payments", Some("{}".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&app, "GET", &format!("/payments/{}", PaymentId::new()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, _) = send(&app, "GET", "/payments/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reports_bucket_by_execution_day() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());

    let ok = create(&app, body("1", "10.50", "EUR")).await;
    create(&app, body("2", "4.50", "EUR")).await;
    create(&app, body("3", "100", "ISK")).await;
    create(&app, body("4", "1", "nope")).await;
    harness
        .store
        .update_payment(ok, PaymentStatus::Successful, PaymentEvent::processing_succeeded())
        .await
        .unwrap();

    let (status, json) = send(&app, "GET", "/payments/report/2021-06-30", None).await;
    assert_eq!(status, StatusCode::OK);
    let report: Report = serde_json::from_value(json).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.count(PaymentStatus::Received), 2);
    assert_eq!(report.count(PaymentStatus::Successful), 1);
    assert_eq!(report.count(PaymentStatus::Rejected), 1);
    assert_eq!(report.failed_payments.get("INVALID_CURRENCY"), Some(&1));

    let (status, json) = send(&app, "GET", "/payments/currencies-report/2021-06-30", None).await;
    assert_eq!(status, StatusCode::OK);
    let currencies: CurrencyReport = serde_json::from_value(json).unwrap();
    let eur = &currencies.currencies["EUR"];
    assert_eq!(eur.total, 2);
    assert_eq!(eur.successful, 1);
    assert_eq!(eur.total_amount.to_string(), "15.00");
    assert_eq!(eur.successful_amount.to_string(), "10.50");

    // another day is empty, not missing
    let (status, json) = send(&app, "GET", "/payments/report/2021-07-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);

    let (status, json) = send(&app, "GET", "/payments/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["date"].is_string());

    let (status, _) = send(&app, "GET", "/payments/currencies-report", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/payments/report/30-06-2021", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn merchant_lookup_by_day() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());
    let id = create(&app, body("9001", "10", "EUR")).await;

    let (status, json) = send(&app, "GET", "/mid/9001/2021-06-30", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id.to_string());

    let (status, _) = send(&app, "GET", "/mid/9001/2021-07-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/mid/9999/2021-06-30", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dead_letter_queue_inspection() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());
    harness.dead_letters.send("{}").await.unwrap();
    harness.dead_letters.send("not json").await.unwrap();

    let (status, json) = send(&app, "GET", "/internal/dead-letter-queues/ufx-notifications-dlq", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["messages"][0]["body"], "{}");
    assert_eq!(json["messages"][1]["body"], "not json");
    // inspection does not consume
    assert_eq!(harness.dead_letters.len().await, 2);

    let (status, _) = send(&app, "GET", "/internal/dead-letter-queues/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replay_endpoint() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());
    harness
        .put_file(
            S1_FILE,
            &ufx_file(
                "SAXO",
                &[ufx_doc("1", "978", "10", &[]), ufx_doc("2", "840", "20", &[])],
            ),
        )
        .await;

    let (status, _) = send(&app, "POST", "/replay-payment?action=pay_currency_from_file&currency=EUR", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/replay-payment?action=pay_currency_from_file&currency=XYZ&file={S1_FILE}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/replay-payment?action=pay_currency_from_file&currency=EUR&file=missing",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/replay-payment?action=pay_currency_from_file&currency=EUR&file={S1_FILE}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["decoded"], 1);
    assert_eq!(json["submitted"].as_array().unwrap().len(), 1);
    let rows = harness.store.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].incoming_instruction.payment.currency.iso_code, "EUR");
}

#[tokio::test]
async fn health_check_serves_last_sweep() {
    let harness = Harness::new(FundingMode::Sufficient);
    let sweeper = harness.sweeper();
    let app = app(&harness, sweeper.handle());

    let (status, json) = send(&app, "GET", "/health_check", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["healthy"], false);

    sweeper.sweep().await;
    let (status, json) = send(&app, "GET", "/health_check", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dependencies"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let harness = Harness::new(FundingMode::Sufficient);
    let app = app(&harness, harness.sweeper().handle());
    let (status, json) = send(&app, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/payments"].is_object());
}

/// Store whose every call fails with a transient error
struct UnavailableStore;

#[async_trait]
impl InstructionStore for UnavailableStore {
    async fn store(&self, _: &PaymentInstruction) -> Result<PaymentInstruction, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn update_payment(
        &self,
        _: PaymentId,
        _: PaymentStatus,
        _: PaymentEvent,
    ) -> Result<UpdateOutcome, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn get(&self, _: PaymentId) -> Result<PaymentInstruction, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn get_by_correlation_id(&self, _: &str) -> Result<Vec<PaymentInstruction>, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn get_by_merchant_for_day(
        &self,
        _: &str,
        _: NaiveDate,
    ) -> Result<PaymentInstruction, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn report_for(&self, _: NaiveDate) -> Result<Report, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn currency_report_for(&self, _: NaiveDate) -> Result<CurrencyReport, PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }

    async fn ping(&self) -> Result<(), PaymentError> {
        Err(PaymentError::Transient("connection reset".into()))
    }
}

#[tokio::test]
async fn store_failure_is_internal_error() {
    let harness = Harness::new(FundingMode::Sufficient);
    let store: Arc<dyn InstructionStore> = Arc::new(UnavailableStore);
    let (tx, _rx) = outbound_channel(8);
    let state = AppState::new(
        store.clone(),
        Arc::new(MakePayment::new(store, tx)),
        harness.replay.clone(),
        harness.sweeper().handle(),
    );
    let app = gateway::router(Arc::new(state));

    let (status, json) = send(&app, "POST", "/payments", Some(body("9001", "10", "EUR"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // details stay in the log
    assert_eq!(json["msg"], "internal error");

    let (status, _) = send(&app, "GET", "/payments/report/2021-06-30", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
