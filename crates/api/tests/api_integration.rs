//! Integration tests for the order HTTP API.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Money, PartId};
use domain::{InMemoryOrderRepository, OrderRepository, Part};
use events::{ORDER_PAID_TOPIC, OrderPaidEvent};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    InMemoryInventoryClient, InMemoryPaymentClient, InventoryClient, PaymentClient, SagaConfig,
};
use tower::ServiceExt;
use transport::{InMemoryBroker, Producer};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    inventory: InMemoryInventoryClient,
    payment: InMemoryPaymentClient,
    broker: InMemoryBroker,
}

impl TestApp {
    fn new() -> Self {
        let repository: Arc<dyn OrderRepository> = Arc::new(InMemoryOrderRepository::new());
        let inventory = InMemoryInventoryClient::new();
        let payment = InMemoryPaymentClient::new();
        let broker = InMemoryBroker::new();

        let inventory_client: Arc<dyn InventoryClient> = Arc::new(inventory.clone());
        let payment_client: Arc<dyn PaymentClient> = Arc::new(payment.clone());
        let producer: Arc<dyn Producer> = Arc::new(broker.producer(ORDER_PAID_TOPIC));

        let state = api::create_state(
            repository,
            inventory_client,
            payment_client,
            producer,
            SagaConfig {
                call_timeout: Duration::from_millis(100),
            },
        );

        Self {
            router: api::create_app(state, get_metrics_handle()),
            inventory,
            payment,
            broker,
        }
    }

    fn part(&self, cents: i64) -> PartId {
        let id = PartId::new();
        self.inventory
            .add_part(Part::new(id, "part", Money::from_cents(cents)));
        id
    }

    async fn send(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_order(&self, parts: &[PartId]) -> String {
        let part_uuids: Vec<String> = parts.iter().map(ToString::to_string).collect();
        let (status, json) = self
            .send(
                "POST",
                "/api/v1/orders",
                Some(serde_json::json!({
                    "user_uuid": uuid::Uuid::new_v4().to_string(),
                    "part_uuids": part_uuids,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        json["order_uuid"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, json) = app.send("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_order_returns_total() {
    let app = TestApp::new();
    let parts = [app.part(100), app.part(200)];
    let part_uuids: Vec<String> = parts.iter().map(ToString::to_string).collect();

    let (status, json) = app
        .send(
            "POST",
            "/api/v1/orders",
            Some(serde_json::json!({
                "user_uuid": uuid::Uuid::new_v4().to_string(),
                "part_uuids": part_uuids,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_price"], 300);
    assert!(json["order_uuid"].as_str().is_some());
}

#[tokio::test]
async fn test_create_with_missing_part_is_bad_request() {
    let app = TestApp::new();
    let missing = PartId::new();

    let (status, json) = app
        .send(
            "POST",
            "/api/v1/orders",
            Some(serde_json::json!({
                "user_uuid": uuid::Uuid::new_v4().to_string(),
                "part_uuids": [missing.to_string()],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], format!("Part with uuid {missing} not found"));
}

#[tokio::test]
async fn test_create_with_malformed_user_uuid_is_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/orders",
            Some(serde_json::json!({
                "user_uuid": "not-a-uuid",
                "part_uuids": [],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_no_parts_is_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/orders",
            Some(serde_json::json!({
                "user_uuid": uuid::Uuid::new_v4().to_string(),
                "part_uuids": [],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_order() {
    let app = TestApp::new();
    let part = app.part(150);
    let order_uuid = app.create_order(&[part]).await;

    let (status, json) = app
        .send("GET", &format!("/api/v1/orders/{order_uuid}"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order_uuid"], order_uuid);
    assert_eq!(json["status"], "PENDING_PAYMENT");
    assert_eq!(json["payment_method"], "UNKNOWN");
    assert_eq!(json["total_price"], 150);
    assert_eq!(json["part_uuids"][0], part.to_string());
    assert!(json["transaction_uuid"].is_null());
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            "GET",
            &format!("/api/v1/orders/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_with_malformed_uuid() {
    let app = TestApp::new();

    let (status, json) = app.send("GET", "/api/v1/orders/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "order uuid validation error");
}

#[tokio::test]
async fn test_pay_order_publishes_event() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;

    let (status, json) = app
        .send(
            "POST",
            &format!("/api/v1/orders/{order_uuid}/pay"),
            Some(serde_json::json!({ "payment_method": "CARD" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let transaction_uuid = json["transaction_uuid"].as_str().unwrap().to_string();

    let records = app.broker.records(ORDER_PAID_TOPIC).await;
    assert_eq!(records.len(), 1);
    let event = OrderPaidEvent::decode(&records[0].value).unwrap();
    assert_eq!(event.transaction_id.to_string(), transaction_uuid);
    assert_eq!(event.order_id.to_string(), order_uuid);

    let (_, order) = app
        .send("GET", &format!("/api/v1/orders/{order_uuid}"), None)
        .await;
    assert_eq!(order["status"], "PAID");
    assert_eq!(order["payment_method"], "CARD");
    assert_eq!(order["transaction_uuid"], transaction_uuid);
}

#[tokio::test]
async fn test_pay_twice_is_conflict() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;
    let uri = format!("/api/v1/orders/{order_uuid}/pay");
    let body = serde_json::json!({ "payment_method": "SBP" });

    let (first, _) = app.send("POST", &uri, Some(body.clone())).await;
    let (second, _) = app.send("POST", &uri, Some(body)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(app.payment.call_count(), 1);
}

#[tokio::test]
async fn test_pay_with_unknown_method_is_bad_request() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;
    let uri = format!("/api/v1/orders/{order_uuid}/pay");

    let (unknown, _) = app
        .send("POST", &uri, Some(serde_json::json!({ "payment_method": "UNKNOWN" })))
        .await;
    let (garbage, _) = app
        .send("POST", &uri, Some(serde_json::json!({ "payment_method": "BITCOIN" })))
        .await;

    assert_eq!(unknown, StatusCode::BAD_REQUEST);
    assert_eq!(garbage, StatusCode::BAD_REQUEST);
    assert_eq!(app.payment.call_count(), 0);
}

#[tokio::test]
async fn test_slow_payment_times_out() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;
    app.payment.set_delay(Some(Duration::from_secs(5)));

    let (status, json) = app
        .send(
            "POST",
            &format!("/api/v1/orders/{order_uuid}/pay"),
            Some(serde_json::json!({ "payment_method": "CARD" })),
        )
        .await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(json["error"], "request timeout exceeded");
    assert!(app.broker.records(ORDER_PAID_TOPIC).await.is_empty());
}

#[tokio::test]
async fn test_payment_failure_is_internal_error() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;
    app.payment.set_fail_on_pay(true);

    let (status, json) = app
        .send(
            "POST",
            &format!("/api/v1/orders/{order_uuid}/pay"),
            Some(serde_json::json!({ "payment_method": "CARD" })),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "something went wrong");
}

#[tokio::test]
async fn test_cancel_order() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;
    let uri = format!("/api/v1/orders/{order_uuid}/cancel");

    let (first, _) = app.send("POST", &uri, None).await;
    let (second, _) = app.send("POST", &uri, None).await;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::CONFLICT);

    let (_, order) = app
        .send("GET", &format!("/api/v1/orders/{order_uuid}"), None)
        .await;
    assert_eq!(order["status"], "CANCELLED");
}

#[tokio::test]
async fn test_cancel_paid_order_is_conflict() {
    let app = TestApp::new();
    let order_uuid = app.create_order(&[app.part(100)]).await;
    app.send(
        "POST",
        &format!("/api/v1/orders/{order_uuid}/pay"),
        Some(serde_json::json!({ "payment_method": "CARD" })),
    )
    .await;

    let (status, _) = app
        .send("POST", &format!("/api/v1/orders/{order_uuid}/cancel"), None)
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_default_state_serves_demo_catalog() {
    let repository: Arc<dyn OrderRepository> = Arc::new(InMemoryOrderRepository::new());
    let broker = InMemoryBroker::new();
    let state = api::create_default_state(
        repository,
        Arc::new(broker.producer(ORDER_PAID_TOPIC)),
        SagaConfig::default(),
    );
    let router = api::create_app(state, get_metrics_handle());
    let catalog = api::demo_catalog();
    let expected: i64 = catalog.iter().take(2).map(|p| p.price.cents()).sum();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/orders")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "user_uuid": uuid::Uuid::new_v4().to_string(),
                        "part_uuids": [catalog[0].id.to_string(), catalog[1].id.to_string()],
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_price"], expected);
}
