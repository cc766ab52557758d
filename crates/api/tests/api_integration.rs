//! Integration tests for the API server.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use tower::ServiceExt;

use std::sync::OnceLock;

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

fn setup() -> axum::Router {
    let store = InMemoryOrderStore::new();
    let state = api::create_demo_state(store);
    api::create_app(state, get_metrics_handle())
}

fn order_body(lines: serde_json::Value) -> Body {
    Body::from(
        serde_json::to_string(&serde_json::json!({
            "buyer": {
                "name": "Alice",
                "phone": "555-0100",
                "address": "1 Main St"
            },
            "lines": lines
        }))
        .unwrap(),
    )
}

async fn create_order(app: &axum::Router, lines: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(order_body(lines))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order() {
    let app = setup();

    let (status, json) = create_order(
        &app,
        serde_json::json!([
            { "product_id": "P-100", "quantity": 2 },
            { "product_id": "P-200", "quantity": 1 }
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["order_id"].as_str().is_some());
    assert_eq!(json["status"], "New");
    assert_eq!(json["payment_status"], "Waiting");
    assert_eq!(json["total_cents"], 2500);
    assert_eq!(json["lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_and_get_order() {
    let app = setup();

    let (status, created) = create_order(
        &app,
        serde_json::json!([{ "product_id": "P-100", "quantity": 3 }]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = created["order_id"].as_str().unwrap();

    let get_response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(get_response.into_body(), usize::MAX)
        .await
        .unwrap();
    let order: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(order["order_id"], order_id);
    assert_eq!(order["buyer_name"], "Alice");
    assert_eq!(order["total_cents"], 3000);
    assert_eq!(order["lines"][0]["product_name"], "Widget");
    assert_eq!(order["lines"][0]["subtotal_cents"], 3000);
}

#[tokio::test]
async fn test_create_with_unknown_product() {
    let app = setup();

    let (status, _) = create_order(
        &app,
        serde_json::json!([{ "product_id": "P-999", "quantity": 1 }]),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_insufficient_stock() {
    let app = setup();

    // Demo catalog seeds P-300 with 25 units.
    let (status, _) = create_order(
        &app,
        serde_json::json!([{ "product_id": "P-300", "quantity": 26 }]),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_with_empty_cart() {
    let app = setup();

    let (status, _) = create_order(&app, serde_json::json!([])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_zero_quantity() {
    let app = setup();

    let (status, _) = create_order(
        &app,
        serde_json::json!([{ "product_id": "P-100", "quantity": 0 }]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_client_supplied_id_is_idempotent() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    let body = serde_json::json!({
        "order_id": order_id,
        "buyer": { "name": "Bob", "phone": "555-0101", "address": "2 Side St" },
        "lines": [{ "product_id": "P-200", "quantity": 4 }]
    });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["order_id"], order_id);
        assert_eq!(json["total_cents"], 2000);
    }
}

#[tokio::test]
async fn test_finish_order() {
    let app = setup();

    let (_, created) = create_order(
        &app,
        serde_json::json!([{ "product_id": "P-100", "quantity": 1 }]),
    )
    .await;
    let order_id = created["order_id"].as_str().unwrap();

    let finish_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/finish"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(finish_response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(finish_response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "Finished");

    // Finishing again conflicts.
    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/finish"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_finish_nonexistent_order() {
    let app = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{fake_id}/finish"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{fake_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_with_malformed_id() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/orders/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
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
