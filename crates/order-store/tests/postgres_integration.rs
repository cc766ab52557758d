//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::OrderId;
use domain::{Buyer, Money, Order, OrderLine, OrderStatus, ProductSnapshot};
use order_store::{OrderStore, PostgresOrderStore, StoreError};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_orders_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresOrderStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE orders, order_lines")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderStore::new(pool)
}

fn sample_order() -> Order {
    Order::place(
        OrderId::new(),
        Buyer::new("Alice", "555-1234", "1 Main St"),
        Money::from_cents(2500),
    )
}

fn sample_line(order_id: OrderId, product: &str, cents: i64, quantity: u32) -> OrderLine {
    let snapshot = ProductSnapshot::new(
        product,
        format!("product {product}"),
        format!("{product}.png"),
        Money::from_cents(cents),
    );
    OrderLine::from_snapshot(order_id, &snapshot, quantity)
}

#[tokio::test]
async fn test_save_and_find_order_roundtrip() {
    let store = get_test_store().await;
    let order = sample_order();

    store.save_order(&order).await.unwrap();

    let found = store
        .find_order_by_id(order.order_id)
        .await
        .unwrap()
        .expect("order should exist");

    assert_eq!(found.order_id, order.order_id);
    assert_eq!(found.buyer, order.buyer);
    assert_eq!(found.total_amount, order.total_amount);
    assert_eq!(found.status, OrderStatus::New);
    assert_eq!(found.payment_status, domain::PaymentStatus::Waiting);
}

#[tokio::test]
async fn test_find_missing_order_returns_none() {
    let store = get_test_store().await;
    assert!(
        store
            .find_order_by_id(OrderId::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_lines_roundtrip_in_insertion_order() {
    let store = get_test_store().await;
    let order_id = OrderId::new();

    let first = sample_line(order_id, "P1", 1000, 2);
    let second = sample_line(order_id, "P2", 500, 1);
    store.save_order_line(&first).await.unwrap();
    store.save_order_line(&second).await.unwrap();

    // A line for a different order must not leak in.
    store
        .save_order_line(&sample_line(OrderId::new(), "P3", 300, 1))
        .await
        .unwrap();

    let lines = store.find_order_lines_by_order_id(order_id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], first);
    assert_eq!(lines[1], second);
}

#[tokio::test]
async fn test_delete_order_lines_only_touches_that_order() {
    let store = get_test_store().await;
    let order_a = OrderId::new();
    let order_b = OrderId::new();

    store
        .save_order_line(&sample_line(order_a, "P1", 1000, 2))
        .await
        .unwrap();
    store
        .save_order_line(&sample_line(order_a, "P2", 500, 1))
        .await
        .unwrap();
    store
        .save_order_line(&sample_line(order_b, "P3", 300, 1))
        .await
        .unwrap();

    store.delete_order_lines(order_a).await.unwrap();

    assert!(
        store
            .find_order_lines_by_order_id(order_a)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        store
            .find_order_lines_by_order_id(order_b)
            .await
            .unwrap()
            .len(),
        1
    );

    // Deleting with nothing left is fine.
    store.delete_order_lines(order_a).await.unwrap();
}

#[tokio::test]
async fn test_transition_status_single_winner() {
    let store = get_test_store().await;
    let order = sample_order();
    store.save_order(&order).await.unwrap();

    let updated = store
        .transition_status(order.order_id, OrderStatus::New, OrderStatus::Finished)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Finished);

    let err = store
        .transition_status(order.order_id, OrderStatus::New, OrderStatus::Finished)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StatusConflict {
            actual: OrderStatus::Finished,
            ..
        }
    ));
}

#[tokio::test]
async fn test_transition_status_missing_order() {
    let store = get_test_store().await;
    let err = store
        .transition_status(OrderId::new(), OrderStatus::New, OrderStatus::Finished)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn test_concurrent_transitions_one_wins() {
    let store = Arc::new(get_test_store().await);
    let order = sample_order();
    store.save_order(&order).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        let order_id = order.order_id;
        handles.push(tokio::spawn(async move {
            store
                .transition_status(order_id, OrderStatus::New, OrderStatus::Finished)
                .await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(StoreError::StatusConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 3);
}
