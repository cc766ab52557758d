//! HTTP API server for the order placement system.
//!
//! Exposes order placement and lifecycle over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::Money;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use saga::{InMemoryInventoryClient, InventoryClient, OrderLifecycle, OrderSaga};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, I>(state: Arc<AppState<S, I>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    I: InventoryClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, I>))
        .route("/orders/{id}", get(routes::orders::get::<S, I>))
        .route("/orders/{id}/finish", post(routes::orders::finish::<S, I>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state from a store and an inventory client.
pub fn create_state<S, I>(store: S, inventory: I) -> Arc<AppState<S, I>>
where
    S: OrderStore + Clone + 'static,
    I: InventoryClient + Clone + 'static,
{
    Arc::new(AppState {
        saga: OrderSaga::new(store.clone(), inventory),
        lifecycle: OrderLifecycle::new(store.clone()),
        store,
    })
}

/// Creates application state backed by an in-memory inventory client
/// seeded with a small demo catalog.
pub fn create_demo_state<S>(store: S) -> Arc<AppState<S, InMemoryInventoryClient>>
where
    S: OrderStore + Clone + 'static,
{
    let inventory = InMemoryInventoryClient::new()
        .with_product("P-100", "Widget", Money::from_cents(1000), 100)
        .with_product("P-200", "Gadget", Money::from_cents(500), 50)
        .with_product("P-300", "Sprocket", Money::from_cents(2599), 25);

    create_state(store, inventory)
}
