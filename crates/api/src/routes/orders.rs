//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{Buyer, CartLine, OrderRecord};
use order_store::OrderStore;
use saga::{InventoryClient, OrderLifecycle, OrderSaga};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, I: InventoryClient> {
    pub saga: OrderSaga<S, I>,
    pub lifecycle: OrderLifecycle<S>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    /// Optional pre-generated order id. Clients that retry a placement
    /// after a transient failure must supply the same id so the retry
    /// cannot decrement stock twice; omitting it trades that safety for
    /// convenience.
    pub order_id: Option<String>,
    pub buyer: BuyerRequest,
    pub lines: Vec<CartLineRequest>,
}

#[derive(Deserialize)]
pub struct BuyerRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct CartLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub buyer_name: String,
    pub status: String,
    pub payment_status: String,
    pub total_cents: i64,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub line_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<OrderRecord> for OrderResponse {
    fn from(record: OrderRecord) -> Self {
        let lines = record
            .lines
            .iter()
            .map(|line| OrderLineResponse {
                line_id: line.line_id.to_string(),
                product_id: line.product_id.to_string(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal().cents(),
            })
            .collect();

        OrderResponse {
            order_id: record.order.order_id.to_string(),
            buyer_name: record.order.buyer.name,
            status: record.order.status.to_string(),
            payment_status: record.order.payment_status.to_string(),
            total_cents: record.order.total_amount.cents(),
            lines,
            created_at: record.order.created_at.to_rfc3339(),
            updated_at: record.order.updated_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order from a cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, I>(
    State(state): State<Arc<AppState<S, I>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError>
where
    S: OrderStore + 'static,
    I: InventoryClient + 'static,
{
    if req.lines.is_empty() {
        return Err(ApiError::BadRequest("cart must not be empty".to_string()));
    }
    if req.lines.iter().any(|line| line.quantity == 0) {
        return Err(ApiError::BadRequest(
            "line quantity must be at least 1".to_string(),
        ));
    }

    let order_id = match req.order_id {
        Some(ref id_str) => parse_order_id(id_str)?,
        None => OrderId::new(),
    };
    let buyer = Buyer::new(req.buyer.name, req.buyer.phone, req.buyer.address);
    let cart: Vec<CartLine> = req
        .lines
        .iter()
        .map(|line| CartLine::new(line.product_id.as_str(), line.quantity))
        .collect();

    let record = state.saga.create_order(order_id, buyer, cart).await?;

    Ok((axum::http::StatusCode::CREATED, Json(record.into())))
}

/// POST /orders/:id/finish — mark an order's fulfillment complete.
#[tracing::instrument(skip(state))]
pub async fn finish<S, I>(
    State(state): State<Arc<AppState<S, I>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + 'static,
    I: InventoryClient + 'static,
{
    let order_id = parse_order_id(&id)?;
    let record = state.lifecycle.finish_order(order_id).await?;
    Ok(Json(record.into()))
}

/// GET /orders/:id — load an order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S, I>(
    State(state): State<Arc<AppState<S, I>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + 'static,
    I: InventoryClient + 'static,
{
    let order_id = parse_order_id(&id)?;

    let order = state
        .store
        .find_order_by_id(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    let lines = state
        .store
        .find_order_lines_by_order_id(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(OrderRecord { order, lines }.into()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
