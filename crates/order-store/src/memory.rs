use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderId;
use domain::{Order, OrderLine, OrderStatus};
use tokio::sync::RwLock;

use crate::store::OrderStore;
use crate::{Result, StoreError};

#[derive(Default)]
struct State {
    orders: HashMap<OrderId, Order>,
    lines: Vec<OrderLine>,
    fail_next_save_order: bool,
    fail_next_save_line: bool,
    fail_next_delete_lines: bool,
    unavailable: bool,
}

/// In-memory order store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// failure-injection toggles so saga compensation paths can be
/// exercised deterministically.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored order headers.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored order lines.
    pub async fn line_count(&self) -> usize {
        self.state.read().await.lines.len()
    }

    /// Makes the next `save_order` call fail with `Unavailable`.
    pub async fn fail_next_save_order(&self) {
        self.state.write().await.fail_next_save_order = true;
    }

    /// Makes the next `save_order_line` call fail with `Unavailable`.
    pub async fn fail_next_save_line(&self) {
        self.state.write().await.fail_next_save_line = true;
    }

    /// Makes the next `delete_order_lines` call fail with `Unavailable`.
    pub async fn fail_next_delete_lines(&self) {
        self.state.write().await.fail_next_delete_lines = true;
    }

    /// Makes every operation fail with `Unavailable` until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    fn check_available(state: &State) -> Result<()> {
        if state.unavailable {
            return Err(StoreError::Unavailable("store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        if state.fail_next_save_order {
            state.fail_next_save_order = false;
            return Err(StoreError::Unavailable("injected save_order failure".into()));
        }

        state.orders.insert(order.order_id, order.clone());
        Ok(())
    }

    async fn find_order_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn save_order_line(&self, line: &OrderLine) -> Result<()> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        if state.fail_next_save_line {
            state.fail_next_save_line = false;
            return Err(StoreError::Unavailable(
                "injected save_order_line failure".into(),
            ));
        }

        state.lines.push(line.clone());
        Ok(())
    }

    async fn find_order_lines_by_order_id(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        Ok(state
            .lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn delete_order_lines(&self, order_id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        if state.fail_next_delete_lines {
            state.fail_next_delete_lines = false;
            return Err(StoreError::Unavailable(
                "injected delete_order_lines failure".into(),
            ));
        }

        state.lines.retain(|l| l.order_id != order_id);
        Ok(())
    }

    async fn transition_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        // The write lock makes the read-check-write sequence atomic, so
        // racing transitions on one order serialize here.
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if order.status != expected {
            return Err(StoreError::StatusConflict {
                order_id,
                expected,
                actual: order.status,
            });
        }

        order.status = next;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}
