use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderLine, OrderStatus};

use crate::Result;

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (`Send + Sync`). Individual
/// operations are atomic; multi-record atomicity across `save_order_line`
/// and `save_order` is deliberately not promised — the saga owns
/// compensation when placement fails partway through persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order header.
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Looks up an order header by id.
    async fn find_order_by_id(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Persists a single order line.
    async fn save_order_line(&self, line: &OrderLine) -> Result<()>;

    /// Returns all lines belonging to an order, in insertion order.
    async fn find_order_lines_by_order_id(&self, order_id: OrderId) -> Result<Vec<OrderLine>>;

    /// Removes every line belonging to an order.
    ///
    /// Used to clear lines left behind when placement fails between
    /// `save_order_line` and `save_order`. Removing lines of an order
    /// that has none is not an error.
    async fn delete_order_lines(&self, order_id: OrderId) -> Result<()>;

    /// Conditionally moves an order from `expected` to `next` status.
    ///
    /// The check and the write are applied as one atomic step: when
    /// concurrent callers race on the same order, exactly one succeeds
    /// and the others fail with [`StoreError::StatusConflict`]. Updates
    /// `updated_at` and returns the stored header after the transition.
    ///
    /// [`StoreError::StatusConflict`]: crate::StoreError::StatusConflict
    async fn transition_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order>;
}
