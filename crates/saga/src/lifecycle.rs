//! Order lifecycle: status transitions after placement.

use std::time::Duration;

use common::OrderId;
use domain::{OrderRecord, OrderStatus};
use order_store::OrderStore;

use crate::error::{Result, SagaError};
use crate::retry::bounded_store_call;

/// Governs an order's status after creation.
///
/// The only transition defined today is `New → Finished`. The
/// check-and-write is applied as a compare-and-swap at the store, so
/// two concurrent finishes on one order id cannot both observe `New`
/// and both succeed: exactly one wins, the other fails with
/// [`SagaError::InvalidStateTransition`].
#[derive(Clone)]
pub struct OrderLifecycle<S> {
    store: S,
    call_timeout: Duration,
}

impl<S: OrderStore> OrderLifecycle<S> {
    /// Creates a lifecycle with the default call timeout.
    pub fn new(store: S) -> Self {
        Self::with_timeout(store, Duration::from_secs(5))
    }

    /// Creates a lifecycle with an explicit call timeout.
    pub fn with_timeout(store: S, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    /// Marks an order's fulfillment complete: `New → Finished`.
    ///
    /// An order with zero persisted lines is a data-integrity fault and
    /// is rejected before any write, so a failed finish never mutates
    /// status. Marks fulfillment of the order record only, not payment
    /// settlement.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn finish_order(&self, order_id: OrderId) -> Result<OrderRecord> {
        let order = bounded_store_call(
            self.call_timeout,
            "find_order_by_id",
            self.store.find_order_by_id(order_id),
        )
        .await?
        .ok_or(SagaError::OrderNotFound(order_id))?;

        if !order.status.can_finish() {
            metrics::counter!("order_finish_failures_total").increment(1);
            return Err(SagaError::InvalidStateTransition {
                order_id,
                expected: OrderStatus::New,
                actual: order.status,
            });
        }

        let lines = bounded_store_call(
            self.call_timeout,
            "find_order_lines_by_order_id",
            self.store.find_order_lines_by_order_id(order_id),
        )
        .await?;
        if lines.is_empty() {
            metrics::counter!("order_finish_failures_total").increment(1);
            tracing::error!(%order_id, "order header has no persisted lines");
            return Err(SagaError::OrderLinesMissing(order_id));
        }

        // CAS at the store: a concurrent finish that got here first
        // makes this call fail with a status conflict.
        let finished = bounded_store_call(
            self.call_timeout,
            "transition_status",
            self.store
                .transition_status(order_id, OrderStatus::New, OrderStatus::Finished),
        )
        .await?;

        metrics::counter!("orders_finished_total").increment(1);
        tracing::info!(%order_id, "order finished");

        Ok(OrderRecord {
            order: finished,
            lines,
        })
    }
}
