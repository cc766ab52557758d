//! Order placement saga.

use std::collections::HashSet;
use std::time::Duration;

use common::OrderId;
use domain::{Buyer, CartLine, Order, OrderRecord, PricedOrder, ProductId, price_cart};
use order_store::OrderStore;

use crate::error::{Result, SagaError};
use crate::inventory::{InventoryClient, StockChange};
use crate::retry::{RetryPolicy, bounded_inventory_call, bounded_store_call};

/// Tuning knobs for the placement saga.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Upper bound on every remote and store call.
    pub call_timeout: Duration,
    /// Retry budget for the compensating restock.
    pub compensation_retry: RetryPolicy,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            compensation_retry: RetryPolicy::default(),
        }
    }
}

/// Orchestrates order placement across the inventory service and the
/// order store.
///
/// Steps run in a fixed order chosen for failure semantics: snapshot
/// fetch and pricing have no side effects and need no compensation; the
/// stock decrement is the first externally visible effect; persistence
/// comes last so the only partial-failure window needing compensation
/// is "stock decremented, order not stored".
pub struct OrderSaga<S, I> {
    store: S,
    inventory: I,
    config: SagaConfig,
}

impl<S, I> OrderSaga<S, I>
where
    S: OrderStore,
    I: InventoryClient,
{
    /// Creates a saga with default configuration.
    pub fn new(store: S, inventory: I) -> Self {
        Self::with_config(store, inventory, SagaConfig::default())
    }

    /// Creates a saga with explicit configuration.
    pub fn with_config(store: S, inventory: I, config: SagaConfig) -> Self {
        Self {
            store,
            inventory,
            config,
        }
    }

    /// Places an order: resolves snapshots, prices the cart, reserves
    /// stock, persists the order.
    ///
    /// The caller pre-generates `order_id` and must reuse it when
    /// retrying after a transient failure; if the order already exists
    /// the stored record is returned and no step re-executes, so a
    /// retried placement never decrements stock twice.
    #[tracing::instrument(skip(self, buyer, cart), fields(%order_id))]
    pub async fn create_order(
        &self,
        order_id: OrderId,
        buyer: Buyer,
        cart: Vec<CartLine>,
    ) -> Result<OrderRecord> {
        metrics::counter!("order_create_attempts_total").increment(1);
        let start = std::time::Instant::now();

        if let Some(order) = self.find_order(order_id).await? {
            let lines = self.find_lines(order_id).await?;
            tracing::info!(%order_id, "order already placed, returning stored record");
            return Ok(OrderRecord { order, lines });
        }

        // 1-2. Resolve snapshots for the distinct products in the cart.
        let product_ids = distinct_product_ids(&cart);
        let snapshots = bounded_inventory_call(
            self.config.call_timeout,
            "fetch_snapshots",
            self.inventory.fetch_snapshots(&product_ids),
        )
        .await?;

        // 3. Price the cart. An unmatched product fails here, before any
        // side effect.
        let priced = price_cart(order_id, &cart, &snapshots)?;

        // 4. Reserve stock, atomically across the whole cart.
        let items: Vec<StockChange> = cart
            .iter()
            .map(|line| StockChange::new(line.product_id.clone(), line.quantity))
            .collect();
        bounded_inventory_call(
            self.config.call_timeout,
            "decrease_stock",
            self.inventory.decrease_stock(&items),
        )
        .await?;

        // 5. Persist lines, then the header. From here on a failure
        // leaves stock decremented, so it triggers compensation.
        let order = Order::place(order_id, buyer, priced.total);
        if let Err(persist_err) = self.persist(&order, &priced).await {
            tracing::warn!(
                %order_id,
                error = %persist_err,
                "persistence failed after stock decrement, compensating"
            );
            metrics::counter!("order_compensations_total").increment(1);
            if let Err(cleanup_err) = self.remove_lines(order_id).await {
                // Not fatal here: persist clears stale lines before
                // writing, so a retry with this id starts clean anyway.
                tracing::warn!(
                    %order_id,
                    error = %cleanup_err,
                    "could not remove partially persisted lines"
                );
            }
            self.compensate(order_id, &items).await?;
            metrics::counter!("order_create_failures_total").increment(1);
            return Err(persist_err);
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(%order_id, total = %order.total_amount, "order placed");

        Ok(OrderRecord {
            order,
            lines: priced.lines,
        })
    }

    async fn persist(&self, order: &Order, priced: &PricedOrder) -> Result<()> {
        // An earlier attempt with this id may have saved lines and then
        // failed on the header. Clear them first so the persisted lines
        // always match this attempt's pricing and sum to the total.
        self.remove_lines(order.order_id).await?;

        for line in &priced.lines {
            bounded_store_call(
                self.config.call_timeout,
                "save_order_line",
                self.store.save_order_line(line),
            )
            .await?;
        }
        bounded_store_call(
            self.config.call_timeout,
            "save_order",
            self.store.save_order(order),
        )
        .await
    }

    /// Issues the compensating restock for the exact decremented pairs,
    /// retrying transient unavailability with exponential backoff.
    ///
    /// Returns `Ok` once the restock is confirmed (the caller then
    /// surfaces the original persistence error). A definitive refusal or
    /// an exhausted retry budget escalates to `CompensationFailed`:
    /// inventory is decremented with no corresponding order, which only
    /// manual reconciliation can repair.
    async fn compensate(&self, order_id: OrderId, items: &[StockChange]) -> Result<()> {
        let policy = &self.config.compensation_retry;
        let mut last_reason = String::new();

        for attempt in 1..=policy.max_attempts {
            match tokio::time::timeout(self.config.call_timeout, self.inventory.restock(items))
                .await
            {
                Ok(Ok(())) => {
                    tracing::info!(%order_id, attempt, "stock compensation confirmed");
                    return Ok(());
                }
                Ok(Err(crate::inventory::InventoryError::Unavailable(reason))) => {
                    last_reason = reason;
                }
                Ok(Err(definitive)) => {
                    // Not transient; retrying risks double-compensation.
                    last_reason = definitive.to_string();
                    break;
                }
                Err(_) => {
                    last_reason = format!("restock timed out after {:?}", self.config.call_timeout);
                }
            }

            if attempt < policy.max_attempts {
                tracing::warn!(
                    %order_id,
                    attempt,
                    reason = %last_reason,
                    "stock compensation attempt failed, backing off"
                );
                tokio::time::sleep(policy.delay_after(attempt)).await;
            }
        }

        metrics::counter!("order_compensation_failures_total").increment(1);
        tracing::error!(
            %order_id,
            reason = %last_reason,
            "stock compensation could not be confirmed, manual reconciliation required"
        );
        Err(SagaError::CompensationFailed {
            order_id,
            items: items.to_vec(),
            attempts: policy.max_attempts,
            reason: last_reason,
        })
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        bounded_store_call(
            self.config.call_timeout,
            "find_order_by_id",
            self.store.find_order_by_id(order_id),
        )
        .await
    }

    async fn remove_lines(&self, order_id: OrderId) -> Result<()> {
        bounded_store_call(
            self.config.call_timeout,
            "delete_order_lines",
            self.store.delete_order_lines(order_id),
        )
        .await
    }

    async fn find_lines(&self, order_id: OrderId) -> Result<Vec<domain::OrderLine>> {
        bounded_store_call(
            self.config.call_timeout,
            "find_order_lines_by_order_id",
            self.store.find_order_lines_by_order_id(order_id),
        )
        .await
    }
}

fn distinct_product_ids(cart: &[CartLine]) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    cart.iter()
        .filter(|line| seen.insert(line.product_id.clone()))
        .map(|line| line.product_id.clone())
        .collect()
}
