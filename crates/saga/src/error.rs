//! Saga error taxonomy.
//!
//! Every failure mode of placement and lifecycle is a distinct,
//! inspectable variant; nothing is downgraded to a generic failure.

use common::OrderId;
use domain::{OrderStatus, PricingError, ProductId};
use order_store::StoreError;
use thiserror::Error;

use crate::inventory::{InventoryError, StockChange};

/// Errors that can occur during order placement or lifecycle operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A cart line references a product the inventory service does not
    /// know.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The inventory service refused the decrement for lack of stock.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The inventory service could not be reached or timed out.
    #[error("inventory service unavailable: {0}")]
    InventoryUnavailable(String),

    /// The order store could not be reached or timed out.
    #[error("order store unavailable: {0}")]
    StoreUnavailable(String),

    /// No order exists with the given id.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order was not in the status the transition requires.
    #[error("invalid state transition for order {order_id}: expected {expected}, actual {actual}")]
    InvalidStateTransition {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The order header exists but has no persisted lines. This is a
    /// data-integrity fault, not a valid empty order.
    #[error("order {0} has no persisted lines")]
    OrderLinesMissing(OrderId),

    /// Stock was decremented, persistence failed, and the compensating
    /// restock could not be confirmed within the retry budget. Inventory
    /// is left decremented with no corresponding order: the caller must
    /// treat this as fatal and reconcile manually, never retry it
    /// automatically.
    #[error(
        "compensation failed for order {order_id} after {attempts} attempts: {reason}; \
         stock remains decremented for {items:?}"
    )]
    CompensationFailed {
        order_id: OrderId,
        items: Vec<StockChange>,
        attempts: u32,
        reason: String,
    },
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

impl From<InventoryError> for SagaError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
            } => SagaError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            InventoryError::Unavailable(reason) => SagaError::InventoryUnavailable(reason),
        }
    }
}

impl From<PricingError> for SagaError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ProductNotFound(product_id) => SagaError::ProductNotFound(product_id),
        }
    }
}

impl From<StoreError> for SagaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(order_id) => SagaError::OrderNotFound(order_id),
            StoreError::StatusConflict {
                order_id,
                expected,
                actual,
            } => SagaError::InvalidStateTransition {
                order_id,
                expected,
                actual,
            },
            other => SagaError::StoreUnavailable(other.to_string()),
        }
    }
}
