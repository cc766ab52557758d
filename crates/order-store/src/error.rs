use common::OrderId;
use domain::OrderStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or timed out.
    #[error("order store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A conditional status update lost: the stored status did not match
    /// the expected one. Exactly one of several racing transitions on
    /// the same order observes success; the rest observe this.
    #[error("status conflict for order {order_id}: expected {expected}, actual {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// A stored record could not be decoded into a domain value.
    #[error("invalid stored record for order {order_id}: {detail}")]
    InvalidRecord { order_id: OrderId, detail: String },
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
