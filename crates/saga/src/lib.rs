//! Order placement saga and lifecycle state machine.
//!
//! Placing an order spans two independent failure domains: the remote
//! inventory service (stock decrement) and the local order store
//! (persistence). There is no shared transaction across them, so
//! placement runs as a saga:
//!
//! 1. Fetch product snapshots for the cart
//! 2. Price the cart (exact, integer-cent arithmetic)
//! 3. Decrement stock, atomically across the whole cart
//! 4. Persist order lines, then the order header
//!
//! If persistence fails after the decrement committed, the saga issues a
//! compensating restock with bounded exponential-backoff retries; an
//! unconfirmable compensation surfaces loudly as
//! [`SagaError::CompensationFailed`].
//!
//! After creation, [`OrderLifecycle`] owns status transitions; the only
//! one defined today is `New → Finished`, applied as a compare-and-swap
//! at the store so concurrent finishes have exactly one winner.

pub mod coordinator;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod retry;

pub use coordinator::{OrderSaga, SagaConfig};
pub use error::{Result, SagaError};
pub use inventory::{InMemoryInventoryClient, InventoryClient, InventoryError, StockChange};
pub use lifecycle::OrderLifecycle;
pub use retry::RetryPolicy;
