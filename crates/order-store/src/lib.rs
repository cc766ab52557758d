//! Order persistence for the order placement system.
//!
//! The [`OrderStore`] trait is the keyed record store the saga and the
//! lifecycle operate against: save/find an order header by id,
//! save/find/delete order lines by order id, and a compare-and-swap
//! status transition that guarantees exactly one winner when concurrent
//! callers race to move the same order forward.
//!
//! Two implementations are provided:
//! - [`InMemoryOrderStore`] for tests, with failure injection
//! - [`PostgresOrderStore`] backed by sqlx

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
