//! Shared identifier types for the order placement system.
//!
//! Identifiers are UUIDv4-backed: globally unique, generated without any
//! coordination or database round-trip, and safe to create concurrently.

pub mod ids;

pub use ids::{LineId, OrderId};
