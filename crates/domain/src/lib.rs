//! Domain layer for the order placement system.
//!
//! This crate provides the order data model and the pure pieces of the
//! placement flow:
//! - Value objects (`ProductId`, `Money`, `Buyer`)
//! - Catalog inputs (`ProductSnapshot`, `CartLine`)
//! - The persisted order model (`Order`, `OrderLine`) with its status
//!   state machines
//! - Price calculation (`pricing::price_cart`)

pub mod catalog;
pub mod order;
pub mod pricing;
pub mod value_objects;

pub use catalog::{CartLine, ProductSnapshot};
pub use order::{Order, OrderLine, OrderRecord, OrderStatus, PaymentStatus};
pub use pricing::{PricedOrder, PricingError, price_cart};
pub use value_objects::{Buyer, Money, ProductId};
