//! Catalog-facing input types: product snapshots and cart lines.

use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, ProductId};

/// Point-in-time copy of a product as reported by the inventory service.
///
/// Snapshots are fetched once per placement and never persisted by this
/// core; the order line copies the fields it needs at creation time, so
/// the order stays a fixed record even if the catalog changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// The product identifier.
    pub product_id: ProductId,
    /// Human-readable product name.
    pub product_name: String,
    /// Product icon URL.
    pub product_icon: String,
    /// Price per unit at fetch time.
    pub unit_price: Money,
}

impl ProductSnapshot {
    /// Creates a new product snapshot.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        product_icon: impl Into<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            product_icon: product_icon.into(),
            unit_price,
        }
    }
}

/// One entry of a buyer's cart: a product reference and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product being ordered.
    pub product_id: ProductId,
    /// Units ordered, at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}
