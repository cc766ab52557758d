//! Inventory client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Money, ProductId, ProductSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stock adjustment for one product: the unit of both the decrement
/// request at placement and the restock request during compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    /// The product whose stock changes.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: u32,
}

impl StockChange {
    /// Creates a new stock change.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Errors reported by the inventory collaborator.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Not enough stock to satisfy a decrement.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The inventory service could not be reached or timed out.
    #[error("inventory service unavailable: {0}")]
    Unavailable(String),
}

/// Remote capability contract against the inventory service.
///
/// `decrease_stock` must be atomic across the requested set on the
/// remote side: either every pair is decremented or none is. The order
/// core never observes a partial decrement as success.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Looks up product snapshots for the given ids. Unknown ids are
    /// simply absent from the result.
    async fn fetch_snapshots(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>, InventoryError>;

    /// Decrements stock for every pair, atomically across the set.
    async fn decrease_stock(&self, items: &[StockChange]) -> Result<(), InventoryError>;

    /// Re-adds previously decremented stock. Compensation only.
    async fn restock(&self, items: &[StockChange]) -> Result<(), InventoryError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, (ProductSnapshot, u32)>,
    restock_calls: Vec<Vec<StockChange>>,
    decrease_calls: u32,
    unavailable: bool,
    fail_restock_times: u32,
}

/// In-memory inventory client for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates a new in-memory inventory client with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product with the given unit price and stock level.
    pub fn with_product(
        self,
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        unit_price: Money,
        stock: u32,
    ) -> Self {
        let product_id = product_id.into();
        let snapshot = ProductSnapshot::new(
            product_id.clone(),
            product_name,
            format!("{product_id}.png"),
            unit_price,
        );
        self.state
            .write()
            .unwrap()
            .products
            .insert(product_id, (snapshot, stock));
        self
    }

    /// Returns the current stock level for a product.
    pub fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .products
            .get(product_id)
            .map(|(_, stock)| *stock)
    }

    /// Returns every restock request received, in call order.
    pub fn restock_calls(&self) -> Vec<Vec<StockChange>> {
        self.state.read().unwrap().restock_calls.clone()
    }

    /// Returns how many decrement requests were received.
    pub fn decrease_call_count(&self) -> u32 {
        self.state.read().unwrap().decrease_calls
    }

    /// Makes every call fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Makes the next `n` restock calls fail with `Unavailable`.
    pub fn fail_restock_times(&self, n: u32) {
        self.state.write().unwrap().fail_restock_times = n;
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn fetch_snapshots(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>, InventoryError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(InventoryError::Unavailable("inventory marked down".into()));
        }

        Ok(product_ids
            .iter()
            .filter_map(|id| state.products.get(id).map(|(snapshot, _)| snapshot.clone()))
            .collect())
    }

    async fn decrease_stock(&self, items: &[StockChange]) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();
        if state.unavailable {
            return Err(InventoryError::Unavailable("inventory marked down".into()));
        }
        state.decrease_calls += 1;

        // Aggregate per product first: a cart may carry several lines
        // for the same product, and each must count against the same
        // stock. Validate the aggregates before touching anything, so a
        // failed request leaves no partial decrement behind.
        let mut requested: HashMap<&ProductId, u32> = HashMap::new();
        for item in items {
            let total = requested.entry(&item.product_id).or_insert(0);
            *total = total.saturating_add(item.quantity);
        }

        for (&product_id, &quantity) in &requested {
            let available = state
                .products
                .get(product_id)
                .map(|(_, stock)| *stock)
                .unwrap_or(0);
            if available < quantity {
                return Err(InventoryError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: quantity,
                    available,
                });
            }
        }

        let requested: Vec<(ProductId, u32)> = requested
            .into_iter()
            .map(|(id, quantity)| (id.clone(), quantity))
            .collect();
        for (product_id, quantity) in requested {
            if let Some((_, stock)) = state.products.get_mut(&product_id) {
                *stock -= quantity;
            }
        }
        Ok(())
    }

    async fn restock(&self, items: &[StockChange]) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();
        if state.unavailable {
            return Err(InventoryError::Unavailable("inventory marked down".into()));
        }
        if state.fail_restock_times > 0 {
            state.fail_restock_times -= 1;
            return Err(InventoryError::Unavailable(
                "injected restock failure".into(),
            ));
        }

        state.restock_calls.push(items.to_vec());
        for item in items {
            if let Some((_, stock)) = state.products.get_mut(&item.product_id) {
                *stock += item.quantity;
            }
        }
        Ok(())
    }
}
