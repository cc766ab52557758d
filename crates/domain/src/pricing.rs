//! Price calculation: cart lines + product snapshots → order lines + total.

use common::OrderId;
use thiserror::Error;

use crate::catalog::{CartLine, ProductSnapshot};
use crate::order::OrderLine;
use crate::value_objects::{Money, ProductId};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A cart line references a product with no matching snapshot.
    #[error("no product snapshot for cart line: {0}")]
    ProductNotFound(ProductId),
}

/// The result of pricing a cart: materialized lines and the exact total.
#[derive(Debug, Clone)]
pub struct PricedOrder {
    /// One order line per cart line, in cart order.
    pub lines: Vec<OrderLine>,
    /// Exact sum of line subtotals.
    pub total: Money,
}

/// Prices a cart against the fetched product snapshots.
///
/// Every cart line must match exactly one snapshot; an unmatched line
/// fails with [`PricingError::ProductNotFound`] rather than being
/// skipped, since a skipped line would produce an order whose total
/// does not match its persisted lines.
///
/// Pure apart from generating fresh line ids.
pub fn price_cart(
    order_id: OrderId,
    cart: &[CartLine],
    snapshots: &[ProductSnapshot],
) -> Result<PricedOrder, PricingError> {
    let by_id: std::collections::HashMap<&ProductId, &ProductSnapshot> =
        snapshots.iter().map(|s| (&s.product_id, s)).collect();

    let mut lines = Vec::with_capacity(cart.len());
    let mut total = Money::zero();
    for cart_line in cart {
        let snapshot = by_id
            .get(&cart_line.product_id)
            .ok_or_else(|| PricingError::ProductNotFound(cart_line.product_id.clone()))?;
        let line = OrderLine::from_snapshot(order_id, snapshot, cart_line.quantity);
        total += line.subtotal();
        lines.push(line);
    }

    Ok(PricedOrder { lines, total })
}
