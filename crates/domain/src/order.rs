//! The persisted order model and its status state machines.

use chrono::{DateTime, Utc};
use common::{LineId, OrderId};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductSnapshot;
use crate::value_objects::{Buyer, Money, ProductId};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// New ──► Finished
/// ```
///
/// `Finished` is terminal. Further statuses (cancellation etc.) would
/// extend this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been placed, stock reserved, awaiting fulfillment.
    #[default]
    New,

    /// Order fulfillment is complete (terminal state).
    Finished,
}

impl OrderStatus {
    /// Returns true if the order can be finished from this status.
    pub fn can_finish(&self) -> bool {
        matches!(self, OrderStatus::New)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Finished)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Finished => "Finished",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(OrderStatus::New),
            "Finished" => Ok(OrderStatus::Finished),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Payment settlement status of an order.
///
/// Order placement only ever writes `Waiting`; the transition to `Paid`
/// belongs to the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment has not been settled.
    #[default]
    Waiting,

    /// Payment has been settled.
    Paid,
}

impl PaymentStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Waiting => "Waiting",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Waiting" => Ok(PaymentStatus::Waiting),
            "Paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// One persisted line of an order.
///
/// Created exactly once at placement time and immutable thereafter.
/// Snapshot fields are copied explicitly so the line stays a
/// point-in-time record, independent of later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Unique line identifier.
    pub line_id: LineId,
    /// The order this line belongs to.
    pub order_id: OrderId,
    /// The product ordered.
    pub product_id: ProductId,
    /// Product name at placement time.
    pub product_name: String,
    /// Product icon at placement time.
    pub product_icon: String,
    /// Price per unit at placement time.
    pub unit_price: Money,
    /// Units ordered.
    pub quantity: u32,
}

impl OrderLine {
    /// Materializes a line from a product snapshot and a cart quantity.
    ///
    /// Every copied field is named here; there is no reflective bulk
    /// copy between snapshot and line.
    pub fn from_snapshot(order_id: OrderId, snapshot: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            line_id: LineId::new(),
            order_id,
            product_id: snapshot.product_id.clone(),
            product_name: snapshot.product_name.clone(),
            product_icon: snapshot.product_icon.clone(),
            unit_price: snapshot.unit_price,
            quantity,
        }
    }

    /// Returns this line's subtotal (`unit_price * quantity`, exact).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The persisted order header.
///
/// Invariant: `total_amount` equals the sum of the order's line
/// subtotals at the moment of creation and is never recomputed, even if
/// product prices change later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, supplied by the caller at placement.
    pub order_id: OrderId,
    /// Buyer identity.
    pub buyer: Buyer,
    /// Sum of line subtotals at creation time.
    pub total_amount: Money,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment settlement status.
    pub payment_status: PaymentStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status-change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a freshly placed order header: status `New`, payment
    /// `Waiting`, both timestamps set to now.
    pub fn place(order_id: OrderId, buyer: Buyer, total_amount: Money) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            buyer,
            total_amount,
            status: OrderStatus::New,
            payment_status: PaymentStatus::Waiting,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A reconstructed order: header plus its persisted lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// The order header.
    pub order: Order,
    /// The order's lines.
    pub lines: Vec<OrderLine>,
}
