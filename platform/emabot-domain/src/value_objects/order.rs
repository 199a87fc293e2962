use crate::value_objects::side::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Margin,
    Rejected,
}

impl OrderStatus {
    /// True once the order can no longer change.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Canceled
                | OrderStatus::Margin
                | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Submitted => "submitted",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Margin => "margin",
            OrderStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: u64,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub timestamp: i64,
    pub status: OrderStatus,
    /// Identifier returned by an external brokerage, when the order was routed.
    pub broker_ref: Option<String>,
}

/// Status change notification delivered to the strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub status: OrderStatus,
    pub quantity: f64,
    pub executed_price: Option<f64>,
    pub commission: f64,
    pub timestamp: i64,
    pub reason: Option<String>,
}

impl OrderUpdate {
    pub fn from_order(order: &Order, timestamp: i64) -> Self {
        Self {
            order_id: order.id,
            symbol: order.symbol.clone(),
            side: order.side,
            status: order.status,
            quantity: order.quantity,
            executed_price: None,
            commission: 0.0,
            timestamp,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
