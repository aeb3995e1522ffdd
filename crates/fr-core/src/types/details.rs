//! Enrichment payloads returned by the exchange REST collaborator.
//!
//! Every field is optional: an order without SL/TP, or a lookup that failed,
//! is represented by the `Default` (empty) value, which is itself cacheable.

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of an order from order history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// Empty for a negative (not found) result.
    pub order_id: String,
    pub order_status: Option<String>,
    /// `None` when unset on the exchange.
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub closed_pnl: Option<f64>,
}

impl OrderDetails {
    pub fn is_empty(&self) -> bool {
        self.order_id.is_empty()
            && self.order_status.is_none()
            && self.stop_loss.is_none()
            && self.take_profit.is_none()
            && self.closed_pnl.is_none()
    }
}

/// Current position on one (category, symbol).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionDetails {
    pub side: Option<String>,
    pub size: Option<f64>,
    pub avg_price: Option<f64>,
    pub unrealised_pnl: Option<f64>,
    pub cum_realised_pnl: Option<f64>,
}

impl PositionDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One OHLC bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    /// Bar open time, ms since epoch.
    pub start_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}
