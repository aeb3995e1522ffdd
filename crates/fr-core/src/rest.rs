//! Exchange REST collaborator.
//!
//! The relay only needs three read-only queries. Implementations must report
//! transport and payload problems as [`RelayError`](crate::error::RelayError) values, never panic, so
//! the enrichment layer can log and degrade.

use async_trait::async_trait;

use crate::error::RelayResult;
use crate::types::{Kline, OrderDetails, PositionDetails};

#[async_trait]
pub trait ExchangeRest: Send + Sync {
    /// Order history for `symbol`, optionally filtered to one `order_id`.
    async fn get_order_history(
        &self,
        category: &str,
        symbol: &str,
        order_id: Option<&str>,
        limit: u32,
    ) -> RelayResult<Vec<OrderDetails>>;

    /// Open positions on `symbol`.
    async fn get_positions(&self, category: &str, symbol: &str) -> RelayResult<Vec<PositionDetails>>;

    /// Most recent `limit` candles. Order of the returned bars is not guaranteed.
    ///
    /// `interval` uses the exchange's notation (minutes, e.g. `"240"`).
    async fn get_kline(&self, category: &str, symbol: &str, interval: &str, limit: u32)
    -> RelayResult<Vec<Kline>>;
}
