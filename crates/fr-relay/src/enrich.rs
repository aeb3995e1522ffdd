//! Cached, failure-tolerant enrichment lookups.
//!
//! Wraps an [`ExchangeRest`] collaborator with two TTL caches:
//!
//! - order details keyed by order ID (long TTL; SL/TP rarely change once placed)
//! - position details keyed by `(category, symbol)` (short TTL; PnL moves constantly)
//!
//! No lookup here returns an error. REST failures are logged at warn and
//! degrade to empty details / `None`, and the empty result is cached so a
//! failing order or symbol is not hammered within the TTL window.

use std::sync::Arc;

use fr_core::cache::{CacheLimits, TtlCache};
use fr_core::error::RelayResult;
use fr_core::rest::ExchangeRest;
use fr_core::types::{Category, ExecutionEvent, OrderDetails, PositionDetails};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::indicator::{self, DEFAULT_RSI_LENGTH, RSI_BARS, RSI_INTERVAL};
use crate::links;

/// Page size for order-history queries.
const ORDER_HISTORY_LIMIT: u32 = 50;

/// Category assumed for order lookups when the event carried none.
const DEFAULT_ORDER_CATEGORY: &str = "linear";

#[derive(Debug, Clone, Copy)]
pub struct EnrichmentConfig {
    pub order_cache: CacheLimits,
    pub position_cache: CacheLimits,
    /// Link to the testnet web UI instead of production.
    pub testnet: bool,
}

/// Everything the message needs beyond the raw event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub order: OrderDetails,
    pub position: PositionDetails,
    /// 4h RSI, when enough history was available.
    pub momentum: Option<f64>,
    pub exchange_link: String,
    pub chart_link: String,
}

/// How an order is located in history. Tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderLookup {
    /// History filtered server-side by order ID.
    ById,
    /// Unfiltered recent history, scanned for the order ID.
    Scan,
}

impl OrderLookup {
    const STAGES: [OrderLookup; 2] = [OrderLookup::ById, OrderLookup::Scan];
}

pub struct EnrichmentClient {
    rest: Arc<dyn ExchangeRest>,
    orders: Mutex<TtlCache<String, OrderDetails>>,
    positions: Mutex<TtlCache<(String, String), PositionDetails>>,
    testnet: bool,
}

impl EnrichmentClient {
    pub fn new(rest: Arc<dyn ExchangeRest>, config: EnrichmentConfig) -> Self {
        Self {
            rest,
            orders: Mutex::new(TtlCache::new(config.order_cache)),
            positions: Mutex::new(TtlCache::new(config.position_cache)),
            testnet: config.testnet,
        }
    }

    /// Gather order, position, momentum and links for one execution.
    pub async fn enrich(&self, ev: &ExecutionEvent) -> Enrichment {
        let order = if !ev.order_id.is_empty() && !ev.category.is_empty() {
            self.get_order_details(&ev.category, &ev.symbol, &ev.order_id).await
        } else {
            OrderDetails::default()
        };
        let position = self.get_position_details(&ev.category, &ev.symbol).await;
        let momentum = if ev.category.is_empty() {
            None
        } else {
            self.get_momentum_indicator(&ev.category, &ev.symbol, DEFAULT_RSI_LENGTH).await
        };

        Enrichment {
            order,
            position,
            momentum,
            exchange_link: self.make_exchange_link(&ev.category, &ev.symbol),
            chart_link: self.make_chart_link(&ev.symbol),
        }
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// SL/TP snapshot for `order_id`. Empty when the ID is empty, the order
    /// cannot be found, or every lookup stage failed.
    pub async fn get_order_details(&self, category: &Category, symbol: &str, order_id: &str) -> OrderDetails {
        if order_id.is_empty() {
            return OrderDetails::default();
        }
        if let Some(hit) = self.orders.lock().get(&order_id.to_string()) {
            debug!("[enrich] order {order_id} cache hit");
            return hit;
        }

        let category = if category.is_empty() { DEFAULT_ORDER_CATEGORY } else { category.as_str() };
        let details = self.locate_order(category, symbol, order_id).await.unwrap_or_default();
        if details.is_empty() {
            debug!("[enrich] order {order_id} not found, caching empty result");
        }
        self.orders.lock().put(order_id.to_string(), details.clone());
        details
    }

    /// Run the lookup stages in order until one finds the order.
    async fn locate_order(&self, category: &str, symbol: &str, order_id: &str) -> Option<OrderDetails> {
        for stage in OrderLookup::STAGES {
            match self.lookup_order(stage, category, symbol, order_id).await {
                Ok(Some(found)) => return Some(found),
                Ok(None) => debug!("[enrich] order {order_id}: no match via {stage:?}"),
                Err(e) => warn!("[enrich] order {order_id} lookup via {stage:?} failed: {e}"),
            }
        }
        None
    }

    async fn lookup_order(
        &self,
        stage: OrderLookup,
        category: &str,
        symbol: &str,
        order_id: &str,
    ) -> RelayResult<Option<OrderDetails>> {
        match stage {
            OrderLookup::ById => {
                let list = self.rest.get_order_history(category, symbol, Some(order_id), ORDER_HISTORY_LIMIT).await?;
                Ok(list.into_iter().next())
            }
            OrderLookup::Scan => {
                let list = self.rest.get_order_history(category, symbol, None, ORDER_HISTORY_LIMIT).await?;
                Ok(list.into_iter().find(|o| o.order_id == order_id))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    /// Current position on `(category, symbol)`. Only derivatives have one;
    /// other categories return empty details without a REST call.
    pub async fn get_position_details(&self, category: &Category, symbol: &str) -> PositionDetails {
        if !category.has_positions() || symbol.is_empty() || symbol == "—" {
            return PositionDetails::default();
        }
        let key = (category.as_str().to_string(), symbol.to_string());
        if let Some(hit) = self.positions.lock().get(&key) {
            return hit;
        }

        let details = match self.rest.get_positions(category.as_str(), symbol).await {
            Ok(list) => pick_position(list),
            Err(e) => {
                warn!("[enrich] position {category}/{symbol} lookup failed: {e}");
                PositionDetails::default()
            }
        };
        self.positions.lock().put(key, details.clone());
        details
    }

    // -----------------------------------------------------------------------
    // Momentum
    // -----------------------------------------------------------------------

    /// RSI(`length`) on 4h candles; `None` on insufficient history or any error.
    pub async fn get_momentum_indicator(&self, category: &Category, symbol: &str, length: usize) -> Option<f64> {
        match self.rest.get_kline(category.as_str(), symbol, RSI_INTERVAL, RSI_BARS).await {
            Ok(bars) => {
                let n = bars.len();
                let value = indicator::rsi_from_klines(bars, length);
                if value.is_none() {
                    debug!("[enrich] {category}/{symbol}: {n} bars, not enough for RSI({length})");
                }
                value
            }
            Err(e) => {
                warn!("[enrich] kline {category}/{symbol} failed: {e}");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    pub fn make_exchange_link(&self, category: &Category, symbol: &str) -> String {
        links::exchange_link(self.testnet, category, symbol)
    }

    pub fn make_chart_link(&self, symbol: &str) -> String {
        links::chart_link(symbol)
    }
}

/// Prefer an open leg (non-zero size) in hedge mode, else the first entry.
fn pick_position(list: Vec<PositionDetails>) -> PositionDetails {
    let open = list.iter().position(|p| p.size.is_some_and(|s| s != 0.0));
    match open {
        Some(i) => list.into_iter().nth(i).unwrap_or_default(),
        None => list.into_iter().next().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{MockRest, order, rising_klines};

    fn config() -> EnrichmentConfig {
        EnrichmentConfig {
            order_cache: CacheLimits { max_items: 100, ttl: Duration::from_secs(3600) },
            position_cache: CacheLimits { max_items: 100, ttl: Duration::from_secs(15) },
            testnet: false,
        }
    }

    fn client(rest: MockRest) -> (Arc<MockRest>, EnrichmentClient) {
        let rest = Arc::new(rest);
        let client = EnrichmentClient::new(rest.clone(), config());
        (rest, client)
    }

    #[tokio::test]
    async fn empty_order_id_short_circuits() {
        let (rest, c) = client(MockRest::default());
        assert!(c.get_order_details(&Category::Linear, "BTCUSDT", "").await.is_empty());
        assert!(rest.calls().is_empty());
    }

    #[tokio::test]
    async fn found_by_id_and_cached() {
        let (rest, c) = client(MockRest {
            by_id: vec![order("o-1", Some(90.0), Some(130.0))],
            ..Default::default()
        });
        let d = c.get_order_details(&Category::Linear, "BTCUSDT", "o-1").await;
        assert_eq!(d.stop_loss, Some(90.0));
        let again = c.get_order_details(&Category::Linear, "BTCUSDT", "o-1").await;
        assert_eq!(again, d);
        assert_eq!(rest.calls(), vec!["orders:linear:BTCUSDT:o-1"]);
    }

    #[tokio::test]
    async fn falls_back_to_scan_when_filtered_query_fails() {
        let (rest, c) = client(MockRest {
            by_id_fails: true,
            history: vec![order("other", None, None), order("o-2", Some(1.0), Some(3.0))],
            ..Default::default()
        });
        let d = c.get_order_details(&Category::Linear, "BTCUSDT", "o-2").await;
        assert_eq!(d.order_id, "o-2");
        assert_eq!(d.take_profit, Some(3.0));
        assert_eq!(rest.calls(), vec!["orders:linear:BTCUSDT:o-2", "orders:linear:BTCUSDT:*"]);
    }

    #[tokio::test]
    async fn falls_back_to_scan_when_filtered_query_is_empty() {
        let (rest, c) = client(MockRest {
            history: vec![order("o-3", Some(5.0), None)],
            ..Default::default()
        });
        let d = c.get_order_details(&Category::Inverse, "BTCUSD", "o-3").await;
        assert_eq!(d.stop_loss, Some(5.0));
        assert_eq!(rest.count("orders:"), 2);
    }

    #[tokio::test]
    async fn not_found_is_negatively_cached() {
        let (rest, c) = client(MockRest {
            history_fails: true,
            ..Default::default()
        });
        assert!(c.get_order_details(&Category::Linear, "BTCUSDT", "ghost").await.is_empty());
        assert!(c.get_order_details(&Category::Linear, "BTCUSDT", "ghost").await.is_empty());
        assert_eq!(rest.count("orders:"), 2);
    }

    #[tokio::test]
    async fn missing_category_defaults_to_linear() {
        let (rest, c) = client(MockRest::default());
        c.get_order_details(&Category::Other(String::new()), "BTCUSDT", "o-9").await;
        assert_eq!(rest.calls()[0], "orders:linear:BTCUSDT:o-9");
    }

    #[tokio::test]
    async fn positions_only_for_derivatives() {
        let (rest, c) = client(MockRest {
            positions: vec![PositionDetails { unrealised_pnl: Some(2.5), ..Default::default() }],
            ..Default::default()
        });
        assert!(c.get_position_details(&Category::Spot, "BTCUSDT").await.is_empty());
        assert!(c.get_position_details(&Category::Linear, "").await.is_empty());
        assert!(rest.calls().is_empty());

        let p = c.get_position_details(&Category::Linear, "BTCUSDT").await;
        assert_eq!(p.unrealised_pnl, Some(2.5));
        c.get_position_details(&Category::Linear, "BTCUSDT").await;
        assert_eq!(rest.count("positions:"), 1);
    }

    #[tokio::test]
    async fn position_failure_degrades_and_is_cached() {
        let (rest, c) = client(MockRest {
            positions_fail: true,
            ..Default::default()
        });
        assert!(c.get_position_details(&Category::Linear, "ETHUSDT").await.is_empty());
        assert!(c.get_position_details(&Category::Linear, "ETHUSDT").await.is_empty());
        assert_eq!(rest.count("positions:"), 1);
    }

    #[test]
    fn hedge_mode_prefers_open_leg() {
        let flat = PositionDetails { size: Some(0.0), side: Some("Buy".into()), ..Default::default() };
        let open = PositionDetails { size: Some(1.0), side: Some("Sell".into()), ..Default::default() };
        assert_eq!(pick_position(vec![flat.clone(), open.clone()]), open);
        assert_eq!(pick_position(vec![flat.clone()]), flat);
        assert!(pick_position(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn momentum_from_candles() {
        let (rest, c) = client(MockRest {
            klines: rising_klines(30),
            ..Default::default()
        });
        assert_eq!(c.get_momentum_indicator(&Category::Linear, "BTCUSDT", 14).await, Some(100.0));
        assert_eq!(rest.calls(), vec!["kline:linear:BTCUSDT:240"]);
    }

    #[tokio::test]
    async fn momentum_none_on_error_or_short_history() {
        let (_, c) = client(MockRest {
            klines_fail: true,
            ..Default::default()
        });
        assert_eq!(c.get_momentum_indicator(&Category::Linear, "BTCUSDT", 14).await, None);

        let (_, c) = client(MockRest {
            klines: rising_klines(15),
            ..Default::default()
        });
        assert_eq!(c.get_momentum_indicator(&Category::Linear, "BTCUSDT", 14).await, None);
    }
}
