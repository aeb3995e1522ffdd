//! In-crate test doubles for the REST and notification collaborators.

use async_trait::async_trait;
use fr_core::error::{RelayError, RelayResult};
use fr_core::rest::ExchangeRest;
use fr_core::types::{Kline, OrderDetails, PositionDetails};
use parking_lot::Mutex;

use crate::notify::Notifier;

/// Scripted exchange. Each query kind either fails or returns its canned list.
#[derive(Default)]
pub struct MockRest {
    /// Answer to a history query filtered by order ID.
    pub by_id: Vec<OrderDetails>,
    pub by_id_fails: bool,
    /// Answer to the unfiltered history query.
    pub history: Vec<OrderDetails>,
    pub history_fails: bool,
    pub positions: Vec<PositionDetails>,
    pub positions_fail: bool,
    pub klines: Vec<Kline>,
    pub klines_fail: bool,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl MockRest {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

fn scripted<T: Clone>(fails: bool, value: &[T]) -> RelayResult<Vec<T>> {
    if fails { Err(RelayError::Http("connection reset".into())) } else { Ok(value.to_vec()) }
}

#[async_trait]
impl ExchangeRest for MockRest {
    async fn get_order_history(
        &self,
        category: &str,
        symbol: &str,
        order_id: Option<&str>,
        _limit: u32,
    ) -> RelayResult<Vec<OrderDetails>> {
        match order_id {
            Some(id) => {
                self.record(format!("orders:{category}:{symbol}:{id}"));
                scripted(self.by_id_fails, &self.by_id)
            }
            None => {
                self.record(format!("orders:{category}:{symbol}:*"));
                scripted(self.history_fails, &self.history)
            }
        }
    }

    async fn get_positions(&self, category: &str, symbol: &str) -> RelayResult<Vec<PositionDetails>> {
        self.record(format!("positions:{category}:{symbol}"));
        scripted(self.positions_fail, &self.positions)
    }

    async fn get_kline(&self, category: &str, symbol: &str, interval: &str, _limit: u32) -> RelayResult<Vec<Kline>> {
        self.record(format!("kline:{category}:{symbol}:{interval}"));
        scripted(self.klines_fail, &self.klines)
    }
}

/// Captures every dispatched text; fails for texts containing `fail_marker`.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail_marker: Option<String>,
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> RelayResult<()> {
        if self.fail_marker.as_deref().is_some_and(|m| text.contains(m)) {
            return Err(RelayError::Notify("400 Bad Request".into()));
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }
}

pub fn order(id: &str, sl: Option<f64>, tp: Option<f64>) -> OrderDetails {
    OrderDetails {
        order_id: id.to_string(),
        order_status: Some("Filled".into()),
        stop_loss: sl,
        take_profit: tp,
        closed_pnl: None,
    }
}

pub fn rising_klines(n: usize) -> Vec<Kline> {
    (0..n)
        .map(|i| Kline {
            start_ms: i as i64 * 14_400_000,
            open: 100.0 + i as f64,
            high: 100.0 + i as f64,
            low: 100.0 + i as f64,
            close: 100.0 + i as f64,
        })
        .collect()
}
