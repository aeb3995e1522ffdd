//! Wilder-smoothed relative strength index on 4-hour candles.

use fr_core::types::Kline;

/// Candle interval passed to the exchange (minutes).
pub const RSI_INTERVAL: &str = "240";
/// How many candles to request.
pub const RSI_BARS: u32 = 200;
pub const DEFAULT_RSI_LENGTH: usize = 14;

/// RSI over `bars`, which may arrive in any order.
///
/// Needs at least `length + 2` bars; fewer yields `None`.
pub fn rsi_from_klines(mut bars: Vec<Kline>, length: usize) -> Option<f64> {
    if length == 0 || bars.len() < length + 2 {
        return None;
    }
    bars.sort_by_key(|b| b.start_ms);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rsi(&closes, length)
}

/// RSI over closes in chronological order.
///
/// Seeds average gain/loss with the simple mean of the first `length`
/// deltas, then smooths each later delta as `(avg * (length - 1) + x) / length`.
/// A zero average loss gives 100.
pub fn rsi(closes: &[f64], length: usize) -> Option<f64> {
    if length == 0 || closes.len() <= length {
        return None;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let d = w[1] - w[0];
            (d.max(0.0), (-d).max(0.0))
        })
        .unzip();

    let n = length as f64;
    let mut avg_gain = gains[..length].iter().sum::<f64>() / n;
    let mut avg_loss = losses[..length].iter().sum::<f64>() / n;

    for (g, l) in gains[length..].iter().zip(&losses[length..]) {
        avg_gain = (avg_gain * (n - 1.0) + g) / n;
        avg_loss = (avg_loss * (n - 1.0) + l) / n;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
