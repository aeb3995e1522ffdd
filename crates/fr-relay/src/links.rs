//! Footer links: exchange trading page and chart.

use fr_core::types::Category;

/// Trading page on Bybit for `symbol`.
pub fn exchange_link(testnet: bool, category: &Category, symbol: &str) -> String {
    let base = if testnet { "https://testnet.bybit.com" } else { "https://www.bybit.com" };
    match category {
        Category::Spot => format!("{base}/trade/spot/{symbol}"),
        Category::Inverse => format!("{base}/trade/inverse/{symbol}"),
        _ => format!("{base}/trade/usdt/{symbol}"),
    }
}

/// TradingView symbol page.
pub fn chart_link(symbol: &str) -> String {
    format!("https://www.tradingview.com/symbols/{symbol}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_selects_path() {
        assert_eq!(exchange_link(false, &Category::Spot, "BTCUSDT"), "https://www.bybit.com/trade/spot/BTCUSDT");
        assert_eq!(
            exchange_link(false, &Category::Inverse, "BTCUSD"),
            "https://www.bybit.com/trade/inverse/BTCUSD"
        );
        assert_eq!(exchange_link(false, &Category::Linear, "ETHUSDT"), "https://www.bybit.com/trade/usdt/ETHUSDT");
        assert_eq!(
            exchange_link(false, &Category::Other(String::new()), "ETHUSDT"),
            "https://www.bybit.com/trade/usdt/ETHUSDT"
        );
    }

    #[test]
    fn testnet_host() {
        assert_eq!(
            exchange_link(true, &Category::Linear, "BTCUSDT"),
            "https://testnet.bybit.com/trade/usdt/BTCUSDT"
        );
    }

    #[test]
    fn chart() {
        assert_eq!(chart_link("SOLUSDT"), "https://www.tradingview.com/symbols/SOLUSDT/");
    }
}
