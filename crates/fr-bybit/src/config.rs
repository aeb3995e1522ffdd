//! Bybit endpoint selection.

/// Hosts used by the relay for one network (mainnet or testnet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BybitEndpoints {
    /// REST base URL.
    pub rest_url: String,
    /// Private (authenticated) WebSocket URL.
    pub private_ws_url: String,
    pub testnet: bool,
}

impl BybitEndpoints {
    pub fn mainnet() -> Self {
        Self {
            rest_url: "https://api.bybit.com".into(),
            private_ws_url: "wss://stream.bybit.com/v5/private".into(),
            testnet: false,
        }
    }

    pub fn testnet() -> Self {
        Self {
            rest_url: "https://api-testnet.bybit.com".into(),
            private_ws_url: "wss://stream-testnet.bybit.com/v5/private".into(),
            testnet: true,
        }
    }

    pub fn for_network(testnet: bool) -> Self {
        if testnet { Self::testnet() } else { Self::mainnet() }
    }
}
