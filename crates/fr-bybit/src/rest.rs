//! Bybit v5 REST client.
//!
//! | Operation      | Method | Path                  | Signed |
//! |----------------|--------|-----------------------|--------|
//! | Order history  | GET    | `/v5/order/history`   | yes    |
//! | Positions      | GET    | `/v5/position/list`   | yes    |
//! | Kline          | GET    | `/v5/market/kline`    | no     |
//!
//! Every failure (transport, HTTP status, non-zero `retCode`, malformed body)
//! comes back as a [`RelayError`]; nothing here panics or retries.

use std::time::Duration;

use async_trait::async_trait;
use fr_core::config::ExchangeSettings;
use fr_core::error::{RelayError, RelayResult};
use fr_core::rest::ExchangeRest;
use fr_core::time_util::now_ms;
use fr_core::types::{Kline, OrderDetails, PositionDetails};
use serde_json::Value;
use tracing::debug;

use crate::auth;
use crate::config::BybitEndpoints;
use crate::parser;

/// Per-request timeout for REST calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Signed Bybit REST client.
pub struct BybitRest {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    recv_window_ms: u64,
    endpoints: BybitEndpoints,
}

impl BybitRest {
    pub fn new(settings: &ExchangeSettings, endpoints: BybitEndpoints) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Http(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            recv_window_ms: settings.recv_window_ms,
            endpoints,
        })
    }

    /// Authenticated GET; returns the decoded body.
    async fn signed_get(&self, path: &str, params: &[(&str, &str)]) -> RelayResult<Value> {
        let query = auth::build_query(params);
        let timestamp = now_ms();
        let signature = auth::rest_signature(&self.api_secret, timestamp, &self.api_key, self.recv_window_ms, &query);
        let url = format!("{}{path}?{query}", self.endpoints.rest_url);
        debug!("[bybit-rest] GET {path}?{query}");

        let resp = self
            .http
            .get(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window_ms.to_string())
            .header("X-BAPI-SIGN", signature)
            .send()
            .await
            .map_err(|e| RelayError::Http(format!("GET {path}: {e}")))?;
        decode(path, resp).await
    }

    /// Unauthenticated GET for market data.
    async fn public_get(&self, path: &str, params: &[(&str, &str)]) -> RelayResult<Value> {
        let query = auth::build_query(params);
        let url = format!("{}{path}?{query}", self.endpoints.rest_url);
        debug!("[bybit-rest] GET {path}?{query}");

        let resp = self.http.get(&url).send().await.map_err(|e| RelayError::Http(format!("GET {path}: {e}")))?;
        decode(path, resp).await
    }
}

async fn decode(path: &str, resp: reqwest::Response) -> RelayResult<Value> {
    let resp = resp.error_for_status().map_err(|e| RelayError::Http(format!("GET {path}: {e}")))?;
    resp.json::<Value>().await.map_err(|e| RelayError::Parse(format!("GET {path}: {e}")))
}

#[async_trait]
impl ExchangeRest for BybitRest {
    async fn get_order_history(
        &self,
        category: &str,
        symbol: &str,
        order_id: Option<&str>,
        limit: u32,
    ) -> RelayResult<Vec<OrderDetails>> {
        let limit = limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("category", category), ("symbol", symbol)];
        if let Some(id) = order_id {
            params.push(("orderId", id));
        }
        params.push(("limit", limit.as_str()));

        let body = self.signed_get("/v5/order/history", &params).await?;
        Ok(parser::result_list(&body)?.iter().map(parser::parse_order).collect())
    }

    async fn get_positions(&self, category: &str, symbol: &str) -> RelayResult<Vec<PositionDetails>> {
        let body = self.signed_get("/v5/position/list", &[("category", category), ("symbol", symbol)]).await?;
        Ok(parser::result_list(&body)?.iter().map(parser::parse_position).collect())
    }

    async fn get_kline(&self, category: &str, symbol: &str, interval: &str, limit: u32) -> RelayResult<Vec<Kline>> {
        let limit = limit.to_string();
        let body = self
            .public_get(
                "/v5/market/kline",
                &[("category", category), ("symbol", symbol), ("interval", interval), ("limit", limit.as_str())],
            )
            .await?;
        parser::result_list(&body)?.iter().map(parser::parse_kline_row).collect()
    }
}
