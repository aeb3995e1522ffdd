//! Private `execution` stream.
//!
//! Builds a [`WsConnConfig`] whose handshake authenticates and subscribes to
//! the `execution` topic on every (re)connect, and a callback that hands each
//! execution push to the relay through a bounded channel. The callback never
//! blocks: a full channel drops the push with a warning.

use std::sync::Arc;
use std::time::Duration;

use fr_core::config::{ExchangeSettings, WsSettings};
use fr_core::time_util::now_ms;
use fr_core::ws::{HandshakeFn, OnMessageCallback, WsConnConfig, WsConnection};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::auth;
use crate::config::BybitEndpoints;
use crate::parser::{self, EXECUTION_TOPIC, StreamMessage};

/// Lifetime of the signed `auth` payload.
const AUTH_EXPIRY: Duration = Duration::from_secs(10);

/// Connection settings for the private execution stream.
pub fn execution_stream_config(
    exchange: &ExchangeSettings,
    ws: &WsSettings,
    endpoints: &BybitEndpoints,
) -> WsConnConfig {
    let api_key = exchange.api_key.clone();
    let api_secret = exchange.api_secret.clone();
    let handshake: HandshakeFn = Arc::new(move || {
        let expires = now_ms() + AUTH_EXPIRY.as_millis() as u64;
        vec![auth::ws_auth_message(&api_key, &api_secret, expires), subscribe_message(&[EXECUTION_TOPIC])]
    });

    WsConnConfig {
        url: endpoints.private_ws_url.clone(),
        handshake: Some(handshake),
        ping_interval: ws.ping_interval,
        ping_timeout: ws.ping_timeout,
        ping_payload: serde_json::json!({"op": "ping"}),
        initial_backoff: Duration::from_secs(1).min(ws.reconnect_max_backoff),
        max_backoff: ws.reconnect_max_backoff,
        id: 0,
    }
}

pub fn subscribe_message(topics: &[&str]) -> String {
    serde_json::json!({"op": "subscribe", "args": topics}).to_string()
}

/// Callback that forwards execution pushes into `tx` and logs op replies.
pub fn execution_callback(tx: mpsc::Sender<Value>) -> OnMessageCallback {
    Arc::new(move |conn_id: usize, text: &str| match parser::classify_message(text) {
        StreamMessage::Execution(push) => {
            if tx.try_send(push).is_err() {
                warn!("[ws-{conn_id}] execution channel full or closed, batch dropped");
            }
        }
        StreamMessage::OpReply { op, success: true, .. } => {
            if op == "pong" || op == "ping" {
                debug!("[ws-{conn_id}] {op}");
            } else {
                info!("[ws-{conn_id}] {op} ok");
            }
        }
        StreamMessage::OpReply { op, success: false, ret_msg } => {
            error!("[ws-{conn_id}] {op} rejected: {ret_msg}");
        }
        StreamMessage::Other => debug!("[ws-{conn_id}] ignoring frame: {text}"),
    })
}

/// Start the private execution stream. Pushes arrive on `tx`.
pub fn spawn_execution_stream(
    exchange: &ExchangeSettings,
    ws: &WsSettings,
    endpoints: &BybitEndpoints,
    tx: mpsc::Sender<Value>,
) -> WsConnection {
    let mut conn = WsConnection::new(execution_stream_config(exchange, ws, endpoints));
    conn.start(execution_callback(tx));
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> (ExchangeSettings, WsSettings) {
        (
            ExchangeSettings {
                api_key: "key".into(),
                api_secret: "secret".into(),
                testnet: true,
                recv_window_ms: 5000,
            },
            WsSettings {
                ping_interval: Duration::from_secs(20),
                ping_timeout: Duration::from_secs(10),
                reconnect_max_backoff: Duration::from_secs(60),
            },
        )
    }

    #[test]
    fn handshake_authenticates_then_subscribes() {
        let (ex, ws) = settings();
        let cfg = execution_stream_config(&ex, &ws, &BybitEndpoints::testnet());
        assert_eq!(cfg.url, "wss://stream-testnet.bybit.com/v5/private");

        let msgs = (cfg.handshake.as_ref().unwrap())();
        assert_eq!(msgs.len(), 2);
        let auth: Value = serde_json::from_str(&msgs[0]).unwrap();
        assert_eq!(auth["op"], "auth");
        assert!(auth["args"][1].as_u64().unwrap() > now_ms());
        let sub: Value = serde_json::from_str(&msgs[1]).unwrap();
        assert_eq!(sub, serde_json::json!({"op": "subscribe", "args": ["execution"]}));
    }

    #[test]
    fn callback_forwards_only_execution_pushes() {
        let (tx, mut rx) = mpsc::channel(4);
        let cb = execution_callback(tx);
        cb(0, r#"{"op":"auth","success":true,"ret_msg":""}"#);
        cb(0, r#"{"topic":"order","data":[]}"#);
        cb(0, r#"{"topic":"execution","data":[{"execId":"x"}]}"#);

        let push = rx.try_recv().unwrap();
        assert_eq!(push["data"][0]["execId"], "x");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn callback_drops_when_channel_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let cb = execution_callback(tx);
        cb(0, r#"{"topic":"execution","data":[{"execId":"1"}]}"#);
        cb(0, r#"{"topic":"execution","data":[{"execId":"2"}]}"#);

        assert_eq!(rx.try_recv().unwrap()["data"][0]["execId"], "1");
        assert!(rx.try_recv().is_err());
    }
}
