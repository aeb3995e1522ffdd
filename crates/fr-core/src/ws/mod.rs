//! WebSocket client with handshake replay, ping timeout and auto-reconnect.

pub mod client;

pub use client::{HandshakeFn, OnMessageCallback, WsConnConfig, WsConnection};
