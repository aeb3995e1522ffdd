//! # fr-core
//!
//! Core crate for the fill relay, providing:
//!
//! - **Types** (`types`): normalized execution events, order/position details, candles
//! - **Configuration** (`config`): environment-sourced settings with startup validation
//! - **Error types** (`error`): domain-specific `RelayError` via thiserror
//! - **REST port** (`rest`): the exchange REST collaborator trait
//! - **TTL cache** (`cache`): bounded key/value cache with expiry and oldest-first eviction
//! - **Deduplication** (`dedup`): bounded set of already-processed execution IDs
//! - **Formatting** (`format`): numeric parsing and formatting, HTML escaping, risk/reward
//! - **WebSocket** (`ws`): WS client with handshake replay, ping timeout and auto-reconnect
//! - **Time utilities** (`time_util`): wall-clock millis and fixed-offset local rendering
//! - **Logging** (`logging`): tracing-based structured logging

pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod format;
pub mod logging;
pub mod rest;
pub mod time_util;
pub mod types;
pub mod ws;

// Re-export types at crate root for convenience.
pub use types::*;
