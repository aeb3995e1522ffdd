//! Typed error definitions for the fill relay.
//!
//! [`RelayError`] is the explicit error half of every collaborator call
//! (exchange REST, notification dispatch). Callers decide whether a given
//! variant is fatal (configuration) or logged and degraded (lookups, sends).
//! All variants implement `std::error::Error` via `thiserror`, so they also
//! compose with `anyhow::Result` at the binary boundary.

use thiserror::Error;

/// Domain-specific errors for the fill relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("config error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connect, timeout, non-2xx status).
    #[error("http error: {0}")]
    Http(String),

    /// The exchange answered with a non-zero return code.
    #[error("api error {code}: {msg}")]
    Api { code: i64, msg: String },

    /// Response or event payload did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// WebSocket connection, handshake, or communication error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The notification endpoint rejected or failed to accept a message.
    #[error("notify error: {0}")]
    Notify(String),
}

/// Result alias used by collaborator calls.
pub type RelayResult<T> = Result<T, RelayError>;
