//! # fr-bybit
//!
//! Bybit v5 adapter for the fill relay.
//!
//! - [`auth`]: HMAC-SHA256 signing for REST headers and WS auth
//! - [`config`]: mainnet / testnet endpoint selection
//! - [`rest`]: signed REST client implementing [`fr_core::rest::ExchangeRest`]
//! - [`parser`]: response and execution-event normalization
//! - [`stream`]: private `execution` topic wiring on top of [`fr_core::ws`]

pub mod auth;
pub mod config;
pub mod json_util;
pub mod parser;
pub mod rest;
pub mod stream;

pub use config::BybitEndpoints;
pub use rest::BybitRest;
