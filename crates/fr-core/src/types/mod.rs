//! Data types shared across the relay.

pub mod details;
pub mod execution;

pub use details::*;
pub use execution::*;
