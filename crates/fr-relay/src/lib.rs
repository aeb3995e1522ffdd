//! # fr-relay
//!
//! The enrichment-and-deduplication pipeline between the private execution
//! stream and the chat endpoint.
//!
//! ```text
//! execution push ─► ExecutionProcessor ─► (fill filter, SeenExecIds)
//!                         │
//!                         ├─► EnrichmentClient ─► order / position TTL caches ─► ExchangeRest
//!                         │                    └► momentum indicator (4h candles)
//!                         ├─► build_message
//!                         └─► Notifier (Telegram)
//! ```

pub mod enrich;
pub mod indicator;
pub mod links;
pub mod message;
pub mod notify;
pub mod processor;

#[cfg(test)]
pub(crate) mod testing;

pub use enrich::{Enrichment, EnrichmentClient, EnrichmentConfig};
pub use notify::{Notifier, TelegramNotifier};
pub use processor::{BatchOutcome, ExecutionProcessor};
