//! Deduplicating execution processor.
//!
//! Consumes execution pushes one batch at a time, strictly in order. For each
//! event in a batch:
//!
//! 1. drop non-fill executions (funding, ADL, bust)
//! 2. check the execution ID against [`SeenExecIds`]
//! 3. mark new IDs seen and trim the set back to capacity
//! 4. enrich, build the message, dispatch through the [`Notifier`]
//!
//! A failed dispatch is logged with the execution ID and never stops the
//! rest of the batch. What a duplicate does is governed by
//! [`DuplicatePolicy`].

use std::sync::Arc;

use fr_bybit::parser::execution_batch;
use fr_core::config::DuplicatePolicy;
use fr_core::dedup::SeenExecIds;
use fr_core::error::RelayResult;
use fr_core::types::ExecutionEvent;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::enrich::EnrichmentClient;
use crate::message::build_message;
use crate::notify::Notifier;

/// Per-batch counters, mainly for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// New fills that went on to enrichment and dispatch.
    pub admitted: usize,
    pub duplicates: usize,
    /// Non-fill executions dropped.
    pub filtered: usize,
    pub sent: usize,
    pub failed: usize,
    /// Events left unprocessed after a duplicate under `AbandonBatch`.
    pub abandoned: usize,
}

pub struct ExecutionProcessor {
    enrichment: EnrichmentClient,
    notifier: Arc<dyn Notifier>,
    seen: SeenExecIds,
    duplicate_policy: DuplicatePolicy,
    utc_offset_hours: i32,
}

impl ExecutionProcessor {
    pub fn new(
        enrichment: EnrichmentClient,
        notifier: Arc<dyn Notifier>,
        seen_capacity: usize,
        duplicate_policy: DuplicatePolicy,
        utc_offset_hours: i32,
    ) -> Self {
        Self {
            enrichment,
            notifier,
            seen: SeenExecIds::new(seen_capacity),
            duplicate_policy,
            utc_offset_hours,
        }
    }

    pub fn seen(&self) -> &SeenExecIds {
        &self.seen
    }

    /// Process one raw `execution` push (`{"topic": ..., "data": [...]}`).
    pub async fn process_batch(&mut self, push: &Value) -> BatchOutcome {
        self.process_events(execution_batch(push)).await
    }

    pub async fn process_events(&mut self, events: Vec<ExecutionEvent>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let total = events.len();

        for (idx, ev) in events.into_iter().enumerate() {
            if !ev.is_fill() {
                debug!("[relay] skip exec {} type={:?}", ev.exec_id, ev.exec_type);
                outcome.filtered += 1;
                continue;
            }

            if self.seen.contains(&ev.exec_id) {
                outcome.duplicates += 1;
                match self.duplicate_policy {
                    DuplicatePolicy::Skip => {
                        debug!("[relay] duplicate exec {}", ev.exec_id);
                        continue;
                    }
                    DuplicatePolicy::AbandonBatch => {
                        outcome.abandoned = total - idx - 1;
                        warn!(
                            "[relay] duplicate exec {}, abandoning {} remaining event(s) in batch",
                            ev.exec_id, outcome.abandoned
                        );
                        return outcome;
                    }
                }
            }

            self.seen.insert(&ev.exec_id);
            let evicted = self.seen.trim();
            if evicted > 0 {
                debug!("[relay] seen-set trimmed by {evicted}");
            }
            outcome.admitted += 1;

            match self.relay(&ev).await {
                Ok(()) => {
                    info!("[relay] notified exec {} {} {} {}", ev.exec_id, ev.symbol, ev.side, ev.exec_qty);
                    outcome.sent += 1;
                }
                Err(e) => {
                    error!("[relay] exec {} not delivered: {e}", ev.exec_id);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    async fn relay(&self, ev: &ExecutionEvent) -> RelayResult<()> {
        let enrichment = self.enrichment.enrich(ev).await;
        let text = build_message(ev, &enrichment, self.utc_offset_hours);
        self.notifier.send(&text).await
    }

    /// Drain `rx` until it closes or `shutdown` flips. A batch already being
    /// processed runs to completion before the loop exits; pushes still
    /// queued at shutdown are not processed.
    ///
    /// Returns how many queued pushes were left behind.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Value>, mut shutdown: watch::Receiver<bool>) -> usize {
        info!("[relay] processor started (duplicate policy: {:?})", self.duplicate_policy);

        let mut dropped = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    dropped = rx.len();
                    if dropped > 0 {
                        warn!("[relay] shutdown requested, {dropped} queued execution push(es) not processed");
                    } else {
                        info!("[relay] shutdown requested");
                    }
                    break;
                }
                push = rx.recv() => {
                    let Some(push) = push else {
                        info!("[relay] execution channel closed");
                        break;
                    };
                    let outcome = self.process_batch(&push).await;
                    debug!("[relay] batch done: {outcome:?}");
                }
            }
        }

        info!("[relay] processor stopped ({} exec IDs seen)", self.seen.len());
        dropped
    }
}
