//! Execution-ID deduplication.
//!
//! The private execution stream can redeliver a fill (reconnect replays,
//! duplicate pushes). [`SeenExecIds`] remembers which execution IDs have
//! already been relayed so each fill is notified once.
//!
//! Memory is bounded: once more than `capacity` IDs are held, the oldest
//! inserted IDs are dropped until `capacity` remain. An evicted ID would be
//! treated as new if it ever came back; the window only needs to cover
//! redelivery, not all history.

use std::collections::VecDeque;

use ahash::AHashSet;

/// Bounded set of already-processed execution IDs.
///
/// # Thread safety
///
/// Not thread-safe. Owned by the event processor, which handles batches
/// sequentially.
pub struct SeenExecIds {
    ids: AHashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenExecIds {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: AHashSet::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn contains(&self, exec_id: &str) -> bool {
        self.ids.contains(exec_id)
    }

    /// Record `exec_id`. Returns `true` if it was new, `false` if already seen.
    pub fn insert(&mut self, exec_id: &str) -> bool {
        if !self.ids.insert(exec_id.to_string()) {
            return false;
        }
        self.order.push_back(exec_id.to_string());
        true
    }

    /// Drop the oldest IDs until at most `capacity` remain. Returns how many
    /// were evicted.
    pub fn trim(&mut self) -> usize {
        let mut evicted = 0;
        while self.ids.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.ids.remove(&oldest);
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
