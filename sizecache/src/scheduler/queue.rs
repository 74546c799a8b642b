//! Pending-work queue.

use std::collections::{BTreeMap, HashMap};

use super::{ComputeRequest, Priority};
use crate::cache::CacheKey;
use crate::item::ItemPosition;

type OrderKey = (Priority, ItemPosition, u64);

/// A request waiting for a worker, with the cache generation it was
/// submitted in.
#[derive(Debug, Clone)]
pub(crate) struct QueuedRequest {
    pub request: ComputeRequest,
    pub generation: u64,
    seq: u64,
}

impl QueuedRequest {
    fn order_key(&self) -> OrderKey {
        (self.request.priority, self.request.position, self.seq)
    }
}

/// What `push` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enqueued {
    New,
    /// Already queued; moved to the new priority.
    Reprioritized,
    /// Already queued at the same priority.
    Unchanged,
}

/// Pending requests, at most one per key, popped in
/// `(priority, position, submission order)` order.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    order: BTreeMap<OrderKey, CacheKey>,
    entries: HashMap<CacheKey, QueuedRequest>,
    next_seq: u64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `request`, or refreshes the existing entry for its key.
    ///
    /// A refreshed entry keeps its submission order but takes the newer
    /// request's frame, priority and generation.
    pub fn push(&mut self, request: ComputeRequest, generation: u64) -> Enqueued {
        if let Some(existing) = self.entries.get_mut(&request.key) {
            let old_order = existing.order_key();
            let reprioritized = existing.request.priority != request.priority;
            existing.request = request;
            existing.generation = generation;
            let new_order = existing.order_key();
            if old_order != new_order {
                let key = existing.request.key.clone();
                self.order.remove(&old_order);
                self.order.insert(new_order, key);
            }
            return if reprioritized {
                Enqueued::Reprioritized
            } else {
                Enqueued::Unchanged
            };
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let queued = QueuedRequest {
            request,
            generation,
            seq,
        };
        self.order.insert(queued.order_key(), queued.request.key.clone());
        self.entries.insert(queued.request.key.clone(), queued);
        Enqueued::New
    }

    /// Removes and returns the highest-priority request.
    pub fn pop(&mut self) -> Option<QueuedRequest> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key)
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<QueuedRequest> {
        let queued = self.entries.remove(key)?;
        self.order.remove(&queued.order_key());
        Some(queued)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops everything. Returns how many requests were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.order.clear();
        removed
    }
}
