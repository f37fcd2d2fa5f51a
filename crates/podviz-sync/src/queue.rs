use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Notify;

use podviz_types::ClusterSnapshot;

/// What a full queue does with an incoming snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the oldest pending snapshot so the newest one is kept
    #[default]
    Supersede,
    /// Discard the incoming snapshot
    DropNewest,
}

/// Result of pushing into the queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queue was full; an older pending snapshot was discarded
    Superseded,
    /// Queue was full; the pushed snapshot was discarded
    Discarded,
}

/// Bounded hand-off between rebuild triggers and the publisher
///
/// Any number of producers may push; a single consumer pops. The queue never
/// holds more than `capacity` snapshots.
#[derive(Clone)]
pub struct SnapshotQueue {
    pending: Arc<Mutex<VecDeque<Arc<ClusterSnapshot>>>>,
    ready: Arc<Notify>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl SnapshotQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            ready: Arc::new(Notify::new()),
            capacity,
            policy,
        }
    }

    /// Enqueue without waiting, applying the overflow policy when full
    pub fn push(&self, snapshot: Arc<ClusterSnapshot>) -> PushOutcome {
        let outcome = {
            let mut pending = self.pending.lock();
            if pending.len() < self.capacity {
                pending.push_back(snapshot);
                PushOutcome::Queued
            } else {
                match self.policy {
                    OverflowPolicy::Supersede => {
                        pending.pop_front();
                        pending.push_back(snapshot);
                        PushOutcome::Superseded
                    }
                    OverflowPolicy::DropNewest => PushOutcome::Discarded,
                }
            }
        };

        if outcome != PushOutcome::Discarded {
            self.ready.notify_one();
        }
        outcome
    }

    /// Wait for the next pending snapshot
    pub async fn pop(&self) -> Arc<ClusterSnapshot> {
        loop {
            let next = self.pending.lock().pop_front();
            if let Some(snapshot) = next {
                return snapshot;
            }
            self.ready.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}
