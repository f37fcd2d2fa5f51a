use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};

use podviz_types::ClusterSnapshot;

/// Identity of one connected viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end handed to a viewer on registration
///
/// `recv` returns `None` once the hub has dropped this subscriber, which is
/// the signal for the connection task to close its connection.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<ClusterSnapshot>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<Arc<ClusterSnapshot>> {
        self.receiver.recv().await
    }
}

/// Outcome of one publish round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Subscribers that were full or gone and have been unregistered
    pub dropped: Vec<SubscriberId>,
}

/// Fan-out point for snapshots
///
/// Every subscriber owns a bounded channel. Publishing never waits on a
/// subscriber: a full or closed channel gets its subscriber unregistered.
/// Publishes share the read lock; register/unregister take the write lock.
pub struct BroadcastHub {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Arc<ClusterSnapshot>>>>,
    latest: RwLock<Option<Arc<ClusterSnapshot>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl BroadcastHub {
    /// Create a hub whose subscribers buffer up to `buffer` snapshots each
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            latest: RwLock::new(None),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    pub fn register(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.buffer);

        let count = {
            let mut subscribers = self.subscribers.write();
            subscribers.insert(id, sender);
            subscribers.len()
        };
        tracing::info!(subscriber = %id, total = count, "subscriber connected");

        Subscription { id, receiver }
    }

    /// Remove a subscriber, returning whether it was still registered
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.subscribers.write();
            let removed = subscribers.remove(&id).is_some();
            (removed, subscribers.len())
        };
        if removed {
            tracing::info!(subscriber = %id, total = count, "subscriber disconnected");
        }
        removed
    }

    /// Deliver `snapshot` to every registered subscriber
    pub fn publish(&self, snapshot: Arc<ClusterSnapshot>) -> PublishReport {
        *self.latest.write() = Some(Arc::clone(&snapshot));

        let mut report = PublishReport::default();
        {
            let subscribers = self.subscribers.read();
            for (id, sender) in subscribers.iter() {
                match sender.try_send(Arc::clone(&snapshot)) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(subscriber = %id, "subscriber unresponsive, dropping");
                        report.dropped.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(subscriber = %id, "subscriber channel closed");
                        report.dropped.push(*id);
                    }
                }
            }
        }

        if !report.dropped.is_empty() {
            // Dropping the sender closes the subscriber's channel
            let mut subscribers = self.subscribers.write();
            for id in &report.dropped {
                subscribers.remove(id);
            }
        }

        report
    }

    /// Most recently published snapshot, if any
    pub fn latest(&self) -> Option<Arc<ClusterSnapshot>> {
        self.latest.read().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_registered(&self, id: SubscriberId) -> bool {
        self.subscribers.read().contains_key(&id)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Arc<ClusterSnapshot> {
        Arc::new(ClusterSnapshot::empty())
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = BroadcastHub::new(4);
        let mut a = hub.register();
        let mut b = hub.register();

        let report = hub.publish(snapshot());
        assert_eq!(report.delivered, 2);
        assert!(report.dropped.is_empty());
        assert!(a.recv().await.is_some());
        assert!(b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_full_subscriber_is_dropped_others_still_served() {
        let hub = BroadcastHub::new(1);
        let mut healthy: Vec<_> = (0..3).map(|_| hub.register()).collect();
        let mut stalled = hub.register();

        // Fill the stalled subscriber's only slot
        hub.publish(snapshot());
        for sub in healthy.iter_mut() {
            assert!(sub.recv().await.is_some());
        }

        let report = hub.publish(snapshot());
        assert_eq!(report.delivered, 3);
        assert_eq!(report.dropped, vec![stalled.id()]);
        assert!(!hub.is_registered(stalled.id()));
        assert_eq!(hub.subscriber_count(), 3);

        for sub in healthy.iter_mut() {
            assert!(sub.recv().await.is_some());
        }

        // The buffered snapshot drains, then the closed channel ends the stream
        assert!(stalled.recv().await.is_some());
        assert!(stalled.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_subscriber_is_dropped() {
        let hub = BroadcastHub::new(4);
        let gone = hub.register();
        let gone_id = gone.id();
        drop(gone);

        let report = hub.publish(snapshot());
        assert_eq!(report.dropped, vec![gone_id]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let hub = BroadcastHub::default();
        let sub = hub.register();
        assert!(hub.unregister(sub.id()));
        assert!(!hub.unregister(sub.id()));
    }

    #[test]
    fn test_latest_tracks_last_publish() {
        let hub = BroadcastHub::default();
        assert!(hub.latest().is_none());

        let first = snapshot();
        let second = snapshot();
        hub.publish(Arc::clone(&first));
        hub.publish(Arc::clone(&second));

        let latest = hub.latest().unwrap();
        assert!(Arc::ptr_eq(&latest, &second));
    }

    #[tokio::test]
    async fn test_delivery_preserves_publish_order() {
        let hub = BroadcastHub::new(8);
        let mut sub = hub.register();

        let published: Vec<_> = (0..5).map(|_| snapshot()).collect();
        for s in &published {
            hub.publish(Arc::clone(s));
        }

        for expected in &published {
            let got = sub.recv().await.unwrap();
            assert!(Arc::ptr_eq(&got, expected));
        }
    }
}
