use std::time::Duration;

use crate::queue::OverflowPolicy;

/// Tunables for the sync engine
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Fallback rebuild interval, independent of watch activity
    pub tick_interval: Duration,
    /// Pause after a watch session fails to open
    pub watch_retry_backoff: Duration,
    /// Pause after an open watch session ends
    pub watch_reconnect_delay: Duration,
    /// Pending snapshots between the rebuild triggers and the publisher
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Snapshots buffered per subscriber before it counts as unresponsive
    pub subscriber_buffer: usize,
    /// Bound on the readiness probe against the cluster
    pub probe_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            watch_retry_backoff: Duration::from_secs(5),
            watch_reconnect_delay: Duration::from_secs(1),
            queue_capacity: 256,
            overflow: OverflowPolicy::default(),
            subscriber_buffer: 16,
            probe_timeout: Duration::from_secs(5),
        }
    }
}
