use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use podviz_k8s::ClusterSource;

use crate::pipeline::{SnapshotRefresher, Trigger};

const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Periodic rebuild, independent of watch activity
///
/// Fires once immediately so viewers have data before any watch event, then
/// every `interval`. Late ticks are delayed rather than bursted.
pub struct FallbackTicker<S> {
    refresher: SnapshotRefresher<S>,
    interval: Duration,
}

impl<S: ClusterSource> FallbackTicker<S> {
    pub fn new(refresher: SnapshotRefresher<S>, interval: Duration) -> Self {
        Self {
            refresher,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.refresher.refresh_logged(Trigger::Tick).await;
                }
            }
        }

        tracing::debug!("fallback ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use podviz_types::PodRecord;

    use crate::queue::{OverflowPolicy, SnapshotQueue};
    use crate::testing::FakeSource;

    fn setup() -> (Arc<FakeSource>, SnapshotQueue, FallbackTicker<FakeSource>) {
        let source = Arc::new(FakeSource::new(
            vec![PodRecord::new("a", "default", "Running", 1, 1)],
            Vec::new(),
        ));
        let queue = SnapshotQueue::new(16, OverflowPolicy::default());
        let refresher = SnapshotRefresher::new(Arc::clone(&source), queue.clone());
        let ticker = FallbackTicker::new(refresher, Duration::from_secs(10));
        (source, queue, ticker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate_then_periodic() {
        let (_source, queue, ticker) = setup();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(ticker.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(queue.len(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(queue.len(), 2);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_ticking_through_source_outage() {
        let (source, queue, ticker) = setup();
        source.set_available(false);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(ticker.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(queue.is_empty());
        assert!(!task.is_finished());

        source.set_available(true);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(queue.len(), 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
