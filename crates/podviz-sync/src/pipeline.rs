use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use podviz_k8s::ClusterSource;
use podviz_types::{ClusterSnapshot, ResourceKind, SourceError};

use crate::hub::BroadcastHub;
use crate::queue::{PushOutcome, SnapshotQueue};

/// Why a rebuild was requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Tick,
    Watch(ResourceKind),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => f.write_str("tick"),
            Self::Watch(kind) => write!(f, "watch:{kind}"),
        }
    }
}

/// Read pods and deployments for `namespace` and build a snapshot
pub async fn fetch_snapshot<S: ClusterSource>(
    source: &S,
    namespace: &str,
) -> Result<ClusterSnapshot, SourceError> {
    let (pods, deployments) = tokio::try_join!(
        source.list_pods(namespace),
        source.list_deployments(namespace)
    )?;
    Ok(ClusterSnapshot::build(pods, deployments))
}

/// Rebuilds the all-namespaces snapshot and queues it for publishing
pub struct SnapshotRefresher<S> {
    source: Arc<S>,
    queue: SnapshotQueue,
}

impl<S> Clone for SnapshotRefresher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            queue: self.queue.clone(),
        }
    }
}

impl<S: ClusterSource> SnapshotRefresher<S> {
    pub fn new(source: Arc<S>, queue: SnapshotQueue) -> Self {
        Self { source, queue }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Fetch, build and enqueue a fresh snapshot
    pub async fn refresh(&self, trigger: Trigger) -> Result<PushOutcome, SourceError> {
        let snapshot = fetch_snapshot(self.source.as_ref(), "").await?;
        let pods = snapshot.pods.len();
        let deployments = snapshot.deployments.len();

        let outcome = self.queue.push(Arc::new(snapshot));
        match outcome {
            PushOutcome::Queued => {
                tracing::debug!(%trigger, pods, deployments, "snapshot queued");
            }
            PushOutcome::Superseded | PushOutcome::Discarded => {
                tracing::debug!(%trigger, ?outcome, "publisher behind, snapshot queue full");
            }
        }
        Ok(outcome)
    }

    /// Refresh and log failures instead of returning them
    pub async fn refresh_logged(&self, trigger: Trigger) {
        if let Err(e) = self.refresh(trigger).await {
            tracing::warn!(%trigger, error = %e, "snapshot rebuild failed");
        }
    }
}

/// Drain the queue into the hub, one snapshot at a time, until cancelled
pub async fn run_publisher(queue: SnapshotQueue, hub: Arc<BroadcastHub>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            snapshot = queue.pop() => {
                let report = hub.publish(snapshot);
                tracing::trace!(
                    delivered = report.delivered,
                    dropped = report.dropped.len(),
                    "snapshot published"
                );
            }
        }
    }
    tracing::debug!("publisher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::OverflowPolicy;
    use crate::testing::FakeSource;
    use podviz_types::{DeploymentRecord, PodRecord};

    fn fake_cluster() -> FakeSource {
        FakeSource::new(
            vec![
                PodRecord::new("a", "default", "Running", 2, 2),
                PodRecord::new("b", "default", "Pending", 2, 1),
            ],
            vec![DeploymentRecord::new("web", "default").with_replicas(1, 3)],
        )
    }

    #[tokio::test]
    async fn test_fetch_snapshot_aggregates_source() {
        let source = fake_cluster();
        let snapshot = fetch_snapshot(&source, "").await.unwrap();

        assert_eq!(snapshot.total_containers, 4);
        assert_eq!(snapshot.ready_containers, 3);
        assert_eq!(snapshot.container_percentage, 75.0);
        assert_eq!(snapshot.total_replicas, 3);
        assert_eq!(snapshot.ready_replicas, 1);
        assert!((snapshot.replica_percentage - 33.33).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_scopes_namespace() {
        let source = fake_cluster();
        source.set_pods(vec![
            PodRecord::new("a", "default", "Running", 1, 1),
            PodRecord::new("b", "other", "Running", 1, 1),
        ]);
        let snapshot = fetch_snapshot(&source, "other").await.unwrap();
        assert_eq!(snapshot.pods.len(), 1);
        assert_eq!(snapshot.pods[0].name, "b");
        assert!(snapshot.deployments.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_propagates_source_failure() {
        let source = fake_cluster();
        source.set_available(false);
        let queue = SnapshotQueue::new(4, OverflowPolicy::default());
        let refresher = SnapshotRefresher::new(Arc::new(source), queue.clone());

        let err = refresher.refresh(Trigger::Tick).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_publisher_delivers_latest_after_burst() {
        let queue = SnapshotQueue::new(1, OverflowPolicy::Supersede);
        let hub = Arc::new(BroadcastHub::new(8));
        let mut sub = hub.register();
        let source = Arc::new(fake_cluster());
        let refresher = SnapshotRefresher::new(Arc::clone(&source), queue.clone());

        // Three rebuilds land before the publisher runs at all
        for n in 1..=3 {
            source.set_pods(
                (0..n)
                    .map(|i| PodRecord::new(format!("p{i}"), "default", "Running", 1, 1))
                    .collect(),
            );
            refresher.refresh(Trigger::Tick).await.unwrap();
        }

        let cancel = CancellationToken::new();
        let publisher = tokio::spawn(run_publisher(queue, Arc::clone(&hub), cancel.clone()));

        let delivered = sub.recv().await.unwrap();
        assert_eq!(delivered.pods.len(), 3);

        cancel.cancel();
        publisher.await.unwrap();
    }
}
