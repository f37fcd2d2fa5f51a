use std::future::Future;
use std::time::Duration;

use futures::stream::BoxStream;

use podviz_types::{DeploymentRecord, PodRecord, ResourceKind, SourceError};

/// Stream of change notifications from one watch session
pub type WatchStream = BoxStream<'static, Result<WatchEvent, SourceError>>;

/// Type of a change notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchEventKind {
    Added,
    Modified,
    Deleted,
    /// Bookmarks, server-side error notices and anything else
    Other,
}

/// One change notification from a watch session
///
/// The resource payload is intentionally not carried: a change always
/// triggers a full re-read rather than an incremental merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub resource: ResourceKind,
    pub name: Option<String>,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, resource: ResourceKind) -> Self {
        Self {
            kind,
            resource,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether this event should cause a snapshot rebuild
    pub fn triggers_rebuild(&self) -> bool {
        matches!(
            self.kind,
            WatchEventKind::Added | WatchEventKind::Modified | WatchEventKind::Deleted
        )
    }
}

/// Read and watch access to cluster resources
///
/// An empty namespace means all namespaces. Implementations never cache and
/// never retry; callers own the retry policy.
pub trait ClusterSource: Send + Sync + 'static {
    fn list_pods(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<PodRecord>, SourceError>> + Send;

    fn list_deployments(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<DeploymentRecord>, SourceError>> + Send;

    /// Open a watch session for `kind` across all namespaces
    fn watch(
        &self,
        kind: ResourceKind,
    ) -> impl Future<Output = Result<WatchStream, SourceError>> + Send;
}

/// Check that the source answers a pod listing within `timeout`
pub async fn probe<S: ClusterSource>(source: &S, timeout: Duration) -> Result<(), SourceError> {
    match tokio::time::timeout(timeout, source.list_pods("")).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    enum Behaviour {
        Healthy,
        Failing,
        Hanging,
    }

    struct StubSource(Behaviour);

    impl ClusterSource for StubSource {
        async fn list_pods(&self, _namespace: &str) -> Result<Vec<PodRecord>, SourceError> {
            match self.0 {
                Behaviour::Healthy => Ok(vec![PodRecord::new("a", "default", "Running", 1, 1)]),
                Behaviour::Failing => Err(SourceError::Unavailable("connection refused".into())),
                Behaviour::Hanging => std::future::pending().await,
            }
        }

        async fn list_deployments(
            &self,
            _namespace: &str,
        ) -> Result<Vec<DeploymentRecord>, SourceError> {
            Ok(Vec::new())
        }

        async fn watch(&self, _kind: ResourceKind) -> Result<WatchStream, SourceError> {
            Ok(futures::stream::empty().boxed())
        }
    }

    #[tokio::test]
    async fn test_probe_healthy_source() {
        let source = StubSource(Behaviour::Healthy);
        assert!(probe(&source, Duration::from_secs(5)).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_reports_list_error() {
        let source = StubSource(Behaviour::Failing);
        let err = probe(&source, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_times_out_on_hung_source() {
        let source = StubSource(Behaviour::Hanging);
        let started = tokio::time::Instant::now();
        let err = probe(&source, Duration::from_secs(5)).await.unwrap_err();

        assert!(matches!(err, SourceError::Timeout(_)));
        assert!(started.elapsed() <= Duration::from_secs(6));
    }

    #[test]
    fn test_only_change_events_trigger_rebuild() {
        let added = WatchEvent::new(WatchEventKind::Added, ResourceKind::Pod);
        let deleted = WatchEvent::new(WatchEventKind::Deleted, ResourceKind::Deployment);
        let other = WatchEvent::new(WatchEventKind::Other, ResourceKind::Pod);

        assert!(added.triggers_rebuild());
        assert!(deleted.triggers_rebuild());
        assert!(!other.triggers_rebuild());
    }
}
