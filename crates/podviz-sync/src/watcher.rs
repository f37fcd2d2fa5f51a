use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use podviz_k8s::{ClusterSource, WatchStream};
use podviz_types::ResourceKind;

use crate::pipeline::{SnapshotRefresher, Trigger};

/// Where a watcher is in its reconnect cycle
enum WatchState {
    Connecting,
    Streaming(WatchStream),
}

/// Keeps a watch session open for one resource kind, forever
///
/// Every add/modify/delete event triggers a full rebuild through the
/// refresher. Sessions that fail to open are retried after
/// `retry_backoff`; sessions that end are reopened after `reconnect_delay`.
/// The loop only exits when `cancel` fires.
pub struct ChangeWatcher<S> {
    kind: ResourceKind,
    refresher: SnapshotRefresher<S>,
    retry_backoff: Duration,
    reconnect_delay: Duration,
}

impl<S: ClusterSource> ChangeWatcher<S> {
    pub fn new(
        kind: ResourceKind,
        refresher: SnapshotRefresher<S>,
        retry_backoff: Duration,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            kind,
            refresher,
            retry_backoff,
            reconnect_delay,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut state = WatchState::Connecting;

        loop {
            state = match state {
                WatchState::Connecting => match self.connect(&cancel).await {
                    Some(next) => next,
                    None => break,
                },
                WatchState::Streaming(events) => {
                    if !self.consume(events, &cancel).await {
                        break;
                    }
                    if !pause(self.reconnect_delay, &cancel).await {
                        break;
                    }
                    WatchState::Connecting
                }
            };
        }

        tracing::debug!(kind = %self.kind, "watcher stopped");
    }

    /// Try to open a session; `None` when cancelled
    async fn connect(&self, cancel: &CancellationToken) -> Option<WatchState> {
        let opened = tokio::select! {
            _ = cancel.cancelled() => return None,
            opened = self.refresher.source().watch(self.kind) => opened,
        };

        match opened {
            Ok(events) => {
                tracing::info!(kind = %self.kind, "watch session opened");
                Some(WatchState::Streaming(events))
            }
            Err(e) => {
                tracing::warn!(
                    kind = %self.kind,
                    error = %e,
                    retry_in = ?self.retry_backoff,
                    "failed to open watch session"
                );
                pause(self.retry_backoff, cancel)
                    .await
                    .then_some(WatchState::Connecting)
            }
        }
    }

    /// Consume a session until it ends; `false` when cancelled
    async fn consume(&self, mut events: WatchStream, cancel: &CancellationToken) -> bool {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return false,

                next = events.next() => match next {
                    Some(Ok(event)) => {
                        if event.triggers_rebuild() {
                            tracing::trace!(
                                kind = %self.kind,
                                event = ?event.kind,
                                name = event.name.as_deref().unwrap_or_default(),
                                "change observed"
                            );
                            self.refresher.refresh_logged(Trigger::Watch(self.kind)).await;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::debug!(kind = %self.kind, error = %e, "watch session errored");
                        return true;
                    }
                    None => {
                        tracing::debug!(kind = %self.kind, "watch session closed by server");
                        return true;
                    }
                }
            }
        }
    }
}

/// Sleep for `duration`; `false` when cancelled first
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
