//! Cluster snapshot synchronization for podviz
//!
//! This crate keeps one shared, all-namespaces [`ClusterSnapshot`] feed
//! current and fans it out to viewers:
//!
//! - a [`ChangeWatcher`] per resource kind rebuilds on every change event
//! - a [`FallbackTicker`] rebuilds on a fixed interval
//! - rebuilt snapshots go through a bounded [`SnapshotQueue`]
//! - a single publisher drains the queue into the [`BroadcastHub`]
//!
//! [`ClusterSync`] wires these together and owns their tasks.

mod config;
mod hub;
mod pipeline;
mod queue;
#[cfg(test)]
mod testing;
mod ticker;
mod watcher;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use config::SyncConfig;
pub use hub::{BroadcastHub, PublishReport, SubscriberId, Subscription};
pub use pipeline::{fetch_snapshot, run_publisher, SnapshotRefresher, Trigger};
pub use queue::{OverflowPolicy, PushOutcome, SnapshotQueue};
pub use ticker::FallbackTicker;
pub use watcher::ChangeWatcher;

use podviz_k8s::ClusterSource;
use podviz_types::{ClusterSnapshot, ResourceKind};

/// Running sync engine: watchers, ticker and publisher
pub struct ClusterSync<S> {
    source: Arc<S>,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: ClusterSource> ClusterSync<S> {
    /// Spawn all workers on the current tokio runtime
    pub fn start(source: Arc<S>, config: SyncConfig) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.subscriber_buffer));
        let queue = SnapshotQueue::new(config.queue_capacity, config.overflow);
        let refresher = SnapshotRefresher::new(Arc::clone(&source), queue.clone());
        let cancel = CancellationToken::new();

        let mut tasks = Vec::with_capacity(ResourceKind::ALL.len() + 2);

        tasks.push(tokio::spawn(run_publisher(
            queue,
            Arc::clone(&hub),
            cancel.clone(),
        )));

        for kind in ResourceKind::ALL {
            let watcher = ChangeWatcher::new(
                kind,
                refresher.clone(),
                config.watch_retry_backoff,
                config.watch_reconnect_delay,
            );
            tasks.push(tokio::spawn(watcher.run(cancel.clone())));
        }

        let ticker = FallbackTicker::new(refresher, config.tick_interval);
        tasks.push(tokio::spawn(ticker.run(cancel.clone())));

        tracing::info!(
            tick_interval = ?config.tick_interval,
            queue_capacity = config.queue_capacity,
            "cluster sync started"
        );

        Self {
            source,
            hub,
            cancel,
            tasks,
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Token cancelled when the engine shuts down
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Most recent published snapshot, if any has been published yet
    pub fn latest(&self) -> Option<Arc<ClusterSnapshot>> {
        self.hub.latest()
    }

    /// Check if any worker is still running
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }

    /// Stop every worker and wait for them to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "sync worker ended abnormally");
            }
        }
        tracing::info!("cluster sync stopped");
    }
}

impl<S> Drop for ClusterSync<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
