//! Shared types for podviz
//!
//! This crate contains the resource records read from the cluster, the
//! snapshot they are aggregated into, and the error taxonomy shared by the
//! reader and the sync engine.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// Kind of resource tracked by podviz
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pod,
    Deployment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Pod, ResourceKind::Deployment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "pods",
            Self::Deployment => "deployments",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ready units out of declared units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Readiness {
    pub ready: i64,
    pub total: i64,
}

impl Readiness {
    pub fn new(ready: i64, total: i64) -> Self {
        Self { ready, total }
    }

    /// Percentage of ready units, 0 when nothing is declared
    pub fn percentage(&self) -> f64 {
        percentage(self.ready, self.total)
    }

    /// Whether every declared unit is ready
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.ready >= self.total
    }
}

impl std::ops::Add for Readiness {
    type Output = Readiness;

    fn add(self, rhs: Readiness) -> Readiness {
        Readiness::new(self.ready + rhs.ready, self.total + rhs.total)
    }
}

impl std::iter::Sum for Readiness {
    fn sum<I: Iterator<Item = Readiness>>(iter: I) -> Self {
        iter.fold(Readiness::default(), |acc, r| acc + r)
    }
}

/// `ready / total * 100`, clamped to [0, 100], 0 when `total` is 0
pub fn percentage(ready: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (ready as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Pod phase as reported by the cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for PodPhase {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl PodPhase {
    /// Glyph shown next to a pod in reports and dashboards
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Running | Self::Succeeded => "✅",
            Self::Pending => "⏳",
            Self::Failed => "❌",
            Self::Unknown => "❓",
        }
    }
}

/// Pod readiness as read from the cluster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub container_count: u32,
    pub ready_containers: u32,
    pub status_symbol: String,
}

impl PodRecord {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        status: impl Into<String>,
        container_count: u32,
        ready_containers: u32,
    ) -> Self {
        let status = status.into();
        let status_symbol = PodPhase::from(status.as_str()).symbol().to_string();
        Self {
            name: name.into(),
            namespace: namespace.into(),
            status,
            container_count,
            ready_containers,
            status_symbol,
        }
    }

    pub fn phase(&self) -> PodPhase {
        PodPhase::from(self.status.as_str())
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::new(
            i64::from(self.ready_containers),
            i64::from(self.container_count),
        )
    }
}

/// Deployment readiness as read from the cluster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
}

impl DeploymentRecord {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            replicas: 0,
            ready_replicas: 0,
            available_replicas: 0,
        }
    }

    pub fn with_replicas(mut self, ready: i32, desired: i32) -> Self {
        self.ready_replicas = ready;
        self.replicas = desired;
        self
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::new(i64::from(self.ready_replicas), i64::from(self.replicas))
    }

    /// Format replica status as "ready/total"
    pub fn replica_status(&self) -> String {
        format!("{}/{}", self.ready_replicas, self.replicas)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time readiness summary of the cluster
///
/// A snapshot is never edited once built. Every refresh produces a new one,
/// which is shared between viewers behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    pub pods: Vec<PodRecord>,
    pub deployments: Vec<DeploymentRecord>,
    pub total_containers: i64,
    pub ready_containers: i64,
    pub container_percentage: f64,
    pub total_replicas: i64,
    pub ready_replicas: i64,
    pub replica_percentage: f64,
    pub last_updated: DateTime<Utc>,
}

impl ClusterSnapshot {
    /// Build a snapshot stamped with the current time
    pub fn build(pods: Vec<PodRecord>, deployments: Vec<DeploymentRecord>) -> Self {
        Self::build_at(pods, deployments, Utc::now())
    }

    /// Build a snapshot with an explicit capture time
    pub fn build_at(
        pods: Vec<PodRecord>,
        deployments: Vec<DeploymentRecord>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let containers: Readiness = pods.iter().map(PodRecord::readiness).sum();
        let replicas: Readiness = deployments.iter().map(DeploymentRecord::readiness).sum();

        Self {
            pods,
            deployments,
            total_containers: containers.total,
            ready_containers: containers.ready,
            container_percentage: containers.percentage(),
            total_replicas: replicas.total,
            ready_replicas: replicas.ready,
            replica_percentage: replicas.percentage(),
            last_updated,
        }
    }

    pub fn empty() -> Self {
        Self::build(Vec::new(), Vec::new())
    }

    /// Restrict the snapshot to one namespace, recomputing totals
    ///
    /// An empty namespace means all namespaces and yields an identical copy.
    pub fn scoped(&self, namespace: &str) -> Self {
        if namespace.is_empty() {
            return self.clone();
        }

        let pods = self
            .pods
            .iter()
            .filter(|p| p.namespace == namespace)
            .cloned()
            .collect();
        let deployments = self
            .deployments
            .iter()
            .filter(|d| d.namespace == namespace)
            .cloned()
            .collect();

        Self::build_at(pods, deployments, self.last_updated)
    }

    pub fn containers(&self) -> Readiness {
        Readiness::new(self.ready_containers, self.total_containers)
    }

    pub fn replicas(&self) -> Readiness {
        Readiness::new(self.ready_replicas, self.total_replicas)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures talking to the cluster data source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The cluster cannot be reached or refused our credentials
    #[error("cluster unavailable: {0}")]
    Unavailable(String),

    /// A watch session ended; the watcher reconnects
    #[error("watch stream closed: {0}")]
    WatchStreamClosed(String),

    #[error("cluster did not answer within {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    pub fn unavailable(err: impl fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}
