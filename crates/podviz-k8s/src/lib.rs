//! Kubernetes data source for podviz
//!
//! This crate reads pods and deployments from the cluster and opens watch
//! sessions on them. The [`ClusterSource`] trait is the boundary the sync
//! engine consumes; [`KubeClient`] is the production implementation.

mod client;
mod source;

pub use client::{ClientOptions, KubeClient};
pub use source::{probe, ClusterSource, WatchEvent, WatchEventKind, WatchStream};

// Re-export types that are used in our public API
pub use podviz_types::{
    ClusterSnapshot, DeploymentRecord, PodRecord, ResourceKind, SourceError,
};
