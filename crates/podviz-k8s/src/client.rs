use std::fmt::Debug;
use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, WatchEvent as KubeWatchEvent, WatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;

use crate::source::{ClusterSource, WatchEvent, WatchEventKind, WatchStream};
use podviz_types::{DeploymentRecord, PodRecord, ResourceKind, SourceError};

/// How to locate cluster credentials
#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
    /// Explicit kubeconfig path (defaults to `~/.kube/config`)
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,
}

/// Kubernetes client wrapper
#[derive(Clone)]
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    /// Connect using in-cluster credentials when running inside a pod,
    /// falling back to the kubeconfig otherwise
    ///
    /// Explicit options skip the in-cluster attempt.
    pub async fn connect(options: &ClientOptions) -> Result<Self> {
        let config = if options.kubeconfig.is_none() && options.context.is_none() {
            match kube::Config::incluster() {
                Ok(config) => {
                    tracing::debug!("using in-cluster configuration");
                    config
                }
                Err(e) => {
                    tracing::debug!(error = %e, "not running in cluster, reading kubeconfig");
                    kube::Config::infer()
                        .await
                        .context("Failed to load kubeconfig. Is kubectl configured?")?
                }
            }
        } else {
            let kubeconfig = match &options.kubeconfig {
                Some(path) => Kubeconfig::read_from(path)
                    .context(format!("Failed to read kubeconfig {}", path.display()))?,
                None => Kubeconfig::read()
                    .context("Failed to read kubeconfig. Is kubectl configured?")?,
            };

            kube::Config::from_custom_kubeconfig(
                kubeconfig,
                &KubeConfigOptions {
                    context: options.context.clone(),
                    ..Default::default()
                },
            )
            .await
            .context(format!(
                "Failed to create config for context: {}",
                options.context.as_deref().unwrap_or("<current>")
            ))?
        };

        let client = kube::Client::try_from(config).context("Failed to create client")?;

        Ok(Self { client })
    }

    fn scoped_api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }

    async fn watch_all<K>(&self, resource: ResourceKind) -> Result<WatchStream, SourceError>
    where
        K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let stream = api
            .watch(&WatchParams::default(), "0")
            .await
            .map_err(SourceError::unavailable)?;

        Ok(stream
            .map(move |event| match event {
                Ok(event) => Ok(convert_event(resource, event)),
                Err(e) => Err(SourceError::WatchStreamClosed(e.to_string())),
            })
            .boxed())
    }
}

impl ClusterSource for KubeClient {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, SourceError> {
        let pods: Api<Pod> = self.scoped_api(namespace);
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| SourceError::Unavailable(format!("failed to list pods: {e}")))?;

        Ok(list.items.into_iter().map(pod_to_record).collect())
    }

    async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentRecord>, SourceError> {
        let deployments: Api<Deployment> = self.scoped_api(namespace);
        let list = deployments
            .list(&ListParams::default())
            .await
            .map_err(|e| SourceError::Unavailable(format!("failed to list deployments: {e}")))?;

        Ok(list.items.into_iter().map(deployment_to_record).collect())
    }

    async fn watch(&self, kind: ResourceKind) -> Result<WatchStream, SourceError> {
        match kind {
            ResourceKind::Pod => self.watch_all::<Pod>(kind).await,
            ResourceKind::Deployment => self.watch_all::<Deployment>(kind).await,
        }
    }
}

fn convert_event<K: Resource>(resource: ResourceKind, event: KubeWatchEvent<K>) -> WatchEvent {
    match event {
        KubeWatchEvent::Added(obj) => {
            WatchEvent::new(WatchEventKind::Added, resource).named(obj.name_any())
        }
        KubeWatchEvent::Modified(obj) => {
            WatchEvent::new(WatchEventKind::Modified, resource).named(obj.name_any())
        }
        KubeWatchEvent::Deleted(obj) => {
            WatchEvent::new(WatchEventKind::Deleted, resource).named(obj.name_any())
        }
        _ => WatchEvent::new(WatchEventKind::Other, resource),
    }
}

/// Convert a k8s Pod to a PodRecord
pub(crate) fn pod_to_record(pod: Pod) -> PodRecord {
    let name = pod.metadata.name.unwrap_or_default();
    let namespace = pod.metadata.namespace.unwrap_or_default();

    let container_count = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.len() as u32)
        .unwrap_or(0);

    let (phase, ready_containers) = match pod.status {
        Some(status) => {
            let ready = status
                .container_statuses
                .unwrap_or_default()
                .iter()
                .filter(|cs| cs.ready)
                .count() as u32;
            (status.phase, ready)
        }
        None => (None, 0),
    };

    PodRecord::new(
        name,
        namespace,
        phase.unwrap_or_else(|| "Unknown".to_string()),
        container_count,
        ready_containers,
    )
}

/// Convert a k8s Deployment to a DeploymentRecord
pub(crate) fn deployment_to_record(deploy: Deployment) -> DeploymentRecord {
    let name = deploy.metadata.name.unwrap_or_default();
    let namespace = deploy.metadata.namespace.unwrap_or_default();
    let mut record = DeploymentRecord::new(name, namespace);

    // The API server defaults an unset replica count to 1
    record.replicas = deploy.spec.and_then(|s| s.replicas).unwrap_or(1);

    if let Some(status) = deploy.status {
        record.ready_replicas = status.ready_replicas.unwrap_or(0);
        record.available_replicas = status.available_replicas.unwrap_or(0);
    }

    record
}
