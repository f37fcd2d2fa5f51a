use std::fmt::Display;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use podviz_k8s::{ClusterSource, probe};
use podviz_sync::fetch_snapshot;
use podviz_types::ClusterSnapshot;

use crate::AppState;
use crate::error::ApiError;

/// `?namespace=` filter; empty means all namespaces
#[derive(Debug, Default, Deserialize)]
pub struct ClusterQuery {
    #[serde(default)]
    pub namespace: String,
}

/// Body of health, readiness and error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl StatusBody {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_error(mut self, err: impl Display) -> Self {
        self.error = Some(err.to_string());
        self
    }
}

pub async fn get_cluster<S: ClusterSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<ClusterQuery>,
) -> Result<Json<ClusterSnapshot>, ApiError> {
    let snapshot = fetch_snapshot(state.source.as_ref(), &query.namespace).await?;
    Ok(Json(snapshot))
}

pub async fn health() -> Json<StatusBody> {
    Json(StatusBody::new("healthy"))
}

pub async fn ready<S: ClusterSource>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<StatusBody>) {
    match probe(state.source.as_ref(), state.probe_timeout).await {
        Ok(()) => (StatusCode::OK, Json(StatusBody::new("ready"))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusBody::new("not ready").with_error(e)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    use crate::test_support::state;

    #[tokio::test]
    async fn test_health_is_always_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "healthy");
        assert!(body.error.is_none());
    }

    #[tokio::test]
    async fn test_ready_when_cluster_answers() {
        let (status, Json(body)) = ready(State(state(true))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
    }

    #[tokio::test]
    async fn test_not_ready_when_cluster_fails() {
        let (status, Json(body)) = ready(State(state(false))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "not ready");
        assert!(body.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_cluster_snapshot_for_all_namespaces() {
        let Json(snapshot) = get_cluster(State(state(true)), Query(ClusterQuery::default()))
            .await
            .unwrap();

        assert_eq!(snapshot.pods.len(), 3);
        assert_eq!(snapshot.total_containers, 5);
        assert_eq!(snapshot.ready_containers, 4);
        assert_eq!(snapshot.total_replicas, 3);
        assert_eq!(snapshot.ready_replicas, 1);
    }

    #[tokio::test]
    async fn test_cluster_snapshot_for_one_namespace() {
        let query = ClusterQuery {
            namespace: "kube-system".to_string(),
        };
        let Json(snapshot) = get_cluster(State(state(true)), Query(query)).await.unwrap();

        assert_eq!(snapshot.pods.len(), 1);
        assert_eq!(snapshot.container_percentage, 100.0);
        assert!(snapshot.deployments.is_empty());
        assert_eq!(snapshot.replica_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_cluster_failure_is_server_error() {
        let err = get_cluster(State(state(false)), Query(ClusterQuery::default()))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
