//! HTTP and websocket backend for the podviz web dashboard
//!
//! Routes:
//! - `GET /api/cluster?namespace=` on-demand snapshot
//! - `GET /ws?namespace=` pushed snapshots
//! - `GET /health` liveness
//! - `GET /ready` cluster reachability

mod error;
mod handlers;
mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use podviz_k8s::ClusterSource;
use podviz_sync::BroadcastHub;

pub use error::ApiError;
pub use handlers::{ClusterQuery, StatusBody};
pub use ws::render_frame;

/// Shared state handed to every handler
pub struct AppState<S> {
    pub source: Arc<S>,
    pub hub: Arc<BroadcastHub>,
    pub probe_timeout: Duration,
    /// Cancelled on shutdown so open websockets close
    pub shutdown: CancellationToken,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            hub: Arc::clone(&self.hub),
            probe_timeout: self.probe_timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

pub fn router<S: ClusterSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/cluster", get(handlers::get_cluster::<S>))
        .route("/ws", get(ws::ws_handler::<S>))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard API until `state.shutdown` is cancelled
pub async fn serve<S: ClusterSource>(listener: TcpListener, state: AppState<S>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    let shutdown = state.shutdown.clone();

    tracing::info!("🌐 Dashboard available at http://{}", addr);
    tracing::info!("WebSocket endpoint available at ws://{}/ws", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use futures::StreamExt;

    use podviz_k8s::WatchStream;
    use podviz_types::{DeploymentRecord, PodRecord, ResourceKind, SourceError};

    pub struct StubSource {
        pub available: bool,
    }

    impl ClusterSource for StubSource {
        async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, SourceError> {
            if !self.available {
                return Err(SourceError::Unavailable("connection refused".into()));
            }
            Ok(vec![
                PodRecord::new("a", "default", "Running", 2, 2),
                PodRecord::new("b", "default", "Pending", 2, 1),
                PodRecord::new("dns", "kube-system", "Running", 1, 1),
            ]
            .into_iter()
            .filter(|p| namespace.is_empty() || p.namespace == namespace)
            .collect())
        }

        async fn list_deployments(
            &self,
            namespace: &str,
        ) -> Result<Vec<DeploymentRecord>, SourceError> {
            if !self.available {
                return Err(SourceError::Unavailable("connection refused".into()));
            }
            Ok(vec![DeploymentRecord::new("web", "default").with_replicas(1, 3)]
                .into_iter()
                .filter(|d| namespace.is_empty() || d.namespace == namespace)
                .collect())
        }

        async fn watch(&self, _kind: ResourceKind) -> Result<WatchStream, SourceError> {
            Ok(futures::stream::pending().boxed())
        }
    }

    pub fn state(available: bool) -> AppState<StubSource> {
        AppState {
            source: Arc::new(StubSource { available }),
            hub: Arc::new(BroadcastHub::default()),
            probe_timeout: Duration::from_secs(5),
            shutdown: CancellationToken::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use futures::StreamExt;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tower::ServiceExt;

    use podviz_types::{ClusterSnapshot, PodRecord};

    use crate::test_support::state;

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_ready_routes() {
        let (status, body) = get(router(state(true)), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = get(router(state(true)), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");

        let (status, body) = get(router(state(false)), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
    }

    #[tokio::test]
    async fn test_cluster_route_reads_requested_namespace() {
        let (status, body) = get(router(state(true)), "/api/cluster?namespace=default").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pods"].as_array().unwrap().len(), 2);
        assert_eq!(body["containerPercentage"], 75.0);

        let (status, body) = get(router(state(false)), "/api/cluster").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    fn frame(message: WsMessage) -> serde_json::Value {
        serde_json::from_str(message.to_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_websocket_feed_end_to_end() {
        let state = state(true);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, state.clone()));

        let (mut socket, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}/ws?namespace=default"))
                .await
                .unwrap();

        // Nothing published yet: the first frame is a fresh read
        let initial = frame(socket.next().await.unwrap().unwrap());
        assert_eq!(initial["pods"].as_array().unwrap().len(), 2);
        assert_eq!(initial["totalReplicas"], 3);

        state.hub.publish(Arc::new(ClusterSnapshot::build(
            vec![
                PodRecord::new("c", "default", "Running", 1, 1),
                PodRecord::new("d", "batch", "Running", 1, 1),
            ],
            Vec::new(),
        )));
        let pushed = frame(socket.next().await.unwrap().unwrap());
        assert_eq!(pushed["pods"].as_array().unwrap().len(), 1);
        assert_eq!(pushed["pods"][0]["name"], "c");

        // Shutdown closes the open socket and stops the server
        state.shutdown.cancel();
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(Ok(message)) = socket.next().await {
                if message.is_close() {
                    break;
                }
            }
        })
        .await;
        assert!(closed.is_ok());
        assert_eq!(state.hub.subscriber_count(), 0);
        server.await.unwrap().unwrap();
    }
}
