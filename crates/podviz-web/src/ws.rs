use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};

use podviz_k8s::ClusterSource;
use podviz_sync::{SubscriberId, Subscription, fetch_snapshot};
use podviz_types::ClusterSnapshot;

use crate::AppState;
use crate::handlers::ClusterQuery;

/// A client that accepts no frame for this long is disconnected
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn ws_handler<S: ClusterSource>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
    Query(query): Query<ClusterQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.namespace))
}

/// Serialize a snapshot as one websocket frame, scoped to `namespace`
pub fn render_frame(snapshot: &ClusterSnapshot, namespace: &str) -> serde_json::Result<String> {
    if namespace.is_empty() {
        serde_json::to_string(snapshot)
    } else {
        serde_json::to_string(&snapshot.scoped(namespace))
    }
}

async fn handle_socket<S: ClusterSource>(socket: WebSocket, state: AppState<S>, namespace: String) {
    let subscription = state.hub.register();
    let (sender, receiver) = socket.split();
    run_socket(subscription, sender, receiver, state, namespace, SEND_TIMEOUT).await;
}

/// Push snapshots to one viewer until it leaves, stalls, is dropped by the
/// hub or the server shuts down
async fn run_socket<S, W, R, E>(
    mut subscription: Subscription,
    mut sender: W,
    mut receiver: R,
    state: AppState<S>,
    namespace: String,
    send_timeout: Duration,
) where
    S: ClusterSource,
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let id = subscription.id();

    // First frame: latest published snapshot, or a fresh read before the
    // first publish has happened
    let initial = match state.hub.latest() {
        Some(snapshot) => Some(snapshot),
        None => match fetch_snapshot(state.source.as_ref(), "").await {
            Ok(snapshot) => Some(Arc::new(snapshot)),
            Err(e) => {
                tracing::debug!(subscriber = %id, error = %e, "no initial snapshot");
                None
            }
        },
    };

    let mut open = true;
    let mut last_sent = None;
    if let Some(snapshot) = initial {
        open = deliver(&mut sender, &snapshot, &namespace, &state, send_timeout, id).await;
        last_sent = Some(snapshot);
    }

    while open {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            outbound = subscription.recv() => match outbound {
                Some(snapshot) => {
                    // Published between registration and the initial frame
                    if last_sent.as_ref().is_some_and(|sent| Arc::ptr_eq(sent, &snapshot)) {
                        continue;
                    }
                    open = deliver(&mut sender, &snapshot, &namespace, &state, send_timeout, id).await;
                    last_sent = Some(snapshot);
                }
                None => {
                    tracing::debug!(subscriber = %id, "dropped by hub");
                    break;
                }
            },

            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(subscriber = %id, error = %e, "websocket read failed");
                    break;
                }
            },
        }
    }

    state.hub.unregister(id);
    let _ = tokio::time::timeout(send_timeout, sender.close()).await;
}

/// Send one frame; `false` when the connection should be closed
async fn deliver<S, W>(
    sender: &mut W,
    snapshot: &ClusterSnapshot,
    namespace: &str,
    state: &AppState<S>,
    send_timeout: Duration,
    id: SubscriberId,
) -> bool
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let frame = match render_frame(snapshot, namespace) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(subscriber = %id, error = %e, "failed to encode snapshot");
            return false;
        }
    };

    tokio::select! {
        _ = state.shutdown.cancelled() => false,
        sent = tokio::time::timeout(send_timeout, sender.send(Message::Text(frame.into()))) => {
            match sent {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::debug!(subscriber = %id, error = %e, "websocket send failed");
                    false
                }
                Err(_) => {
                    tracing::warn!(subscriber = %id, timeout = ?send_timeout, "websocket client stalled, closing");
                    false
                }
            }
        }
    }
}
