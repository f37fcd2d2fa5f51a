//! In-memory cluster source for engine tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;

use podviz_k8s::{ClusterSource, WatchEvent, WatchStream};
use podviz_types::{DeploymentRecord, PodRecord, ResourceKind, SourceError};

/// How one watch session behaves
#[derive(Clone, Debug)]
pub enum Session {
    /// Opening the session fails
    Refuse,
    /// Session opens and ends right away
    Close,
    /// Session yields these events, then ends
    Events(Vec<WatchEvent>),
    /// Session yields these events, then errors
    EventsThenError(Vec<WatchEvent>),
    /// Session opens and never yields
    Hang,
}

pub struct FakeSource {
    pods: Mutex<Vec<PodRecord>>,
    deployments: Mutex<Vec<DeploymentRecord>>,
    available: AtomicBool,
    sessions: Mutex<VecDeque<Session>>,
    fallback: Mutex<Session>,
    watch_attempts: AtomicUsize,
}

impl FakeSource {
    pub fn new(pods: Vec<PodRecord>, deployments: Vec<DeploymentRecord>) -> Self {
        Self {
            pods: Mutex::new(pods),
            deployments: Mutex::new(deployments),
            available: AtomicBool::new(true),
            sessions: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Session::Hang),
            watch_attempts: AtomicUsize::new(0),
        }
    }

    pub fn set_pods(&self, pods: Vec<PodRecord>) {
        *self.pods.lock() = pods;
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Queue scripted sessions, used in order before the fallback
    pub fn script(&self, sessions: impl IntoIterator<Item = Session>) {
        self.sessions.lock().extend(sessions);
    }

    /// Behaviour once the script is exhausted
    pub fn set_fallback(&self, session: Session) {
        *self.fallback.lock() = session;
    }

    pub fn watch_attempts(&self) -> usize {
        self.watch_attempts.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), SourceError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SourceError::Unavailable("connection refused".into()))
        }
    }
}

impl ClusterSource for FakeSource {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, SourceError> {
        self.check_available()?;
        Ok(self
            .pods
            .lock()
            .iter()
            .filter(|p| namespace.is_empty() || p.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentRecord>, SourceError> {
        self.check_available()?;
        Ok(self
            .deployments
            .lock()
            .iter()
            .filter(|d| namespace.is_empty() || d.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn watch(&self, _kind: ResourceKind) -> Result<WatchStream, SourceError> {
        self.watch_attempts.fetch_add(1, Ordering::SeqCst);
        let session = self
            .sessions
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().clone());

        match session {
            Session::Refuse => Err(SourceError::Unavailable("watch refused".into())),
            Session::Close => Ok(stream::empty().boxed()),
            Session::Events(events) => Ok(stream::iter(events.into_iter().map(Ok)).boxed()),
            Session::EventsThenError(events) => Ok(stream::iter(events.into_iter().map(Ok))
                .chain(stream::once(async {
                    Err(SourceError::WatchStreamClosed("connection reset".into()))
                }))
                .boxed()),
            Session::Hang => Ok(stream::pending().boxed()),
        }
    }
}
