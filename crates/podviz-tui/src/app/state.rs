use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::Action;
use podviz_types::{ClusterSnapshot, DeploymentRecord, PodRecord};

/// State of the live dashboard
pub struct DashboardState {
    /// Latest snapshot, already scoped to `namespace`
    pub snapshot: Option<Arc<ClusterSnapshot>>,

    /// Namespace filter (empty = all namespaces)
    pub namespace: String,

    /// First visible row in the resource lists
    pub scroll: usize,

    /// Hide resources that are fully ready?
    pub unready_only: bool,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Number of snapshots received so far
    pub updates: u64,

    pub should_quit: bool,
}

impl DashboardState {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            snapshot: None,
            namespace: namespace.into(),
            scroll: 0,
            unready_only: false,
            error_message: None,
            updates: 0,
            should_quit: false,
        }
    }

    /// Take in a snapshot from the shared feed
    pub fn update(&mut self, snapshot: Arc<ClusterSnapshot>) {
        let scoped = if self.namespace.is_empty() {
            snapshot
        } else {
            Arc::new(snapshot.scoped(&self.namespace))
        };
        self.snapshot = Some(scoped);
        self.updates += 1;
        self.error_message = None;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ScrollUp(n) => self.scroll = self.scroll.saturating_sub(n),
            Action::ScrollDown(n) => {
                self.scroll = self.scroll.saturating_add(n).min(self.max_scroll());
            }
            Action::ScrollToTop => self.scroll = 0,
            Action::ToggleUnreadyOnly => {
                self.unready_only = !self.unready_only;
                self.scroll = 0;
            }
            Action::DismissError => self.error_message = None,
        }
    }

    pub fn visible_pods(&self) -> Vec<&PodRecord> {
        self.snapshot
            .as_deref()
            .map(|s| {
                s.pods
                    .iter()
                    .filter(|p| !self.unready_only || !p.readiness().is_complete())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn visible_deployments(&self) -> Vec<&DeploymentRecord> {
        self.snapshot
            .as_deref()
            .map(|s| {
                s.deployments
                    .iter()
                    .filter(|d| !self.unready_only || !d.readiness().is_complete())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn max_scroll(&self) -> usize {
        let rows = self.visible_pods().len().max(self.visible_deployments().len());
        rows.saturating_sub(1)
    }

    /// "updated 12s ago" style label for the header
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        match &self.snapshot {
            None => "waiting for data".to_string(),
            Some(s) => {
                let secs = (now - s.last_updated).num_seconds().max(0);
                format!("updated {}s ago", secs)
            }
        }
    }

    pub fn scope_label(&self) -> &str {
        if self.namespace.is_empty() {
            "all namespaces"
        } else {
            &self.namespace
        }
    }
}
