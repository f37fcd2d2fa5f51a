//! One-shot text report for `podviz show`

use std::fmt::{self, Write};

use podviz_types::{ClusterSnapshot, Readiness};

pub const BLOCK: char = '█';
pub const EMPTY: char = '░';

/// Width of the summary progress bars
const SUMMARY_WIDTH: usize = 50;

/// One block per unit: filled for ready units, empty for the rest
pub fn unit_blocks(readiness: Readiness) -> String {
    let total = readiness.total.max(0) as usize;
    let ready = (readiness.ready.max(0) as usize).min(total);
    let mut out = String::with_capacity(total * 3);
    out.extend(std::iter::repeat_n(BLOCK, ready));
    out.extend(std::iter::repeat_n(EMPTY, total - ready));
    out
}

/// Fixed-width progress bar for a percentage
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((width as f64) * percentage.clamp(0.0, 100.0) / 100.0) as usize;
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat_n(BLOCK, filled));
    out.extend(std::iter::repeat_n(EMPTY, width - filled));
    out
}

/// Plain-text readiness report of a snapshot
pub struct Report<'a> {
    snapshot: &'a ClusterSnapshot,
}

impl<'a> Report<'a> {
    pub fn new(snapshot: &'a ClusterSnapshot) -> Self {
        Self { snapshot }
    }

    fn write_pods(&self, out: &mut impl Write) -> fmt::Result {
        let pods = &self.snapshot.pods;
        if pods.is_empty() {
            return writeln!(out, "No pods found.");
        }

        writeln!(out, "Pods Overview ({} total)", pods.len())?;
        writeln!(out, "{}", "-".repeat(40))?;
        for pod in pods {
            writeln!(
                out,
                "{} {}/{}: {} ({}/{} containers ready)",
                pod.status_symbol,
                pod.namespace,
                pod.name,
                unit_blocks(pod.readiness()),
                pod.ready_containers,
                pod.container_count,
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Container Summary:")?;
        writeln!(
            out,
            "Running: {}/{} ({:.1}%) [{}]",
            self.snapshot.ready_containers,
            self.snapshot.total_containers,
            self.snapshot.container_percentage,
            progress_bar(self.snapshot.container_percentage, SUMMARY_WIDTH),
        )
    }

    fn write_deployments(&self, out: &mut impl Write) -> fmt::Result {
        let deployments = &self.snapshot.deployments;
        if deployments.is_empty() {
            return writeln!(out, "No deployments found.");
        }

        writeln!(out, "Deployments Overview ({} total)", deployments.len())?;
        writeln!(out, "{}", "-".repeat(40))?;
        for deploy in deployments {
            writeln!(
                out,
                "📦 {}/{}: {} ({} replicas ready)",
                deploy.namespace,
                deploy.name,
                unit_blocks(deploy.readiness()),
                deploy.replica_status(),
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Replica Summary:")?;
        writeln!(
            out,
            "Ready: {}/{} ({:.1}%) [{}]",
            self.snapshot.ready_replicas,
            self.snapshot.total_replicas,
            self.snapshot.replica_percentage,
            progress_bar(self.snapshot.replica_percentage, SUMMARY_WIDTH),
        )
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pod Visualizer - Kubernetes Container Overview")?;
        writeln!(f, "{}", "=".repeat(44))?;
        self.write_pods(f)?;
        writeln!(f)?;
        self.write_deployments(f)
    }
}
