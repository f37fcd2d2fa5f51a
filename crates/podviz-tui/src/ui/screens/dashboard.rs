use chrono::Utc;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::app::DashboardState;
use crate::ui::components::{ReadinessList, ReadinessRow, StatusBar, dashboard_hints};
use crate::ui::{Layout, Theme};
use podviz_types::Readiness;

/// Live cluster readiness dashboard
pub struct DashboardScreen;

impl DashboardScreen {
    pub fn render(frame: &mut Frame, state: &DashboardState) {
        let areas = Layout::dashboard(frame.area());

        Self::render_header(frame, areas.header, state);

        let (containers, replicas) = state
            .snapshot
            .as_deref()
            .map(|s| (s.containers(), s.replicas()))
            .unwrap_or_default();
        Self::render_gauge(frame, areas.containers_gauge, "Containers running", containers);
        Self::render_gauge(frame, areas.replicas_gauge, "Replicas ready", replicas);

        let pod_rows = state
            .visible_pods()
            .into_iter()
            .map(|pod| {
                let phase = pod.phase();
                ReadinessRow {
                    symbol: pod.status_symbol.clone(),
                    label: format!("{}/{}", pod.namespace, pod.name),
                    readiness: pod.readiness(),
                    style: Theme::phase(&phase),
                }
            })
            .collect();
        frame.render_widget(
            ReadinessList::new("Pods", pod_rows).offset(state.scroll),
            areas.pods,
        );

        let deployment_rows = state
            .visible_deployments()
            .into_iter()
            .map(|deploy| ReadinessRow {
                symbol: "📦".to_string(),
                label: format!("{}/{}", deploy.namespace, deploy.name),
                readiness: deploy.readiness(),
                style: Theme::text(),
            })
            .collect();
        frame.render_widget(
            ReadinessList::new("Deployments", deployment_rows).offset(state.scroll),
            areas.deployments,
        );

        Self::render_status_bar(frame, areas.status, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
        let mut spans = vec![
            Span::styled("podviz", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.scope_label().to_string(), Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.age_label(Utc::now()), Theme::text()),
        ];
        if state.unready_only {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("unready only", Theme::text_highlight()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_gauge(frame: &mut Frame, area: Rect, title: &str, readiness: Readiness) {
        let pct = readiness.percentage();
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(format!(" {} ", title))
                    .title_style(Theme::title())
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .gauge_style(Theme::gauge(pct))
            .ratio(pct / 100.0)
            .label(format!("{}/{} ({:.1}%)", readiness.ready, readiness.total, pct));
        frame.render_widget(gauge, area);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &DashboardState) {
        match &state.error_message {
            Some(message) => {
                let line = Paragraph::new(Line::from(vec![
                    Span::styled(" ERROR ", Theme::error()),
                    Span::styled(message.clone(), Theme::text()),
                ]));
                frame.render_widget(line, area);
            }
            None => {
                let bar = StatusBar::new()
                    .hints(dashboard_hints())
                    .right(format!("{} updates", state.updates));
                frame.render_widget(bar, area);
            }
        }
    }
}
