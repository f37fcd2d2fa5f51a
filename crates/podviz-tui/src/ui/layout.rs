use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for the dashboard
pub struct Layout;

pub struct DashboardAreas {
    pub header: Rect,
    pub containers_gauge: Rect,
    pub replicas_gauge: Rect,
    pub pods: Rect,
    pub deployments: Rect,
    pub status: Rect,
}

impl Layout {
    /// Header, two gauges, side-by-side resource lists and a status bar
    pub fn dashboard(area: Rect) -> DashboardAreas {
        let rows = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Containers gauge
                Constraint::Length(3), // Replicas gauge
                Constraint::Min(1),    // Resource lists
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let lists = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[3]);

        DashboardAreas {
            header: rows[0],
            containers_gauge: rows[1],
            replicas_gauge: rows[2],
            pods: lists[0],
            deployments: lists[1],
            status: rows[4],
        }
    }
}
