use ratatui::style::{Color, Modifier, Style};

use podviz_types::PodPhase;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn phase(phase: &PodPhase) -> Style {
        let color = match phase {
            PodPhase::Running | PodPhase::Succeeded => Self::SUCCESS,
            PodPhase::Pending => Self::WARNING,
            PodPhase::Failed => Self::ERROR,
            PodPhase::Unknown => Self::FG_DIM,
        };
        Style::default().fg(color)
    }

    /// Gauge color by readiness percentage
    pub fn gauge(percentage: f64) -> Style {
        let color = if percentage >= 100.0 {
            Self::SUCCESS
        } else if percentage >= 50.0 {
            Self::WARNING
        } else {
            Self::ERROR
        };
        Style::default().fg(color).bg(Color::Black)
    }

    pub fn bar_filled() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn bar_empty() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Error
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}
