use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use podviz_types::Readiness;

use crate::report::{BLOCK, EMPTY};
use crate::ui::Theme;

/// Widest bar drawn for one resource; larger counts are scaled down
const MAX_BAR_UNITS: usize = 12;

/// One resource line in a list
pub struct ReadinessRow {
    pub symbol: String,
    pub label: String,
    pub readiness: Readiness,
    pub style: Style,
}

/// Bordered list of resources with per-row readiness bars
pub struct ReadinessList {
    title: String,
    rows: Vec<ReadinessRow>,
    offset: usize,
}

impl ReadinessList {
    pub fn new(title: impl Into<String>, rows: Vec<ReadinessRow>) -> Self {
        Self {
            title: title.into(),
            rows,
            offset: 0,
        }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Truncate `label` to at most `width` display columns
fn fit_label(label: &str, width: usize) -> String {
    if label.width() <= width {
        return format!("{label:<width$}");
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in label.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

/// (filled, empty) block counts for a row bar
fn bar_units(readiness: Readiness) -> (usize, usize) {
    let total = readiness.total.max(0) as usize;
    let ready = (readiness.ready.max(0) as usize).min(total);
    if total <= MAX_BAR_UNITS {
        return (ready, total - ready);
    }
    let filled = ready * MAX_BAR_UNITS / total;
    (filled, MAX_BAR_UNITS - filled)
}

impl Widget for ReadinessList {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ({}) ", self.title, self.rows.len()))
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner_width = area.width.saturating_sub(2) as usize;
        // symbol (2) + spaces + bar + count
        let label_width = inner_width.saturating_sub(2 + 1 + MAX_BAR_UNITS + 1 + 7).max(8);

        let lines: Vec<Line> = if self.rows.is_empty() {
            vec![Line::from(Span::styled("Nothing to show", Theme::text_dim()))]
        } else {
            self.rows
                .iter()
                .skip(self.offset)
                .map(|row| {
                    let (filled, empty) = bar_units(row.readiness);
                    Line::from(vec![
                        Span::raw(format!("{} ", row.symbol)),
                        Span::styled(fit_label(&row.label, label_width), row.style),
                        Span::raw(" "),
                        Span::styled(BLOCK.to_string().repeat(filled), Theme::bar_filled()),
                        Span::styled(EMPTY.to_string().repeat(empty), Theme::bar_empty()),
                        Span::styled(
                            format!(" {}/{}", row.readiness.ready, row.readiness.total),
                            Theme::text(),
                        ),
                    ])
                })
                .collect()
        };

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
