//! Horizontal percent gauge bar.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::theme::Theme;

/// Cells filled for `percent` of `width`.
pub(crate) fn filled_cells(percent: u8, width: usize) -> usize {
    width * usize::from(percent.min(100)) / 100
}

pub(crate) fn draw_gauge(
    area: Rect,
    f: &mut ratatui::Frame,
    theme: &Theme,
    label: &str,
    percent: u8,
) {
    let label_width = label.chars().count() + 1;
    let suffix_str = format!(" {:>3}%", percent.min(100));
    let bar_width = (area.width as usize)
        .saturating_sub(label_width)
        .saturating_sub(suffix_str.len());

    let filled = filled_cells(percent, bar_width);
    let empty = bar_width.saturating_sub(filled);

    let line = Line::from(vec![
        Span::styled(format!("{label} "), Style::default().fg(theme.text_dim)),
        Span::styled(
            "█".repeat(filled),
            Style::default().fg(theme.meter_color(percent)),
        ),
        Span::styled("░".repeat(empty), Style::default().fg(theme.muted)),
        Span::styled(suffix_str, Style::default().fg(theme.text)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}
