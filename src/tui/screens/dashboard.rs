//! Six-card dashboard grid.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::detect::{DetectionResult, Status};
use crate::report::status_label;
use crate::tui::state::{App, CARD_COUNT};
use crate::tui::theme::Theme;
use crate::tui::widgets::card::CardWidget;

const LABEL_WIDTH: usize = 14;

/// (columns, rows) for the available width.
pub(crate) fn grid_shape(width: u16) -> (usize, usize) {
    if width >= 150 {
        (3, 2)
    } else if width >= 90 {
        (2, 3)
    } else {
        (1, CARD_COUNT)
    }
}

pub(crate) fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, app: &App, theme: Theme) {
    let (cols, rows) = grid_shape(area.width);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    let reports = app.detectors.reports();
    let spinner = app.animation.spinner_char();

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, cols as u32); cols])
            .split(*row_area);
        for (col, cell) in cells.iter().enumerate() {
            let index = row * cols + col;
            if let Some(report) = reports.get(index) {
                draw_card(*cell, f, report, index == app.focus, spinner, &theme);
            }
        }
    }
}

fn field_line<'a>(label: &str, value: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{:<LABEL_WIDTH$}", format!("{label}:")),
            Style::default().fg(theme.text_dim),
        ),
        Span::styled(value, Style::default().fg(theme.text)),
    ])
}

fn draw_card(
    area: Rect,
    f: &mut ratatui::Frame,
    report: &DetectionResult,
    focused: bool,
    spinner: char,
    theme: &Theme,
) {
    let color = theme.status_color(&report.status);
    let badge = match report.status {
        Status::Pending => format!("{spinner} {}", status_label(&report.status)),
        _ => status_label(&report.status).to_string(),
    };

    let mut card = CardWidget::new(report.title)
        .badge(badge, color)
        .focused(focused);
    if focused || !matches!(report.status, Status::Ready) {
        card = card.border_color(if focused { theme.oracle } else { color });
    }

    for field in &report.fields {
        card = card.line(field_line(&field.label, &field.value, theme));
    }

    match &report.status {
        Status::Warning(message) | Status::Error(message) => {
            card = card.line(Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(color),
            )));
        }
        _ => {}
    }

    if let Some(details) = &report.details {
        card = card.line(Line::from("")).line(Line::from(Span::styled(
            "Details",
            Style::default()
                .fg(theme.oracle)
                .add_modifier(Modifier::BOLD),
        )));
        for field in details {
            card = card.line(field_line(&field.label, &field.value, theme));
        }
    }

    if let Some(meter) = &report.meter {
        card = card.meter(&meter.label, meter.percent);
    }

    card.render(area, f, theme);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_collapses_on_narrow_terminals() {
        assert_eq!(grid_shape(200), (3, 2));
        assert_eq!(grid_shape(100), (2, 3));
        assert_eq!(grid_shape(60), (1, 6));
        let (cols, rows) = grid_shape(100);
        assert_eq!(cols * rows, CARD_COUNT);
    }
}
