//! Top bar: title, focused card, and how many cards have settled.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::detect::{DetectionResult, Status};
use crate::tui::theme::Theme;

/// Card counts by outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tally {
    pub ready: usize,
    pub pending: usize,
    /// Warnings, unknowns and errors.
    pub attention: usize,
}

impl Tally {
    pub fn of(reports: &[DetectionResult]) -> Self {
        reports.iter().fold(Self::default(), |mut tally, report| {
            match report.status {
                Status::Ready => tally.ready += 1,
                Status::Pending => tally.pending += 1,
                Status::Warning(_) | Status::Unknown | Status::Error(_) => tally.attention += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> usize {
        self.ready + self.pending + self.attention
    }
}

pub(crate) fn draw_header(
    area: Rect,
    f: &mut ratatui::Frame,
    theme: &Theme,
    focused: &str,
    tally: Tally,
    spinner: char,
) {
    let mut spans = vec![
        Span::styled(
            "DEVICE INSPECTOR",
            Style::default()
                .fg(theme.oracle)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  //  {}", focused.to_uppercase()),
            Style::default().fg(theme.text_dim),
        ),
        Span::styled(
            format!("   {}/{} ready", tally.ready, tally.total()),
            Style::default().fg(theme.optimal),
        ),
    ];
    if tally.pending > 0 {
        spans.push(Span::styled(
            format!("  {spinner} {} detecting", tally.pending),
            Style::default().fg(theme.oracle),
        ));
    }
    if tally.attention > 0 {
        spans.push(Span::styled(
            format!("  {} need attention", tally.attention),
            Style::default().fg(theme.caution),
        ));
    }

    let rule = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(theme.border),
    ));

    f.render_widget(Paragraph::new(vec![Line::from(spans), rule]), area);
}
