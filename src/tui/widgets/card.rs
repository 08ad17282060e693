//! Rounded bordered detector card, with an optional meter on its last row.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::tui::theme::Theme;
use crate::tui::widgets::gauge;

pub(crate) struct CardWidget<'a> {
    pub title: &'a str,
    pub lines: Vec<Line<'a>>,
    pub badge: Option<(String, Color)>,
    pub border_color: Option<Color>,
    pub meter: Option<(&'a str, u8)>,
    pub focused: bool,
}

impl<'a> CardWidget<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            lines: Vec::new(),
            badge: None,
            border_color: None,
            meter: None,
            focused: false,
        }
    }

    pub fn line(mut self, line: Line<'a>) -> Self {
        self.lines.push(line);
        self
    }

    pub fn badge(mut self, label: impl Into<String>, color: Color) -> Self {
        self.badge = Some((label.into(), color));
        self
    }

    pub fn border_color(mut self, color: Color) -> Self {
        self.border_color = Some(color);
        self
    }

    pub fn meter(mut self, label: &'a str, percent: u8) -> Self {
        self.meter = Some((label, percent));
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn render(self, area: Rect, f: &mut ratatui::Frame, theme: &Theme) {
        let border_col = self.border_color.unwrap_or(theme.border);

        let mut title_style = Style::default().fg(theme.text).add_modifier(Modifier::BOLD);
        if self.focused {
            title_style = title_style.fg(theme.oracle);
        }
        let mut title_spans = vec![Span::styled(self.title, title_style)];

        if let Some((badge_text, badge_color)) = self.badge {
            title_spans.push(Span::raw("  "));
            title_spans.push(Span::styled(
                badge_text,
                Style::default()
                    .fg(badge_color)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let block = Block::default()
            .title(Line::from(title_spans))
            .borders(Borders::ALL)
            .border_type(if self.focused {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(Style::default().fg(border_col));

        let inner = block.inner(area);
        f.render_widget(block, area);

        let (body, meter_area) = match self.meter {
            Some(_) if inner.height > 1 => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(1)])
                    .split(inner);
                (rows[0], Some(rows[1]))
            }
            _ => (inner, None),
        };

        let para = Paragraph::new(Text::from(self.lines)).wrap(Wrap { trim: true });
        f.render_widget(para, body);

        if let (Some((label, percent)), Some(meter_area)) = (self.meter, meter_area) {
            gauge::draw_gauge(meter_area, f, theme, label, percent);
        }
    }
}
