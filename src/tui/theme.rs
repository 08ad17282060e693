//! TUI color theme.

use ratatui::style::Color;

use crate::detect::Status;

#[derive(Clone, Copy)]
pub(crate) struct Theme {
    // Primary palette
    pub oracle: Color,
    pub optimal: Color,
    pub caution: Color,
    pub critical: Color,

    // UI chrome
    pub border: Color,
    pub muted: Color,
    pub text: Color,
    pub text_dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            oracle: Color::Rgb(0, 212, 255),
            optimal: Color::Rgb(163, 230, 53),
            caution: Color::Rgb(251, 191, 36),
            critical: Color::Rgb(255, 68, 85),
            border: Color::Gray,
            muted: Color::DarkGray,
            text: Color::White,
            text_dim: Color::Gray,
        }
    }
}

impl Theme {
    pub fn status_color(&self, status: &Status) -> Color {
        match status {
            Status::Pending => self.oracle,
            Status::Ready => self.optimal,
            Status::Warning(_) | Status::Unknown => self.caution,
            Status::Error(_) => self.critical,
        }
    }

    pub fn meter_color(&self, percent: u8) -> Color {
        if percent >= 70 {
            self.optimal
        } else if percent >= 40 {
            self.oracle
        } else if percent >= 15 {
            self.caution
        } else {
            self.critical
        }
    }
}
