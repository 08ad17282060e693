//! Fullscreen terminal dashboard (TUI).
//!
//! The loop never blocks on a detector: each frame polls every detector for
//! deferred results, position reports and clock ticks, then redraws.

pub(crate) mod animation;
pub(crate) mod input;
pub(crate) mod screens;
pub(crate) mod state;
pub(crate) mod theme;
pub(crate) mod widgets;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Terminal;

use crate::config::Config;
use crate::platform::Platform;
use state::App;
use theme::Theme;

const FRAME_TIME: Duration = Duration::from_millis(16);

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

pub(crate) fn run_tui(platform: &Platform, config: &Config) -> Result<()> {
    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(platform, config);
    let result = event_loop(&mut terminal, &mut app);
    app.shutdown();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.poll();
        terminal.draw(|f| draw(f.area(), f, app))?;

        let timeout = FRAME_TIME.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && input::handle_key(app, key)? {
                    return Ok(());
                }
            }
        }

        if app.last_tick.elapsed() >= FRAME_TIME {
            app.last_tick = Instant::now();
            app.animation.advance();
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, app: &App) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(0),    // cards
            Constraint::Length(1), // footer
        ])
        .split(area);

    let tally = widgets::header::Tally::of(&app.detectors.reports());
    widgets::header::draw_header(
        layout[0],
        f,
        &theme,
        app.focused_title(),
        tally,
        app.animation.spinner_char(),
    );
    screens::dashboard::draw_dashboard(layout[1], f, app, theme);
    widgets::footer::draw_footer(layout[2], f, &theme, input::HINTS, app.status.as_deref());
}
