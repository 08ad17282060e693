//! Key handling for the dashboard.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::detect::geolocation::GeoState;
use crate::tui::state::App;

/// Key hints shown in the footer.
pub(crate) const HINTS: &[(&str, &str)] = &[
    ("Tab", "Focus"),
    ("R", "Refresh language"),
    ("D", "Details"),
    ("S/X", "Track on/off"),
    ("U", "Update location"),
    ("P", "Probe CPU"),
    ("Q", "Quit"),
];

/// Returns true when the dashboard should exit.
pub(crate) fn handle_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Tab | KeyCode::Right => app.focus_next(),
        KeyCode::BackTab | KeyCode::Left => app.focus_prev(),
        KeyCode::Char('r') => {
            app.detectors.language.refresh();
            let count = app.detectors.language.refresh_count();
            app.set_status(format!("Language info refreshed ({count})"));
        }
        KeyCode::Char('d') => {
            app.detectors.language.toggle_details();
            let shown = if app.detectors.language.details_open() {
                "shown"
            } else {
                "hidden"
            };
            app.set_status(format!("Language details {shown}"));
        }
        KeyCode::Char('s') => {
            let message = if app.detectors.geolocation.start_tracking() {
                "Location tracking started"
            } else if app.detectors.geolocation.state() == GeoState::Error {
                "Location is unavailable"
            } else {
                "Location tracking is already on"
            };
            app.set_status(message);
        }
        KeyCode::Char('x') => {
            let message = if app.detectors.geolocation.stop_tracking() {
                "Location tracking stopped"
            } else {
                "Location tracking is not on"
            };
            app.set_status(message);
        }
        KeyCode::Char('u') => {
            app.detectors.geolocation.update_now();
            app.set_status("Requesting a fresh location…");
        }
        KeyCode::Char('p') => {
            let message = if app.detectors.cpu.start_probe() {
                "Running the CPU probe…"
            } else {
                "The CPU probe is already running"
            };
            app.set_status(message);
        }
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::platform::fake;

    fn press(app: &mut App, c: char) -> bool {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)).unwrap()
    }

    fn app() -> App {
        App::new(&fake::platform(), &Config::default())
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(press(&mut app, 'q'));
        assert!(handle_key(&mut app, KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)).unwrap());
        assert!(handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        )
        .unwrap());
        assert!(!press(&mut app, 'z'));
    }

    #[test]
    fn language_keys_refresh_and_toggle() {
        let mut app = app();
        assert!(!press(&mut app, 'd'));
        assert!(app.detectors.language.details_open());
        press(&mut app, 'r');
        assert_eq!(app.detectors.language.refresh_count(), 1);
        assert_eq!(app.status.as_deref(), Some("Language info refreshed (1)"));
    }

    #[test]
    fn tracking_keys_start_and_stop_the_watch() {
        let mut app = app();
        press(&mut app, 's');
        assert!(app.detectors.geolocation.watching());
        press(&mut app, 's');
        assert_eq!(app.status.as_deref(), Some("Location tracking is already on"));
        press(&mut app, 'x');
        assert!(!app.detectors.geolocation.watching());
        press(&mut app, 'x');
        assert_eq!(app.status.as_deref(), Some("Location tracking is not on"));
    }

    #[test]
    fn probe_key_reruns_the_cpu_probe() {
        let mut app = app();
        app.poll();
        assert!(!app.detectors.cpu.probe_running());

        press(&mut app, 'p');
        assert_eq!(app.status.as_deref(), Some("Running the CPU probe…"));
        assert!(app.detectors.cpu.probe_running());
        app.poll();
        assert!(!app.detectors.cpu.probe_running());
        assert!(app.detectors.cpu.probe().is_some());
    }
}
