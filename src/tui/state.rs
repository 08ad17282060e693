//! Dashboard state: the mounted detectors plus UI chrome.

use std::time::Instant;

use crate::config::Config;
use crate::detect::DetectorSet;
use crate::platform::Platform;
use crate::tui::animation::AnimationState;

pub(crate) const CARD_COUNT: usize = 6;

pub(crate) struct App {
    pub detectors: DetectorSet,
    /// Index of the highlighted card, in dashboard order.
    pub focus: usize,
    pub status: Option<String>,
    pub animation: AnimationState,
    pub last_tick: Instant,
}

impl App {
    /// Builds every detector and mounts it.
    pub fn new(platform: &Platform, config: &Config) -> Self {
        let mut detectors = DetectorSet::new(platform, config);
        detectors.mount_all();
        Self {
            detectors,
            focus: 0,
            status: None,
            animation: AnimationState::new(),
            last_tick: Instant::now(),
        }
    }

    pub fn poll(&mut self) -> bool {
        self.detectors.poll_all()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % CARD_COUNT;
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + CARD_COUNT - 1) % CARD_COUNT;
    }

    pub fn focused_title(&self) -> &'static str {
        self.detectors.detectors()[self.focus].title()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Releases every watch and timer.
    pub fn shutdown(&mut self) {
        self.detectors.unmount_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake;

    #[test]
    fn focus_wraps_both_ways() {
        let mut app = App::new(&fake::platform(), &Config::default());
        assert_eq!(app.focused_title(), "Browser");
        app.focus_prev();
        assert_eq!(app.focused_title(), "Time Zone");
        app.focus_next();
        app.focus_next();
        assert_eq!(app.focused_title(), "Operating System");
    }
}
