//! All six detectors wired to one platform.

use std::time::Duration;

use super::{
    BrowserDetector, CpuDetector, DetectionResult, Detector, GeoLocation, LanguageDetector,
    OsDetector, TimeZoneDetector,
};
use crate::config::Config;
use crate::platform::Platform;

/// Shortest refresh period the clock accepts.
const MIN_REFRESH: Duration = Duration::from_millis(1);

pub struct DetectorSet {
    pub browser: BrowserDetector,
    pub os: OsDetector,
    pub cpu: CpuDetector,
    pub language: LanguageDetector,
    pub geolocation: GeoLocation,
    pub timezone: TimeZoneDetector,
}

impl DetectorSet {
    pub fn new(platform: &Platform, config: &Config) -> Self {
        let refresh = Duration::from_millis(config.clock.refresh_ms).max(MIN_REFRESH);
        Self {
            browser: BrowserDetector::new(platform.navigator.clone()),
            os: OsDetector::new(platform.navigator.clone()),
            cpu: CpuDetector::new(
                platform.navigator.clone(),
                platform.clock.clone(),
                platform.workers.clone(),
            )
            .with_iterations(config.cpu.probe_iterations),
            language: LanguageDetector::new(platform.locale.clone()),
            geolocation: GeoLocation::new(platform.geolocation.clone())
                .with_map_base_url(config.geolocation.map_base_url.clone()),
            timezone: TimeZoneDetector::new(platform.time_zone.clone(), platform.timers.clone())
                .with_refresh(refresh),
        }
    }

    /// Dashboard order: browser, OS, CPU, language, location, time zone.
    pub fn detectors(&self) -> [&dyn Detector; 6] {
        [
            &self.browser,
            &self.os,
            &self.cpu,
            &self.language,
            &self.geolocation,
            &self.timezone,
        ]
    }

    pub fn detectors_mut(&mut self) -> [&mut dyn Detector; 6] {
        [
            &mut self.browser,
            &mut self.os,
            &mut self.cpu,
            &mut self.language,
            &mut self.geolocation,
            &mut self.timezone,
        ]
    }

    pub fn mount_all(&mut self) {
        for detector in self.detectors_mut() {
            detector.mount();
            tracing::debug!(detector = detector.title(), "mounted");
        }
    }

    /// Polls every detector; true when any report changed.
    pub fn poll_all(&mut self) -> bool {
        let mut changed = false;
        for detector in self.detectors_mut() {
            changed |= detector.poll();
        }
        changed
    }

    pub fn reports(&self) -> Vec<DetectionResult> {
        self.detectors().iter().map(|d| d.report()).collect()
    }

    pub fn any_pending(&self) -> bool {
        self.detectors().iter().any(|d| d.report().status.is_pending())
    }

    pub fn unmount_all(&mut self) {
        for detector in self.detectors_mut() {
            detector.unmount();
        }
    }
}
