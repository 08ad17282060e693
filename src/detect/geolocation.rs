//! Geolocation session manager.
//!
//! ```text
//! Loading ──fix──▶ Located ──start──▶ Watching
//!    │                ▲                  │
//!    └──error──▶ Error │◀──────stop───────┘
//!                  │
//!                  └──update_now──▶ Loading
//! ```
//!
//! The watch subscription is an owned `Option<WatchId>`; `stop_tracking`,
//! `unmount` and `Drop` all release it through [`GeoLocation::release_watch`],
//! so it is cleared exactly once.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc::{self, error::TryRecvError};

use super::{DetectionResult, Detector, Status};
use crate::platform::{
    FixSource, GeolocationErrorCode, GeolocationService, PlatformError, Position, PositionReport,
    WatchId,
};

pub const DEFAULT_MAP_BASE_URL: &str = "https://www.google.com/maps";

pub const MSG_DENIED: &str = "Location access denied";
pub const MSG_UNAVAILABLE: &str = "Location information is unavailable";
pub const MSG_TIMEOUT: &str = "The location request timed out";
pub const MSG_UNSUPPORTED: &str = "Geolocation is not supported";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// `40.7128, Latitude` → `"40.712800° N"`. The sign picks the hemisphere and
/// the magnitude is printed.
pub fn format_coordinate(value: f64, axis: Axis) -> String {
    let hemisphere = match (axis, value >= 0.0) {
        (Axis::Latitude, true) => 'N',
        (Axis::Latitude, false) => 'S',
        (Axis::Longitude, true) => 'E',
        (Axis::Longitude, false) => 'W',
    };
    format!("{:.6}° {}", value.abs(), hemisphere)
}

/// `<base>?q=<lat>,<lon>` with shortest round-trip number formatting.
pub fn map_url(base: &str, position: &Position) -> String {
    format!("{}?q={},{}", base, position.latitude, position.longitude)
}

pub fn error_message(code: GeolocationErrorCode) -> &'static str {
    match code {
        GeolocationErrorCode::PermissionDenied => MSG_DENIED,
        GeolocationErrorCode::PositionUnavailable => MSG_UNAVAILABLE,
        GeolocationErrorCode::Timeout => MSG_TIMEOUT,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoState {
    Loading,
    Located,
    Watching,
    Error,
}

pub struct GeoLocation {
    service: Arc<dyn GeolocationService>,
    map_base_url: String,
    tx: mpsc::UnboundedSender<PositionReport>,
    rx: mpsc::UnboundedReceiver<PositionReport>,
    state: GeoState,
    position: Option<Position>,
    error: Option<&'static str>,
    /// A failed one-shot read while the watch keeps running.
    notice: Option<&'static str>,
    watch: Option<WatchId>,
}

impl GeoLocation {
    pub fn new(service: Arc<dyn GeolocationService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            map_base_url: DEFAULT_MAP_BASE_URL.to_string(),
            tx,
            rx,
            state: GeoState::Loading,
            position: None,
            error: None,
            notice: None,
            watch: None,
        }
    }

    pub fn with_map_base_url(mut self, base: impl Into<String>) -> Self {
        self.map_base_url = base.into();
        self
    }

    pub fn state(&self) -> GeoState {
        self.state
    }

    /// True only between a successful start and the matching stop.
    pub fn watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn map_url(&self) -> Option<String> {
        self.position
            .as_ref()
            .map(|p| map_url(&self.map_base_url, p))
    }

    fn fail(&mut self, message: &'static str) {
        self.release_watch();
        self.error = Some(message);
        self.state = GeoState::Error;
    }

    fn unsupported(&mut self, err: PlatformError) {
        tracing::warn!(error = %err, "geolocation service unavailable");
        self.fail(MSG_UNSUPPORTED);
    }

    fn request_fix(&mut self) {
        if let Err(err) = self.service.get_current_position(self.tx.clone()) {
            self.unsupported(err);
        }
    }

    /// Begins a continuous subscription. No-op while already watching or in
    /// the error state.
    pub fn start_tracking(&mut self) -> bool {
        if self.watch.is_some() || self.state == GeoState::Error {
            return false;
        }
        match self.service.watch_position(self.tx.clone()) {
            Ok(id) => {
                tracing::debug!(watch = id.0, "tracking started");
                self.watch = Some(id);
                self.state = GeoState::Watching;
                true
            }
            Err(err) => {
                self.unsupported(err);
                false
            }
        }
    }

    /// Releases the subscription and goes back to the last static fix.
    pub fn stop_tracking(&mut self) -> bool {
        if self.release_watch().is_none() {
            return false;
        }
        self.notice = None;
        self.state = if self.position.is_some() {
            GeoState::Located
        } else {
            GeoState::Loading
        };
        true
    }

    /// Asks for one more fix without touching the watch. From the error
    /// state this re-enters `Loading`.
    pub fn update_now(&mut self) {
        if self.state == GeoState::Error {
            self.error = None;
            self.state = GeoState::Loading;
        }
        self.request_fix();
    }

    /// The one place the subscription is cleared.
    fn release_watch(&mut self) -> Option<WatchId> {
        let id = self.watch.take()?;
        self.service.clear_watch(id);
        tracing::debug!(watch = id.0, "tracking stopped");
        Some(id)
    }

    fn apply(&mut self, report: PositionReport) -> bool {
        if let FixSource::Watch(id) = report.source {
            if self.watch != Some(id) {
                // Straggler from a released watch.
                return false;
            }
        }

        match report.result {
            Ok(position) => {
                if self
                    .position
                    .is_some_and(|current| position.timestamp < current.timestamp)
                {
                    tracing::debug!("discarding a fix older than the displayed one");
                    return false;
                }
                if self.state == GeoState::Error {
                    // A late answer to a request issued before the failure.
                    return false;
                }
                self.position = Some(position);
                self.error = None;
                self.notice = None;
                self.state = if self.watch.is_some() {
                    GeoState::Watching
                } else {
                    GeoState::Located
                };
                true
            }
            Err(err) => {
                tracing::warn!(code = ?err.code, message = %err.message, "position request failed");
                if report.source == FixSource::OneShot && self.watch.is_some() {
                    // The subscription is still live; only this read failed.
                    self.notice = Some(error_message(err.code));
                } else {
                    self.fail(error_message(err.code));
                }
                true
            }
        }
    }
}

impl Detector for GeoLocation {
    fn title(&self) -> &'static str {
        "Location"
    }

    fn mount(&mut self) {
        self.state = GeoState::Loading;
        self.request_fix();
    }

    fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(report) => changed |= self.apply(report),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    fn report(&self) -> DetectionResult {
        if self.state == GeoState::Error {
            let message = self.error.unwrap_or(MSG_UNAVAILABLE);
            return DetectionResult::new(self.title(), Status::Error(message.to_string()))
                .field("Status", message);
        }

        let Some(position) = self.position() else {
            let waiting = if self.watching() {
                "Waiting for the first fix…"
            } else {
                "Locating…"
            };
            return match self.notice {
                Some(message) => {
                    DetectionResult::new(self.title(), Status::Warning(message.to_string()))
                        .field("Status", waiting)
                }
                None => DetectionResult::new(self.title(), Status::Pending).field("Status", waiting),
            };
        };

        let status = match self.notice {
            Some(message) => Status::Warning(message.to_string()),
            None => Status::Ready,
        };
        let mut report = DetectionResult::new(self.title(), status)
            .field("Latitude", format_coordinate(position.latitude, Axis::Latitude))
            .field("Longitude", format_coordinate(position.longitude, Axis::Longitude))
            .field(
                "Decimal",
                format!("{:.4}, {:.4}", position.latitude, position.longitude),
            )
            .field("Accuracy", format!("± {:.0} m", position.accuracy));
        if let Some(altitude) = position.altitude {
            report = report.field("Altitude", format!("{altitude:.0} m"));
        }
        if let Some(speed) = position.speed {
            report = report.field("Speed", format!("{:.1} km/h", speed * 3.6));
        }
        report = report.field(
            "Updated",
            position
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
        );
        if let Some(url) = self.map_url() {
            report = report.field("Map", url);
        }
        report.field("Tracking", if self.watching() { "On" } else { "Off" })
    }

    fn unmount(&mut self) {
        self.release_watch();
    }
}

impl Drop for GeoLocation {
    fn drop(&mut self) {
        self.release_watch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakeGeolocation;
    use crate::platform::GeolocationError;
    use chrono::{TimeZone, Utc};

    fn fix(lat: f64, lon: f64, secs: i64) -> Position {
        Position {
            latitude: lat,
            longitude: lon,
            accuracy: 50.0,
            altitude: Some(100.0),
            speed: Some(0.0),
            timestamp: Utc.timestamp_opt(1_745_523_500 + secs, 0).unwrap(),
        }
    }

    fn new_york() -> Position {
        fix(40.7128, -74.006, 0)
    }

    fn mounted() -> (Arc<FakeGeolocation>, GeoLocation) {
        let service = Arc::new(FakeGeolocation::default());
        let mut geo = GeoLocation::new(service.clone());
        geo.mount();
        (service, geo)
    }

    #[test]
    fn formats_coordinates_with_hemispheres() {
        assert_eq!(format_coordinate(40.7128, Axis::Latitude), "40.712800° N");
        assert_eq!(format_coordinate(-74.006, Axis::Longitude), "74.006000° W");
        assert_eq!(format_coordinate(-33.8688, Axis::Latitude), "33.868800° S");
        assert_eq!(format_coordinate(151.2093, Axis::Longitude), "151.209300° E");
        assert_eq!(format_coordinate(0.0, Axis::Latitude), "0.000000° N");
    }

    #[test]
    fn starts_loading() {
        let (service, geo) = mounted();
        assert_eq!(geo.state(), GeoState::Loading);
        assert!(geo.report().status.is_pending());
        assert_eq!(service.current_calls(), 1);
    }

    #[test]
    fn shows_location_when_available() {
        let (service, mut geo) = mounted();
        service.answer(Ok(new_york()));
        assert!(geo.poll());

        assert_eq!(geo.state(), GeoState::Located);
        let text = geo.report().text();
        assert!(text.contains("40.7128"));
        assert!(text.contains("-74.0060"));
        assert!(text.contains("40.712800° N"));
    }

    #[test]
    fn builds_the_map_link() {
        let (service, mut geo) = mounted();
        assert_eq!(geo.map_url(), None);
        service.answer(Ok(new_york()));
        geo.poll();
        assert_eq!(
            geo.map_url().as_deref(),
            Some("https://www.google.com/maps?q=40.7128,-74.006")
        );
    }

    #[test]
    fn denied_permission_shows_specific_message() {
        let (service, mut geo) = mounted();
        service.answer(Err(GeolocationError::new(
            GeolocationErrorCode::PermissionDenied,
            "User denied geolocation",
        )));
        geo.poll();
        assert_eq!(geo.state(), GeoState::Error);
        assert_eq!(geo.report().status, Status::Error(MSG_DENIED.to_string()));
    }

    #[test]
    fn other_failures_show_generic_messages() {
        let (service, mut geo) = mounted();
        service.answer(Err(GeolocationError::new(
            GeolocationErrorCode::Timeout,
            "timeout",
        )));
        geo.poll();
        assert_eq!(geo.report().status, Status::Error(MSG_TIMEOUT.to_string()));
    }

    #[test]
    fn unsupported_service_is_an_error_state() {
        let service = Arc::new(FakeGeolocation::unsupported());
        let mut geo = GeoLocation::new(service);
        geo.mount();
        assert_eq!(geo.report().status, Status::Error(MSG_UNSUPPORTED.to_string()));
        assert!(!geo.start_tracking());
    }

    #[test]
    fn start_and_stop_subscribe_and_release_once() {
        let (service, mut geo) = mounted();
        service.answer(Ok(new_york()));
        geo.poll();
        assert!(!geo.watching());

        assert!(geo.start_tracking());
        assert!(geo.watching());
        assert_eq!(geo.state(), GeoState::Watching);
        assert!(!geo.start_tracking());
        assert_eq!(service.watch_calls(), 1);

        assert!(geo.stop_tracking());
        assert!(!geo.watching());
        assert_eq!(geo.state(), GeoState::Located);
        assert!(!geo.stop_tracking());
        assert_eq!(service.cleared(), vec![WatchId(123)]);
    }

    #[test]
    fn tracking_can_start_before_the_first_fix() {
        let (service, mut geo) = mounted();
        assert!(geo.start_tracking());
        assert_eq!(service.watch_calls(), 1);
        assert!(geo.stop_tracking());
        assert_eq!(geo.state(), GeoState::Loading);
    }

    #[test]
    fn watch_updates_replace_the_position() {
        let (service, mut geo) = mounted();
        service.answer(Ok(new_york()));
        geo.poll();
        geo.start_tracking();

        service.push_watch(WatchId(123), Ok(fix(40.73, -73.99, 5)));
        assert!(geo.poll());
        assert_eq!(geo.position().unwrap().latitude, 40.73);
        assert_eq!(geo.state(), GeoState::Watching);

        geo.stop_tracking();
        assert_eq!(geo.position().unwrap().latitude, 40.73);
    }

    #[test]
    fn update_now_reads_again_without_touching_the_watch() {
        let (service, mut geo) = mounted();
        service.answer(Ok(new_york()));
        geo.poll();
        geo.start_tracking();

        geo.update_now();
        assert_eq!(service.current_calls(), 2);
        assert!(geo.watching());
        assert_eq!(service.watch_calls(), 1);
        assert!(service.cleared().is_empty());
    }

    #[test]
    fn failed_update_now_keeps_the_watch() {
        let (service, mut geo) = mounted();
        service.answer(Ok(new_york()));
        geo.poll();
        geo.start_tracking();

        geo.update_now();
        service.answer(Err(GeolocationError::new(
            GeolocationErrorCode::Timeout,
            "timeout",
        )));
        assert!(geo.poll());

        assert!(geo.watching());
        assert_eq!(geo.state(), GeoState::Watching);
        assert!(service.cleared().is_empty());
        let report = geo.report();
        assert_eq!(report.status, Status::Warning(MSG_TIMEOUT.to_string()));
        assert_eq!(report.value("Tracking"), Some("On"));
        assert_eq!(geo.position().unwrap().latitude, 40.7128);

        // The next watch update clears the warning.
        service.push_watch(WatchId(123), Ok(fix(40.73, -73.99, 5)));
        geo.poll();
        assert_eq!(geo.report().status, Status::Ready);
    }

    #[test]
    fn failed_update_now_without_a_watch_is_an_error() {
        let (service, mut geo) = mounted();
        service.answer(Ok(new_york()));
        geo.poll();

        geo.update_now();
        service.answer(Err(GeolocationError::new(
            GeolocationErrorCode::Timeout,
            "timeout",
        )));
        geo.poll();
        assert_eq!(geo.state(), GeoState::Error);
        assert!(service.cleared().is_empty());
    }

    #[test]
    fn newest_fix_wins_regardless_of_arrival_order() {
        let (service, mut geo) = mounted();
        geo.start_tracking();
        service.push_watch(WatchId(123), Ok(fix(1.0, 1.0, 10)));
        geo.poll();

        // A manual update resolving later with an older fix is ignored.
        geo.update_now();
        service.answer(Ok(fix(2.0, 2.0, 5)));
        assert!(!geo.poll());
        assert_eq!(geo.position().unwrap().latitude, 1.0);
    }

    #[test]
    fn update_now_recovers_from_error() {
        let (service, mut geo) = mounted();
        service.answer(Err(GeolocationError::new(
            GeolocationErrorCode::PositionUnavailable,
            "nope",
        )));
        geo.poll();
        assert_eq!(geo.state(), GeoState::Error);
        assert!(!geo.start_tracking());

        geo.update_now();
        assert_eq!(geo.state(), GeoState::Loading);
        service.answer(Ok(new_york()));
        geo.poll();
        assert_eq!(geo.state(), GeoState::Located);
    }

    #[test]
    fn watch_error_releases_the_subscription() {
        let (service, mut geo) = mounted();
        geo.start_tracking();
        service.push_watch(
            WatchId(123),
            Err(GeolocationError::new(GeolocationErrorCode::Timeout, "t")),
        );
        geo.poll();
        assert_eq!(geo.state(), GeoState::Error);
        assert!(!geo.watching());
        assert_eq!(service.cleared(), vec![WatchId(123)]);
    }

    #[test]
    fn unmount_releases_an_active_watch_exactly_once() {
        let (service, mut geo) = mounted();
        geo.start_tracking();
        geo.unmount();
        geo.unmount();
        drop(geo);
        assert_eq!(service.cleared(), vec![WatchId(123)]);
    }

    #[test]
    fn drop_releases_an_active_watch() {
        let (service, mut geo) = mounted();
        geo.start_tracking();
        drop(geo);
        assert_eq!(service.cleared(), vec![WatchId(123)]);
    }

    #[test]
    fn unmount_without_a_watch_clears_nothing() {
        let (service, mut geo) = mounted();
        geo.unmount();
        assert!(service.cleared().is_empty());
    }

    #[test]
    fn custom_map_base_url() {
        let service = Arc::new(FakeGeolocation::default());
        let mut geo = GeoLocation::new(service.clone()).with_map_base_url("https://maps.example");
        geo.mount();
        service.answer(Ok(new_york()));
        geo.poll();
        assert_eq!(
            geo.map_url().as_deref(),
            Some("https://maps.example?q=40.7128,-74.006")
        );
    }
}
