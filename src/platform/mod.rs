//! Platform services consumed by the detectors.
//!
//! Every detector reads the environment through these traits only. The
//! binary wires in [`native`] implementations backed by the operating system;
//! tests substitute fakes with call counters.
//!
//! Deferred values are delivered over `tokio` channels and are always
//! consumed with `try_recv`, so nothing here blocks the UI thread.

mod error;
mod locale_data;
pub mod native;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

pub use error::{GeolocationError, GeolocationErrorCode, PlatformError};

/// A value that resolves after the call that requested it returns.
pub type Deferred<T> = oneshot::Receiver<Result<T, PlatformError>>;

/// Structured platform descriptor, richer than the user-agent string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighEntropyValues {
    pub architecture: Option<String>,
    pub bitness: Option<String>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
}

/// Browser-identity and hardware accessors.
pub trait Navigator: Send + Sync {
    fn user_agent(&self) -> Result<String, PlatformError>;

    /// `None` when the structured API does not exist on this host.
    fn high_entropy_values(&self) -> Option<Deferred<HighEntropyValues>>;

    fn hardware_concurrency(&self) -> Result<usize, PlatformError>;
}

/// Monotonic high-resolution clock, measured from an arbitrary origin.
pub trait MonotonicClock: Send + Sync {
    fn now(&self) -> Duration;
}

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters
    pub accuracy: f64,
    /// Meters above the WGS84 ellipsoid
    pub altitude: Option<f64>,
    /// Meters per second
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Which request a position report answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixSource {
    OneShot,
    Watch(WatchId),
}

#[derive(Debug, Clone)]
pub struct PositionReport {
    pub source: FixSource,
    pub result: Result<Position, GeolocationError>,
}

/// Success and failure callbacks share one channel.
pub type PositionSink = mpsc::UnboundedSender<PositionReport>;

pub trait GeolocationService: Send + Sync {
    /// Requests one fix; the answer arrives on `sink` tagged [`FixSource::OneShot`].
    fn get_current_position(&self, sink: PositionSink) -> Result<(), PlatformError>;

    /// Starts a continuous subscription; reports are tagged with the returned id.
    fn watch_position(&self, sink: PositionSink) -> Result<WatchId, PlatformError>;

    fn clear_watch(&self, id: WatchId);
}

/// Host locale services (preferences, display names, formatting).
pub trait LocaleService: Send + Sync {
    fn preferred_locales(&self) -> Result<Vec<String>, PlatformError>;

    fn primary_locale(&self) -> Result<String, PlatformError>;

    /// Name of `language` as shown to a reader of `display_locale`.
    fn language_display_name(&self, language: &str, display_locale: &str) -> Option<String>;

    fn region_display_name(&self, region: &str, display_locale: &str) -> Option<String>;

    fn format_date(&self, locale: &str, date: NaiveDate) -> Result<String, PlatformError>;

    fn format_number(&self, locale: &str, value: f64) -> Result<String, PlatformError>;

    fn format_currency(
        &self,
        locale: &str,
        value: f64,
        currency: &str,
    ) -> Result<String, PlatformError>;

    /// ISO 4217 code used by `locale`'s region.
    fn default_currency(&self, locale: &str) -> String;
}

pub trait TimeZoneService: Send + Sync {
    /// IANA zone name, e.g. `America/New_York`.
    fn resolved_time_zone(&self) -> Result<String, PlatformError>;

    /// Current wall-clock time in the host's offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

pub trait TimerService: Send + Sync {
    /// Sends `()` on `tick` every `period` until cleared.
    fn set_interval(&self, period: Duration, tick: mpsc::UnboundedSender<()>) -> TimerHandle;

    fn clear_interval(&self, handle: TimerHandle);
}

/// Work handed to a [`WorkerPool`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs CPU-bound work away from the render loop.
pub trait WorkerPool: Send + Sync {
    fn run(&self, job: Job);
}

/// The full set of services a dashboard needs.
#[derive(Clone)]
pub struct Platform {
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn MonotonicClock>,
    pub geolocation: Arc<dyn GeolocationService>,
    pub locale: Arc<dyn LocaleService>,
    pub time_zone: Arc<dyn TimeZoneService>,
    pub timers: Arc<dyn TimerService>,
    pub workers: Arc<dyn WorkerPool>,
}

/// Splits a BCP 47 tag into its language and region subtags.
///
/// Script subtags (`zh-Hant-TW`) are skipped; POSIX separators are accepted.
pub fn split_locale(tag: &str) -> (String, Option<String>) {
    let mut parts = tag.split(['-', '_']).filter(|p| !p.is_empty());
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.find(|p| is_region_subtag(p)).map(|p| p.to_ascii_uppercase());
    (language, region)
}

fn is_region_subtag(part: &str) -> bool {
    match part.len() {
        2 => part.chars().all(|c| c.is_ascii_alphabetic()),
        3 => part.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}
