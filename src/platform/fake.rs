//! In-memory platform services with call counters, for detector tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use tokio::sync::{mpsc, oneshot};

use super::{
    Deferred, FixSource, GeolocationError, GeolocationService, HighEntropyValues, LocaleService,
    MonotonicClock, Navigator, Platform, PlatformError, PositionReport, PositionSink,
    Job, TimeZoneService, TimerHandle, TimerService, WatchId, WorkerPool,
};

/// How the fake structured API behaves.
#[derive(Clone, Default)]
pub(crate) enum EntropyMode {
    /// The API does not exist.
    #[default]
    Absent,
    /// Resolves immediately with these values.
    Resolved(HighEntropyValues),
    /// Resolves with an error.
    Rejected,
    /// Never resolves until the test sends on the stored sender.
    Held,
}

#[derive(Default)]
pub(crate) struct FakeNavigator {
    pub user_agent: Option<String>,
    pub entropy: EntropyMode,
    pub cores: Option<usize>,
    pub held: Mutex<Option<oneshot::Sender<Result<HighEntropyValues, PlatformError>>>>,
}

impl FakeNavigator {
    pub fn with_user_agent(ua: &str) -> Self {
        Self {
            user_agent: Some(ua.to_string()),
            ..Self::default()
        }
    }

    /// Resolves a `Held` read.
    pub fn resolve(&self, values: HighEntropyValues) {
        if let Some(tx) = self.held.lock().unwrap().take() {
            let _ = tx.send(Ok(values));
        }
    }
}

impl Navigator for FakeNavigator {
    fn user_agent(&self) -> Result<String, PlatformError> {
        self.user_agent
            .clone()
            .ok_or(PlatformError::Failed("userAgent getter threw".into()))
    }

    fn high_entropy_values(&self) -> Option<Deferred<HighEntropyValues>> {
        let (tx, rx) = oneshot::channel();
        match &self.entropy {
            EntropyMode::Absent => return None,
            EntropyMode::Resolved(values) => {
                let _ = tx.send(Ok(values.clone()));
            }
            EntropyMode::Rejected => {
                let _ = tx.send(Err(PlatformError::Failed("rejected".into())));
            }
            EntropyMode::Held => {
                *self.held.lock().unwrap() = Some(tx);
            }
        }
        Some(rx)
    }

    fn hardware_concurrency(&self) -> Result<usize, PlatformError> {
        self.cores
            .ok_or(PlatformError::Failed("Hardware info not available".into()))
    }
}

/// Clock that advances by `step` on every read.
pub(crate) struct FakeClock {
    pub now: Mutex<Duration>,
    pub step: Duration,
}

impl FakeClock {
    pub fn frozen() -> Self {
        Self::stepping(Duration::ZERO)
    }

    pub fn stepping(step: Duration) -> Self {
        Self {
            now: Mutex::new(Duration::from_secs(1)),
            step,
        }
    }
}

impl MonotonicClock for FakeClock {
    fn now(&self) -> Duration {
        let mut now = self.now.lock().unwrap();
        let value = *now;
        *now += self.step;
        value
    }
}

#[derive(Default)]
pub(crate) struct FakeGeolocation {
    pub unsupported: bool,
    pub current_calls: AtomicUsize,
    pub watch_calls: AtomicUsize,
    pub cleared: Mutex<Vec<WatchId>>,
    pub sinks: Mutex<Vec<PositionSink>>,
    pub watch_sinks: Mutex<HashMap<u64, PositionSink>>,
    next_watch: AtomicU64,
}

impl FakeGeolocation {
    /// A service that refuses every request.
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Answers every pending one-shot request.
    pub fn answer(&self, result: Result<super::Position, GeolocationError>) {
        for sink in self.sinks.lock().unwrap().drain(..) {
            let _ = sink.send(PositionReport {
                source: FixSource::OneShot,
                result: result.clone(),
            });
        }
    }

    /// Pushes an update on an active watch.
    pub fn push_watch(&self, id: WatchId, result: Result<super::Position, GeolocationError>) {
        if let Some(sink) = self.watch_sinks.lock().unwrap().get(&id.0) {
            let _ = sink.send(PositionReport {
                source: FixSource::Watch(id),
                result,
            });
        }
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    pub fn cleared(&self) -> Vec<WatchId> {
        self.cleared.lock().unwrap().clone()
    }
}

impl GeolocationService for FakeGeolocation {
    fn get_current_position(&self, sink: PositionSink) -> Result<(), PlatformError> {
        if self.unsupported {
            return Err(PlatformError::Unsupported("Geolocation"));
        }
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().unwrap().push(sink);
        Ok(())
    }

    fn watch_position(&self, sink: PositionSink) -> Result<WatchId, PlatformError> {
        if self.unsupported {
            return Err(PlatformError::Unsupported("Geolocation"));
        }
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_watch.fetch_add(1, Ordering::SeqCst) + 123;
        self.watch_sinks.lock().unwrap().insert(id, sink);
        Ok(WatchId(id))
    }

    fn clear_watch(&self, id: WatchId) {
        self.watch_sinks.lock().unwrap().remove(&id.0);
        self.cleared.lock().unwrap().push(id);
    }
}

pub(crate) struct FakeLocale {
    pub preferred: Result<Vec<String>, PlatformError>,
    pub primary: Result<String, PlatformError>,
    pub preferred_reads: AtomicUsize,
}

impl FakeLocale {
    pub fn new(preferred: &[&str], primary: &str) -> Self {
        Self {
            preferred: Ok(preferred.iter().map(|s| s.to_string()).collect()),
            primary: Ok(primary.to_string()),
            preferred_reads: AtomicUsize::new(0),
        }
    }
}

impl LocaleService for FakeLocale {
    fn preferred_locales(&self) -> Result<Vec<String>, PlatformError> {
        self.preferred_reads.fetch_add(1, Ordering::SeqCst);
        self.preferred.clone()
    }

    fn primary_locale(&self) -> Result<String, PlatformError> {
        self.primary.clone()
    }

    fn language_display_name(&self, language: &str, _display_locale: &str) -> Option<String> {
        match language {
            "es" => Some("Español".into()),
            "en" => Some("English".into()),
            "fr" => Some("Français".into()),
            "ar" => Some("العربية".into()),
            _ => None,
        }
    }

    fn region_display_name(&self, region: &str, _display_locale: &str) -> Option<String> {
        match region {
            "ES" => Some("España".into()),
            "US" => Some("Estados Unidos".into()),
            "FR" => Some("Francia".into()),
            _ => None,
        }
    }

    fn format_date(&self, _locale: &str, date: NaiveDate) -> Result<String, PlatformError> {
        Ok(date.format("%d/%m/%Y").to_string())
    }

    fn format_number(&self, _locale: &str, value: f64) -> Result<String, PlatformError> {
        Ok(format!("{value}"))
    }

    fn format_currency(
        &self,
        _locale: &str,
        value: f64,
        currency: &str,
    ) -> Result<String, PlatformError> {
        Ok(format!("{value:.2} {currency}"))
    }

    fn default_currency(&self, _locale: &str) -> String {
        "EUR".into()
    }
}

pub(crate) struct FakeTimeZone {
    pub zone: Result<String, PlatformError>,
    pub now: Mutex<DateTime<FixedOffset>>,
}

impl FakeTimeZone {
    pub fn new(zone: &str, now: &str) -> Self {
        Self {
            zone: Ok(zone.to_string()),
            now: Mutex::new(DateTime::parse_from_rfc3339(now).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl TimeZoneService for FakeTimeZone {
    fn resolved_time_zone(&self) -> Result<String, PlatformError> {
        self.zone.clone()
    }

    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub(crate) struct FakeTimers {
    pub set_calls: AtomicUsize,
    pub cleared: Mutex<Vec<TimerHandle>>,
    pub ticks: Mutex<HashMap<u64, mpsc::UnboundedSender<()>>>,
    next: AtomicU64,
}

impl FakeTimers {
    /// Fires every active interval once.
    pub fn fire(&self) {
        for tick in self.ticks.lock().unwrap().values() {
            let _ = tick.send(());
        }
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn cleared(&self) -> Vec<TimerHandle> {
        self.cleared.lock().unwrap().clone()
    }
}

impl TimerService for FakeTimers {
    fn set_interval(&self, _period: Duration, tick: mpsc::UnboundedSender<()>) -> TimerHandle {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.ticks.lock().unwrap().insert(id, tick);
        TimerHandle(id)
    }

    fn clear_interval(&self, handle: TimerHandle) {
        self.ticks.lock().unwrap().remove(&handle.0);
        self.cleared.lock().unwrap().push(handle);
    }
}

/// Runs every job on the calling thread before returning.
pub(crate) struct InlineWorkers;

impl WorkerPool for InlineWorkers {
    fn run(&self, job: Job) {
        job();
    }
}

/// A complete fake platform with sensible defaults.
pub(crate) fn platform() -> Platform {
    Platform {
        navigator: Arc::new(FakeNavigator {
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into(),
            ),
            cores: Some(8),
            ..FakeNavigator::default()
        }),
        clock: Arc::new(FakeClock::frozen()),
        geolocation: Arc::new(FakeGeolocation::default()),
        locale: Arc::new(FakeLocale::new(&["es-ES", "en-US", "fr-FR"], "es-ES")),
        time_zone: Arc::new(FakeTimeZone::new(
            "America/New_York",
            "2025-04-23T16:41:06-04:00",
        )),
        timers: Arc::new(FakeTimers::default()),
        workers: Arc::new(InlineWorkers),
    }
}
