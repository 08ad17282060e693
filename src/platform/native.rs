//! Platform services backed by the local operating system.
//!
//! - Navigator: user agent from CLI/env/config, structured values from sysinfo
//! - Locale: POSIX locale variables plus the built-in locale table
//! - Time zone: `TZ`, `/etc/timezone`, or the `/etc/localtime` link
//! - Geolocation: a fixed position from the config file
//! - Timers and location watches: tasks on the tokio runtime
//! - CPU probe: the runtime's blocking pool

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use sysinfo::System;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::locale_data;
use super::{
    split_locale, Deferred, FixSource, GeolocationError, GeolocationErrorCode,
    GeolocationService, HighEntropyValues, Job, LocaleService, MonotonicClock, Navigator,
    Platform, PlatformError, Position, PositionReport, PositionSink, TimeZoneService, TimerHandle,
    TimerService, WatchId, WorkerPool,
};
use crate::config::{Config, GeolocationConfig};

/// Environment variable consulted for the user agent when no flag is given.
pub const USER_AGENT_ENV: &str = "DEVICE_INSPECTOR_USER_AGENT";

/// Build the native platform.
///
/// `user_agent` is the command-line override; it wins over the environment
/// and the config file.
pub fn platform(config: &Config, user_agent: Option<String>, runtime: Handle) -> Platform {
    let non_empty = |ua: String| {
        let ua = ua.trim();
        (!ua.is_empty()).then(|| ua.to_string())
    };
    let user_agent = user_agent
        .and_then(non_empty)
        .or_else(|| env::var(USER_AGENT_ENV).ok().and_then(non_empty))
        .or_else(|| config.browser.user_agent.clone().and_then(non_empty));

    Platform {
        navigator: Arc::new(NativeNavigator {
            user_agent,
            runtime: runtime.clone(),
        }),
        clock: Arc::new(SystemClock::new()),
        geolocation: Arc::new(StaticGeolocation::new(
            config.geolocation.clone(),
            runtime.clone(),
        )),
        locale: Arc::new(NativeLocale {
            preferred: config.language.preferred.clone(),
        }),
        time_zone: Arc::new(NativeTimeZone),
        timers: Arc::new(TokioTimers::new(runtime.clone())),
        workers: Arc::new(BlockingWorkers { runtime }),
    }
}

/// Abortable background tasks keyed by handle id.
struct TaskSet {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl TaskSet {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    fn reserve(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn insert(&self, id: u64, task: JoinHandle<()>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.insert(id, task);
        }
    }

    fn abort(&self, id: u64) -> bool {
        let task = match self.tasks.lock() {
            Ok(mut tasks) => tasks.remove(&id),
            Err(_) => None,
        };
        match task {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}

/// CPU-bound jobs on the runtime's blocking pool.
struct BlockingWorkers {
    runtime: Handle,
}

impl WorkerPool for BlockingWorkers {
    fn run(&self, job: Job) {
        self.runtime.spawn_blocking(job);
    }
}

struct NativeNavigator {
    user_agent: Option<String>,
    runtime: Handle,
}

impl Navigator for NativeNavigator {
    fn user_agent(&self) -> Result<String, PlatformError> {
        self.user_agent
            .clone()
            .ok_or(PlatformError::Unsupported("User agent"))
    }

    fn high_entropy_values(&self) -> Option<Deferred<HighEntropyValues>> {
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn_blocking(move || {
            let values = read_high_entropy_values();
            tracing::debug!(?values, "structured platform values resolved");
            let _ = tx.send(Ok(values));
        });
        Some(rx)
    }

    fn hardware_concurrency(&self) -> Result<usize, PlatformError> {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        let threads = sys.cpus().len();
        if threads > 0 {
            return Ok(threads);
        }

        std::thread::available_parallelism()
            .map(|n| n.get())
            .map_err(|err| PlatformError::Failed(err.to_string()))
    }
}

fn read_high_entropy_values() -> HighEntropyValues {
    let platform = match env::consts::OS {
        "windows" => Some("Windows".to_string()),
        "macos" => Some("macOS".to_string()),
        "ios" => Some("iOS".to_string()),
        "android" => Some("Android".to_string()),
        "linux" => System::name().or_else(|| Some("Linux".to_string())),
        _ => System::name(),
    };

    HighEntropyValues {
        architecture: Some(env::consts::ARCH.to_string()),
        bitness: Some(usize::BITS.to_string()),
        platform,
        platform_version: System::os_version(),
    }
}

struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

struct NativeLocale {
    preferred: Vec<String>,
}

/// Convert a POSIX locale (`es_ES.UTF-8@euro`) to a BCP 47 tag (`es-ES`).
pub(crate) fn normalize_posix_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next().unwrap_or_default().trim();
    match base {
        "" => None,
        "C" | "POSIX" => Some("en-US".to_string()),
        _ => {
            let (language, region) = split_locale(base);
            if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            Some(match region {
                Some(region) => format!("{language}-{region}"),
                None => language,
            })
        }
    }
}

impl NativeLocale {
    fn from_environment() -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let mut push = |raw: &str| {
            if let Some(tag) = normalize_posix_locale(raw) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        };

        // LANGUAGE is an ordered preference list; the LC_* chain names one locale.
        if let Ok(list) = env::var("LANGUAGE") {
            for part in list.split(':') {
                push(part);
            }
        }
        for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
            match env::var(var) {
                Ok(value) if !value.trim().is_empty() => {
                    push(&value);
                    break;
                }
                _ => {}
            }
        }
        tags
    }
}

impl LocaleService for NativeLocale {
    fn preferred_locales(&self) -> Result<Vec<String>, PlatformError> {
        let tags = if self.preferred.is_empty() {
            Self::from_environment()
        } else {
            self.preferred.clone()
        };
        if tags.is_empty() {
            return Err(PlatformError::Unsupported("Locale preferences"));
        }
        Ok(tags)
    }

    fn primary_locale(&self) -> Result<String, PlatformError> {
        self.preferred_locales()?
            .into_iter()
            .next()
            .ok_or(PlatformError::Unsupported("Primary locale"))
    }

    /// Languages are named by their autonym regardless of `display_locale`.
    fn language_display_name(&self, language: &str, _display_locale: &str) -> Option<String> {
        locale_data::language(language).map(|l| l.name.to_string())
    }

    fn region_display_name(&self, region: &str, _display_locale: &str) -> Option<String> {
        locale_data::region_name(region).map(str::to_string)
    }

    fn format_date(&self, locale: &str, date: NaiveDate) -> Result<String, PlatformError> {
        let (language, _) = split_locale(locale);
        Ok(locale_data::format_date(
            locale_data::conventions(&language),
            date,
        ))
    }

    fn format_number(&self, locale: &str, value: f64) -> Result<String, PlatformError> {
        let (language, _) = split_locale(locale);
        Ok(locale_data::format_number(
            locale_data::conventions(&language),
            value,
        ))
    }

    fn format_currency(
        &self,
        locale: &str,
        value: f64,
        currency: &str,
    ) -> Result<String, PlatformError> {
        let (language, _) = split_locale(locale);
        Ok(locale_data::format_currency(
            locale_data::conventions(&language),
            value,
            currency,
        ))
    }

    fn default_currency(&self, locale: &str) -> String {
        let (language, region) = split_locale(locale);
        let region = region.or_else(|| {
            locale_data::language(&language).map(|l| l.default_region.to_string())
        });
        region
            .as_deref()
            .and_then(locale_data::region_currency)
            .unwrap_or("USD")
            .to_string()
    }
}

struct NativeTimeZone;

/// Zone name from a zoneinfo path such as `/usr/share/zoneinfo/Europe/Madrid`.
fn zone_from_path(path: &str) -> Option<String> {
    path.split_once("zoneinfo/")
        .map(|(_, zone)| zone.trim().to_string())
        .filter(|zone| !zone.is_empty())
}

impl TimeZoneService for NativeTimeZone {
    fn resolved_time_zone(&self) -> Result<String, PlatformError> {
        if let Ok(tz) = env::var("TZ") {
            let tz = tz.trim().trim_start_matches(':');
            if let Some(zone) = zone_from_path(tz) {
                return Ok(zone);
            }
            if !tz.is_empty() && !tz.starts_with('/') {
                return Ok(tz.to_string());
            }
        }

        #[cfg(unix)]
        {
            if let Ok(content) = std::fs::read_to_string("/etc/timezone") {
                let zone = content.trim();
                if !zone.is_empty() {
                    return Ok(zone.to_string());
                }
            }
            if let Ok(target) = std::fs::read_link("/etc/localtime") {
                if let Some(zone) = zone_from_path(&target.to_string_lossy()) {
                    return Ok(zone);
                }
            }
        }

        Err(PlatformError::Unsupported("Time zone resolution"))
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

struct TokioTimers {
    runtime: Handle,
    tasks: TaskSet,
}

impl TokioTimers {
    fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: TaskSet::new(),
        }
    }
}

impl TimerService for TokioTimers {
    fn set_interval(&self, period: Duration, tick: mpsc::UnboundedSender<()>) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        let id = self.tasks.reserve();
        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tick.send(()).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(id, task);
        TimerHandle(id)
    }

    fn clear_interval(&self, handle: TimerHandle) {
        if !self.tasks.abort(handle.0) {
            tracing::debug!(handle = handle.0, "interval already cleared");
        }
    }
}

/// Reports the position configured in `[geolocation]`.
struct StaticGeolocation {
    config: GeolocationConfig,
    runtime: Handle,
    watches: TaskSet,
}

impl StaticGeolocation {
    fn new(config: GeolocationConfig, runtime: Handle) -> Self {
        Self {
            config,
            runtime,
            watches: TaskSet::new(),
        }
    }
}

fn configured_fix(config: &GeolocationConfig) -> Result<Position, GeolocationError> {
    if !config.enabled {
        return Err(GeolocationError::new(
            GeolocationErrorCode::PermissionDenied,
            "Location access is disabled in the configuration",
        ));
    }
    match (config.latitude, config.longitude) {
        (Some(latitude), Some(longitude)) => Ok(Position {
            latitude,
            longitude,
            accuracy: config.accuracy_m,
            altitude: config.altitude_m,
            speed: config.speed_mps,
            timestamp: Utc::now(),
        }),
        _ => Err(GeolocationError::new(
            GeolocationErrorCode::PositionUnavailable,
            "No position configured",
        )),
    }
}

impl GeolocationService for StaticGeolocation {
    fn get_current_position(&self, sink: PositionSink) -> Result<(), PlatformError> {
        let config = self.config.clone();
        self.runtime.spawn(async move {
            let _ = sink.send(PositionReport {
                source: FixSource::OneShot,
                result: configured_fix(&config),
            });
        });
        Ok(())
    }

    fn watch_position(&self, sink: PositionSink) -> Result<WatchId, PlatformError> {
        let config = self.config.clone();
        let period = Duration::from_millis(config.watch_interval_ms.max(100));
        let id = self.watches.reserve();
        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let report = PositionReport {
                    source: FixSource::Watch(WatchId(id)),
                    result: configured_fix(&config),
                };
                if sink.send(report).is_err() {
                    break;
                }
            }
        });
        self.watches.insert(id, task);
        tracing::debug!(watch = id, "location watch started");
        Ok(WatchId(id))
    }

    fn clear_watch(&self, id: WatchId) {
        if self.watches.abort(id.0) {
            tracing::debug!(watch = id.0, "location watch cleared");
        }
    }
}
