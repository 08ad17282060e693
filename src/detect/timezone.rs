//! Time zone name, UTC offset, and a live clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};

use super::{DetectionResult, Detector, Status};
use crate::platform::{TimeZoneService, TimerHandle, TimerService};

pub const NOT_DETECTED: &str = "Not detected";
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(1);

/// `-14400` → `"UTC-04:00"`. Zero is `UTC+00:00`.
pub fn utc_offset(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let total = offset_seconds.unsigned_abs();
    format!("UTC{sign}{:02}:{:02}", total / 3600, (total % 3600) / 60)
}

pub struct TimeZoneDetector {
    service: Arc<dyn TimeZoneService>,
    timers: Arc<dyn TimerService>,
    period: Duration,
    zone: Option<String>,
    offset: String,
    local_time: String,
    local_date: String,
    timer: Option<TimerHandle>,
    ticks: Option<mpsc::UnboundedReceiver<()>>,
}

impl TimeZoneDetector {
    pub fn new(service: Arc<dyn TimeZoneService>, timers: Arc<dyn TimerService>) -> Self {
        Self {
            service,
            timers,
            period: DEFAULT_REFRESH,
            zone: None,
            offset: String::new(),
            local_time: String::new(),
            local_date: String::new(),
            timer: None,
            ticks: None,
        }
    }

    pub fn with_refresh(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn utc_offset(&self) -> &str {
        &self.offset
    }

    pub fn local_time(&self) -> &str {
        &self.local_time
    }

    fn refresh_clock(&mut self) {
        let now = self.service.now();
        // Recomputed on every tick so DST transitions show up.
        self.offset = utc_offset(now.offset().local_minus_utc());
        self.local_time = now.format("%H:%M:%S").to_string();
        self.local_date = now.format("%Y-%m-%d").to_string();
    }
}

impl Detector for TimeZoneDetector {
    fn title(&self) -> &'static str {
        "Time Zone"
    }

    fn mount(&mut self) {
        self.zone = match self.service.resolved_time_zone() {
            Ok(zone) => Some(zone),
            Err(err) => {
                tracing::warn!(error = %err, "time zone resolution failed");
                None
            }
        };
        self.refresh_clock();

        if self.timer.is_none() {
            let (tx, rx) = mpsc::unbounded_channel();
            self.timer = Some(self.timers.set_interval(self.period, tx));
            self.ticks = Some(rx);
        }
    }

    fn poll(&mut self) -> bool {
        let Some(ticks) = self.ticks.as_mut() else {
            return false;
        };
        let mut ticked = false;
        loop {
            match ticks.try_recv() {
                Ok(()) => ticked = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if ticked {
            self.refresh_clock();
        }
        ticked
    }

    fn report(&self) -> DetectionResult {
        let status = if self.zone.is_some() {
            Status::Ready
        } else {
            Status::Warning("Time zone could not be detected".to_string())
        };
        DetectionResult::new(self.title(), status)
            .field("Time zone", self.zone.as_deref().unwrap_or(NOT_DETECTED))
            .field("UTC offset", self.utc_offset())
            .field("Local time", self.local_time())
            .field("Date", &self.local_date)
    }

    fn unmount(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.timers.clear_interval(handle);
            tracing::debug!(timer = handle.0, "clock refresh cancelled");
        }
        self.ticks = None;
    }
}

impl Drop for TimeZoneDetector {
    fn drop(&mut self) {
        self.unmount();
    }
}
