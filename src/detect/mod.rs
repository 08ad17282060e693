//! Detectors: one per card on the dashboard.
//!
//! Each detector reads platform services on [`Detector::mount`], renders a
//! provisional state right away, and patches itself in [`Detector::poll`] as
//! deferred reads, position callbacks and timer ticks arrive. Failures never
//! escape a detector; they become a terminal status on its report.

pub mod browser;
pub mod cpu;
pub mod geolocation;
pub mod language;
pub mod os;
mod set;
mod signature;
pub mod timezone;

use serde::Serialize;

pub use browser::BrowserDetector;
pub use cpu::CpuDetector;
pub use geolocation::GeoLocation;
pub use language::LanguageDetector;
pub use os::OsDetector;
pub use set::DetectorSet;
pub use timezone::TimeZoneDetector;

/// Overall state of a detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Status {
    /// A deferred read has not resolved yet.
    Pending,
    Ready,
    /// Rendered, but part of the information is missing.
    Warning(String),
    /// Nothing matched.
    Unknown,
    Error(String),
}

impl Status {
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Bounded percentage rendered as a bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meter {
    pub label: String,
    pub percent: u8,
}

/// What a detector currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub title: &'static str,
    pub status: Status,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter: Option<Meter>,
    /// Only present while the detector's details panel is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<Field>>,
}

impl DetectionResult {
    pub fn new(title: &'static str, status: Status) -> Self {
        Self {
            title,
            status,
            fields: Vec::new(),
            meter: None,
            details: None,
        }
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::new(label, value));
        self
    }

    /// Value of the first field labelled `label`.
    #[cfg(test)]
    pub fn value(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }

    /// Every field, meter and status message joined into one string.
    #[cfg(test)]
    pub fn text(&self) -> String {
        let mut parts = vec![self.title.to_string()];
        for field in self.fields.iter().chain(self.details.iter().flatten()) {
            parts.push(format!("{}: {}", field.label, field.value));
        }
        if let Some(meter) = &self.meter {
            parts.push(format!("{}: {}%", meter.label, meter.percent));
        }
        match &self.status {
            Status::Warning(msg) | Status::Error(msg) => parts.push(msg.clone()),
            _ => {}
        }
        parts.join("\n")
    }
}

/// Mount/poll/unmount lifecycle shared by every card.
pub trait Detector {
    fn title(&self) -> &'static str;

    /// Reads the platform and renders the first (possibly provisional) state.
    fn mount(&mut self);

    /// Applies whatever resolved since the last call. Returns true when the
    /// report changed. Never blocks.
    fn poll(&mut self) -> bool {
        false
    }

    fn report(&self) -> DetectionResult;

    /// Releases any subscription or timer. Safe to call more than once.
    fn unmount(&mut self) {}
}
