//! Operating system detection.
//!
//! Strategies run in order: structured platform info, then user-agent
//! signatures, then the unknown sentinel. The structured read is deferred, so
//! the card shows a provisional value until it resolves.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::sync::oneshot::error::TryRecvError;

use super::signature::{compile, match_signature, Signature, SignatureMatch, VersionRule};
use super::{DetectionResult, Detector, Status};
use crate::platform::{Deferred, HighEntropyValues, Navigator};

pub const UNKNOWN_OS: &str = "Unknown operating system";
pub const DETECTING: &str = "Detecting…";

/// iOS must precede macOS (its user agent says "like Mac OS X") and Android
/// must precede Linux.
pub const OPERATING_SYSTEMS: &[Signature] = &[
    Signature::new(r"Windows NT (\d+\.\d+)", "Windows", VersionRule::WindowsNt),
    Signature::new(r"(?:iPhone|iPad|iPod).*? OS (\d+(?:_\d+)*)", "iOS", VersionRule::Dotted),
    Signature::new(r"Mac OS X (\d+(?:[_.]\d+)*)", "macOS", VersionRule::Dotted),
    Signature::new(r"Macintosh", "macOS", VersionRule::None),
    Signature::new(r"Android (\d+(?:\.\d+)*)", "Android", VersionRule::Capture),
    Signature::new(r"CrOS \S+ ([\d.]+)", "Chrome OS", VersionRule::Capture),
    Signature::new(r"Linux", "Linux", VersionRule::None),
    Signature::new(r"Windows", "Windows", VersionRule::None),
];

fn compiled() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| compile(OPERATING_SYSTEMS))
}

/// OS name and version from a user agent alone.
pub fn os_from_user_agent(user_agent: &str) -> Option<SignatureMatch> {
    match_signature(OPERATING_SYSTEMS, compiled(), user_agent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsSource {
    PlatformInfo,
    UserAgent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    pub name: String,
    pub version: Option<String>,
    pub source: OsSource,
}

impl OsInfo {
    pub fn display(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// What the strategies get to look at.
#[derive(Debug, Default)]
pub struct OsInputs {
    pub structured: Option<HighEntropyValues>,
    pub user_agent: Option<String>,
}

type Strategy = fn(&OsInputs) -> Option<OsInfo>;

const STRATEGIES: &[Strategy] = &[from_platform_info, from_user_agent];

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn from_platform_info(inputs: &OsInputs) -> Option<OsInfo> {
    let values = inputs.structured.as_ref()?;
    Some(OsInfo {
        name: non_empty(&values.platform)?,
        version: non_empty(&values.platform_version),
        source: OsSource::PlatformInfo,
    })
}

fn from_user_agent(inputs: &OsInputs) -> Option<OsInfo> {
    let m = os_from_user_agent(inputs.user_agent.as_deref()?)?;
    Some(OsInfo {
        name: m.name.to_string(),
        version: m.version,
        source: OsSource::UserAgent,
    })
}

/// Runs every strategy in order; `None` means all of them came up empty.
pub fn resolve_os(inputs: &OsInputs) -> Option<OsInfo> {
    STRATEGIES.iter().find_map(|strategy| strategy(inputs))
}

enum OsState {
    NotMounted,
    Pending(Deferred<HighEntropyValues>),
    Resolved(Option<OsInfo>),
}

pub struct OsDetector {
    navigator: Arc<dyn Navigator>,
    state: OsState,
}

impl OsDetector {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            state: OsState::NotMounted,
        }
    }

    fn finish(&mut self, structured: Option<HighEntropyValues>) {
        let user_agent = match self.navigator.user_agent() {
            Ok(ua) => Some(ua),
            Err(err) => {
                tracing::debug!(error = %err, "user agent unavailable for OS fallback");
                None
            }
        };
        let info = resolve_os(&OsInputs {
            structured,
            user_agent,
        });
        if info.is_none() {
            tracing::debug!("no OS strategy produced a result");
        }
        self.state = OsState::Resolved(info);
    }
}

impl Detector for OsDetector {
    fn title(&self) -> &'static str {
        "Operating System"
    }

    fn mount(&mut self) {
        match self.navigator.high_entropy_values() {
            Some(rx) => self.state = OsState::Pending(rx),
            None => self.finish(None),
        }
    }

    fn poll(&mut self) -> bool {
        let OsState::Pending(rx) = &mut self.state else {
            return false;
        };
        let structured = match rx.try_recv() {
            Ok(Ok(values)) => Some(values),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "structured platform info failed, using user agent");
                None
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => {
                tracing::warn!("structured platform info was dropped, using user agent");
                None
            }
        };
        self.finish(structured);
        true
    }

    fn report(&self) -> DetectionResult {
        match &self.state {
            OsState::NotMounted | OsState::Pending(_) => {
                DetectionResult::new(self.title(), Status::Pending).field("System", DETECTING)
            }
            OsState::Resolved(None) => {
                DetectionResult::new(self.title(), Status::Unknown).field("System", UNKNOWN_OS)
            }
            OsState::Resolved(Some(info)) => {
                let mut report =
                    DetectionResult::new(self.title(), Status::Ready).field("System", info.display());
                if let Some(version) = &info.version {
                    report = report.field("Version", version);
                }
                let source = match info.source {
                    OsSource::PlatformInfo => "Platform info",
                    OsSource::UserAgent => "User agent",
                };
                report.field("Source", source)
            }
        }
    }
}
