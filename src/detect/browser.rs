//! Browser identification from the user-agent string.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::signature::{compile, match_signature, Signature, SignatureMatch, VersionRule};
use super::{DetectionResult, Detector, Status};
use crate::platform::Navigator;

pub const UNKNOWN_BROWSER: &str = "Unknown browser";

/// Order matters: Edge, Opera and Samsung Internet all embed `Chrome/`,
/// and Chrome embeds `Safari/`.
pub const BROWSERS: &[Signature] = &[
    Signature::new(r"Edg(?:e|A|iOS)?/([\d.]+)", "Microsoft Edge", VersionRule::Capture),
    Signature::new(r"(?:OPR|Opera)/([\d.]+)", "Opera", VersionRule::Capture),
    Signature::new(r"SamsungBrowser/([\d.]+)", "Samsung Internet", VersionRule::Capture),
    Signature::new(r"(?:Firefox|FxiOS)/([\d.]+)", "Mozilla Firefox", VersionRule::Capture),
    Signature::new(r"(?:Chrome|CriOS)/([\d.]+)", "Google Chrome", VersionRule::Capture),
    Signature::new(r"Version/([\d.]+).*Safari/", "Safari", VersionRule::Capture),
    Signature::new(r"(?:MSIE |Trident/.*rv:)([\d.]+)", "Internet Explorer", VersionRule::Capture),
];

const ENGINES: &[Signature] = &[
    Signature::new(r"(?:Chrome|CriOS|Edg|OPR)/", "Blink", VersionRule::None),
    Signature::new(r"AppleWebKit/([\d.]+)", "WebKit", VersionRule::Capture),
    Signature::new(r"Gecko/", "Gecko", VersionRule::None),
    Signature::new(r"Trident/([\d.]+)", "Trident", VersionRule::Capture),
];

fn compiled_browsers() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| compile(BROWSERS))
}

fn compiled_engines() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| compile(ENGINES))
}

/// Browser name and version, or `None` when no signature matches.
pub fn detect_browser(user_agent: &str) -> Option<SignatureMatch> {
    match_signature(BROWSERS, compiled_browsers(), user_agent)
}

pub fn detect_engine(user_agent: &str) -> Option<SignatureMatch> {
    match_signature(ENGINES, compiled_engines(), user_agent)
}

/// Mobile user agents carry a `Mobi` token.
pub fn is_mobile(user_agent: &str) -> bool {
    user_agent.contains("Mobi")
}

#[derive(Debug)]
enum BrowserState {
    NotMounted,
    Detected {
        browser: Option<SignatureMatch>,
        engine: Option<SignatureMatch>,
        mobile: bool,
    },
    Unavailable,
}

pub struct BrowserDetector {
    navigator: Arc<dyn Navigator>,
    state: BrowserState,
}

impl BrowserDetector {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            state: BrowserState::NotMounted,
        }
    }

    /// Display name, `UNKNOWN_BROWSER` when nothing matched.
    pub fn browser_name(&self) -> &'static str {
        match &self.state {
            BrowserState::Detected {
                browser: Some(m), ..
            } => m.name,
            _ => UNKNOWN_BROWSER,
        }
    }
}

impl Detector for BrowserDetector {
    fn title(&self) -> &'static str {
        "Browser"
    }

    fn mount(&mut self) {
        self.state = match self.navigator.user_agent() {
            Ok(ua) => {
                let browser = detect_browser(&ua);
                if browser.is_none() {
                    tracing::debug!(user_agent = %ua, "no browser signature matched");
                }
                BrowserState::Detected {
                    browser,
                    engine: detect_engine(&ua),
                    mobile: is_mobile(&ua),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read the user agent");
                BrowserState::Unavailable
            }
        };
    }

    fn report(&self) -> DetectionResult {
        match &self.state {
            BrowserState::NotMounted => DetectionResult::new(self.title(), Status::Pending),
            BrowserState::Unavailable => DetectionResult::new(self.title(), Status::Unknown)
                .field("Browser", UNKNOWN_BROWSER),
            BrowserState::Detected {
                browser,
                engine,
                mobile,
            } => {
                let status = if browser.is_some() {
                    Status::Ready
                } else {
                    Status::Unknown
                };
                let mut report =
                    DetectionResult::new(self.title(), status).field("Browser", self.browser_name());
                if let Some(version) = browser.as_ref().and_then(|b| b.version.as_ref()) {
                    report = report.field("Version", version);
                }
                if let Some(engine) = engine {
                    report = report.field("Engine", engine.display());
                }
                report.field("Device", if *mobile { "Mobile" } else { "Desktop" })
            }
        }
    }
}
