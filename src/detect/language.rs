//! Preferred languages and locale formatting samples.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::{DetectionResult, Detector, Field, Status};
use crate::platform::{split_locale, LocaleService};

pub const LANGUAGE_UNAVAILABLE: &str = "Language information is not available";
pub const FORMATTING_UNAVAILABLE: &str = "Locale formatting is not available";

pub const SAMPLE_NUMBER: f64 = 1_234_567.891;
pub const SAMPLE_AMOUNT: f64 = 1_234.56;

/// Languages written right to left.
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur", "ps", "yi", "dv", "ug", "ckb", "sd"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextDirection::Ltr => "Left to right",
            TextDirection::Rtl => "Right to left",
        }
    }
}

pub fn text_direction(tag: &str) -> TextDirection {
    let (language, _) = split_locale(tag);
    if RTL_LANGUAGES.contains(&language.as_str()) {
        TextDirection::Rtl
    } else {
        TextDirection::Ltr
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    pub code: String,
    pub name: String,
    pub region: Option<String>,
}

impl LanguageEntry {
    /// "Español (España)", or the bare name without a region.
    pub fn display(&self) -> String {
        match &self.region {
            Some(region) => format!("{} ({})", self.name, region),
            None => self.name.clone(),
        }
    }
}

fn resolve_entry(locale: &dyn LocaleService, tag: &str, display_locale: &str) -> LanguageEntry {
    let (language, region) = split_locale(tag);
    let name = locale
        .language_display_name(&language, display_locale)
        .unwrap_or_else(|| language.clone());
    let region = region.map(|r| {
        locale
            .region_display_name(&r, display_locale)
            .unwrap_or(r)
    });
    LanguageEntry {
        code: tag.to_string(),
        name,
        region,
    }
}

#[derive(Debug, Clone)]
pub struct LanguageInfo {
    pub primary: LanguageEntry,
    pub preferred: Vec<LanguageEntry>,
    pub localized_date: String,
    pub localized_number: String,
    pub localized_currency: String,
    pub currency_code: String,
    pub direction: TextDirection,
}

pub struct LanguageDetector {
    locale: Arc<dyn LocaleService>,
    info: Option<LanguageInfo>,
    formatting_failed: bool,
    details_open: bool,
    refreshes: u32,
}

impl LanguageDetector {
    pub fn new(locale: Arc<dyn LocaleService>) -> Self {
        Self {
            locale,
            info: None,
            formatting_failed: false,
            details_open: false,
            refreshes: 0,
        }
    }

    pub fn info(&self) -> Option<&LanguageInfo> {
        self.info.as_ref()
    }

    pub fn details_open(&self) -> bool {
        self.details_open
    }

    pub fn refresh_count(&self) -> u32 {
        self.refreshes
    }

    /// Re-runs every derivation.
    pub fn refresh(&mut self) {
        self.refreshes += 1;
        self.derive(Local::now().date_naive());
        tracing::debug!(refreshes = self.refreshes, "language info refreshed");
    }

    /// Shows or hides the details panel. Nothing is re-derived.
    pub fn toggle_details(&mut self) {
        self.details_open = !self.details_open;
    }

    fn sample(&mut self, result: Result<String, crate::platform::PlatformError>) -> String {
        result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "locale formatting failed");
            self.formatting_failed = true;
            "Not available".to_string()
        })
    }

    fn derive(&mut self, today: NaiveDate) {
        self.formatting_failed = false;
        let locale = Arc::clone(&self.locale);

        let mut tags = locale.preferred_locales().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read preferred locales");
            Vec::new()
        });
        let primary = match locale.primary_locale() {
            Ok(tag) => Some(tag),
            Err(err) => {
                tracing::warn!(error = %err, "could not read the primary locale");
                tags.first().cloned()
            }
        };
        let Some(primary) = primary else {
            self.info = None;
            return;
        };
        if tags.is_empty() {
            tags.push(primary.clone());
        }

        let preferred = tags
            .iter()
            .map(|tag| resolve_entry(locale.as_ref(), tag, &primary))
            .collect();
        let currency_code = locale.default_currency(&primary);
        let localized_date = self.sample(locale.format_date(&primary, today));
        let localized_number = self.sample(locale.format_number(&primary, SAMPLE_NUMBER));
        let localized_currency =
            self.sample(locale.format_currency(&primary, SAMPLE_AMOUNT, &currency_code));

        self.info = Some(LanguageInfo {
            primary: resolve_entry(locale.as_ref(), &primary, &primary),
            preferred,
            localized_date,
            localized_number,
            localized_currency,
            currency_code,
            direction: text_direction(&primary),
        });
    }
}

impl Detector for LanguageDetector {
    fn title(&self) -> &'static str {
        "Language"
    }

    fn mount(&mut self) {
        self.derive(Local::now().date_naive());
    }

    fn report(&self) -> DetectionResult {
        let Some(info) = self.info() else {
            return DetectionResult::new(self.title(), Status::Warning(LANGUAGE_UNAVAILABLE.into()))
                .field("Primary", "Unknown");
        };

        let status = if self.formatting_failed {
            Status::Warning(FORMATTING_UNAVAILABLE.into())
        } else {
            Status::Ready
        };
        let codes: Vec<&str> = info.preferred.iter().map(|e| e.code.as_str()).collect();

        let mut report = DetectionResult::new(self.title(), status)
            .field("Primary", info.primary.display())
            .field("Code", &info.primary.code)
            .field("Preferred", codes.join(", "))
            .field("Direction", info.direction.name())
            .field("Date", &info.localized_date)
            .field("Number", &info.localized_number)
            .field("Currency", &info.localized_currency);

        if self.details_open {
            let mut details: Vec<Field> = info
                .preferred
                .iter()
                .enumerate()
                .map(|(i, entry)| Field::new(format!("{}. {}", i + 1, entry.code), entry.display()))
                .collect();
            details.push(Field::new("Currency code", &info.currency_code));
            details.push(Field::new("Direction code", info.direction.as_str()));
            details.push(Field::new("Refreshes", self.refreshes.to_string()));
            report.details = Some(details);
        }
        report
    }
}
