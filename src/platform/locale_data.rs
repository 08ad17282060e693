//! Built-in locale table used by the native locale service.
//!
//! Covers the languages and regions people most commonly configure. Anything
//! outside the table falls back to English conventions.

use chrono::{Datelike, NaiveDate};

pub(crate) struct LanguageData {
    pub code: &'static str,
    /// Autonym, e.g. "Español"
    pub name: &'static str,
    pub default_region: &'static str,
    pub decimal: char,
    pub group: char,
    pub date: DateOrder,
    /// Currency symbol goes after the amount, separated by a space
    pub currency_after: bool,
}

#[derive(Clone, Copy)]
pub(crate) enum DateOrder {
    /// 4/23/2025
    MonthDayYear,
    /// 23/04/2025 with the given separator
    DayMonthYear(char),
    /// 2025/4/23 with the given separator
    YearMonthDay(char),
}

const NBSP: char = '\u{a0}';

pub(crate) const LANGUAGES: &[LanguageData] = &[
    lang("en", "English", "US", '.', ',', DateOrder::MonthDayYear, false),
    lang("es", "Español", "ES", ',', '.', DateOrder::DayMonthYear('/'), true),
    lang("fr", "Français", "FR", ',', NBSP, DateOrder::DayMonthYear('/'), true),
    lang("de", "Deutsch", "DE", ',', '.', DateOrder::DayMonthYear('.'), true),
    lang("it", "Italiano", "IT", ',', '.', DateOrder::DayMonthYear('/'), true),
    lang("pt", "Português", "BR", ',', '.', DateOrder::DayMonthYear('/'), false),
    lang("nl", "Nederlands", "NL", ',', '.', DateOrder::DayMonthYear('-'), false),
    lang("ru", "Русский", "RU", ',', NBSP, DateOrder::DayMonthYear('.'), true),
    lang("pl", "Polski", "PL", ',', NBSP, DateOrder::DayMonthYear('.'), true),
    lang("sv", "Svenska", "SE", ',', NBSP, DateOrder::YearMonthDay('-'), true),
    lang("tr", "Türkçe", "TR", ',', '.', DateOrder::DayMonthYear('.'), false),
    lang("ja", "日本語", "JP", '.', ',', DateOrder::YearMonthDay('/'), false),
    lang("zh", "中文", "CN", '.', ',', DateOrder::YearMonthDay('/'), false),
    lang("ko", "한국어", "KR", '.', ',', DateOrder::YearMonthDay('.'), false),
    lang("hi", "हिन्दी", "IN", '.', ',', DateOrder::DayMonthYear('/'), false),
    lang("ar", "العربية", "EG", '.', ',', DateOrder::DayMonthYear('/'), true),
    lang("he", "עברית", "IL", '.', ',', DateOrder::DayMonthYear('.'), true),
    lang("fa", "فارسی", "IR", '.', ',', DateOrder::YearMonthDay('/'), true),
    lang("ur", "اردو", "PK", '.', ',', DateOrder::DayMonthYear('/'), false),
];

const fn lang(
    code: &'static str,
    name: &'static str,
    default_region: &'static str,
    decimal: char,
    group: char,
    date: DateOrder,
    currency_after: bool,
) -> LanguageData {
    LanguageData {
        code,
        name,
        default_region,
        decimal,
        group,
        date,
        currency_after,
    }
}

/// (region, English name, currency)
const REGIONS: &[(&str, &str, &str)] = &[
    ("US", "United States", "USD"),
    ("GB", "United Kingdom", "GBP"),
    ("CA", "Canada", "CAD"),
    ("AU", "Australia", "AUD"),
    ("IE", "Ireland", "EUR"),
    ("ES", "Spain", "EUR"),
    ("MX", "Mexico", "MXN"),
    ("AR", "Argentina", "ARS"),
    ("CO", "Colombia", "COP"),
    ("CL", "Chile", "CLP"),
    ("419", "Latin America", "USD"),
    ("FR", "France", "EUR"),
    ("BE", "Belgium", "EUR"),
    ("CH", "Switzerland", "CHF"),
    ("DE", "Germany", "EUR"),
    ("AT", "Austria", "EUR"),
    ("IT", "Italy", "EUR"),
    ("PT", "Portugal", "EUR"),
    ("BR", "Brazil", "BRL"),
    ("NL", "Netherlands", "EUR"),
    ("RU", "Russia", "RUB"),
    ("PL", "Poland", "PLN"),
    ("SE", "Sweden", "SEK"),
    ("TR", "Türkiye", "TRY"),
    ("JP", "Japan", "JPY"),
    ("CN", "China", "CNY"),
    ("TW", "Taiwan", "TWD"),
    ("KR", "South Korea", "KRW"),
    ("IN", "India", "INR"),
    ("EG", "Egypt", "EGP"),
    ("SA", "Saudi Arabia", "SAR"),
    ("IL", "Israel", "ILS"),
    ("IR", "Iran", "IRR"),
    ("PK", "Pakistan", "PKR"),
];

/// (currency, symbol, fraction digits)
const CURRENCIES: &[(&str, &str, usize)] = &[
    ("USD", "$", 2),
    ("EUR", "€", 2),
    ("GBP", "£", 2),
    ("JPY", "¥", 0),
    ("CNY", "¥", 2),
    ("KRW", "₩", 0),
    ("INR", "₹", 2),
    ("BRL", "R$", 2),
    ("MXN", "$", 2),
    ("CAD", "$", 2),
    ("AUD", "$", 2),
    ("RUB", "₽", 2),
    ("PLN", "zł", 2),
    ("SEK", "kr", 2),
    ("TRY", "₺", 2),
    ("CHF", "CHF", 2),
    ("ILS", "₪", 2),
    ("CLP", "$", 0),
];

pub(crate) fn language(code: &str) -> Option<&'static LanguageData> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Conventions for `code`, English when the language is not in the table.
pub(crate) fn conventions(code: &str) -> &'static LanguageData {
    language(code).unwrap_or(&LANGUAGES[0])
}

pub(crate) fn region_name(region: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(r, _, _)| r.eq_ignore_ascii_case(region))
        .map(|(_, name, _)| *name)
}

pub(crate) fn region_currency(region: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(r, _, _)| r.eq_ignore_ascii_case(region))
        .map(|(_, _, currency)| *currency)
}

fn currency(code: &str) -> (&str, usize) {
    CURRENCIES
        .iter()
        .find(|(c, _, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, symbol, digits)| (*symbol, *digits))
        .unwrap_or((code, 2))
}

/// Groups the integer part in threes and uses the language's separators.
pub(crate) fn format_decimal(data: &LanguageData, value: f64, fraction_digits: usize) -> String {
    let fixed = format!("{:.*}", fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(data.group);
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if value.is_sign_negative() && value != 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(data.decimal);
        out.push_str(frac);
    }
    out
}

/// Number sample with up to three fraction digits, trailing zeros removed.
pub(crate) fn format_number(data: &LanguageData, value: f64) -> String {
    let full = format_decimal(data, value, 3);
    if !full.contains(data.decimal) {
        return full;
    }
    let trimmed = full.trim_end_matches('0');
    trimmed.trim_end_matches(data.decimal).to_string()
}

pub(crate) fn format_currency(data: &LanguageData, value: f64, code: &str) -> String {
    let (symbol, digits) = currency(code);
    let amount = format_decimal(data, value, digits);
    if data.currency_after {
        format!("{amount}{NBSP}{symbol}")
    } else {
        format!("{symbol}{amount}")
    }
}

pub(crate) fn format_date(data: &LanguageData, date: NaiveDate) -> String {
    let (y, m, d) = (date.year(), date.month(), date.day());
    match data.date {
        DateOrder::MonthDayYear => format!("{m}/{d}/{y}"),
        DateOrder::DayMonthYear(sep) => format!("{d:02}{sep}{m:02}{sep}{y}"),
        DateOrder::YearMonthDay(sep) => format!("{y}{sep}{m:02}{sep}{d:02}"),
    }
}
