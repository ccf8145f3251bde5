//! Per-value type recognisers.
//!
//! A single value can look like several things at once (`"2024"` is a year and
//! a number, `"10.50"` is an amount and a number), so [`classify_value`] tries
//! the recognisers in [`DataType::PRIORITY`] order and stops at the first hit.
//! Changing that order changes classification results.

use super::types::{CurrencyFormat, DataType, DateFormat};
use crate::config::DetectorConfig;
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const AMOUNT: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?";

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let patterns = [
        // leading symbol: $1,200.50, -€30
        format!(r"^-?[$£¥€]\s?-?{AMOUNT}$"),
        // trailing symbol: 30 €
        format!(r"^-?{AMOUNT}\s?[$£¥€]$"),
        // leading ISO code the format vote knows: USD 1200
        format!(r"^(?:USD|GBP|CNY|EUR)\s?-?{AMOUNT}$"),
        // bare two-decimal amount: 1,200.50
        r"^-?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}$".to_owned(),
    ];
    Regex::new(&patterns.join("|")).expect("currency pattern is valid")
});

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static MONTH_DAY_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid regex"));
static DAY_MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("valid regex"));
static LONG_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]{2} \d{1,2}, \d{4}$").expect("valid regex"));
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10,13}$").expect("valid regex"));
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid regex")
});
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{10,15}$").expect("valid regex"));

const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%d %b %Y",
];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// The first type in priority order that `value` matches, if any.
pub fn classify_value(value: &str, config: &DetectorConfig) -> Option<DataType> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DataType::PRIORITY
        .into_iter()
        .find(|data_type| matches_type(*data_type, value, config))
}

fn matches_type(data_type: DataType, value: &str, config: &DetectorConfig) -> bool {
    match data_type {
        DataType::Currency => is_currency(value),
        DataType::Date => is_date(value, config.min_year, config.max_year),
        DataType::Number => is_number(value),
        DataType::Email => is_email(value),
        DataType::Phone => is_phone(value),
        DataType::Text | DataType::Mixed => false,
    }
}

pub fn is_currency(value: &str) -> bool {
    CURRENCY_RE.is_match(value)
}

/// Fixed layouts first; free-form parsing only counts within `min_year..=max_year`.
pub fn is_date(value: &str, min_year: i32, max_year: i32) -> bool {
    if ISO_DATE_RE.is_match(value)
        || MONTH_DAY_YEAR_RE.is_match(value)
        || DAY_MONTH_YEAR_RE.is_match(value)
        || LONG_DATE_RE.is_match(value)
        || TIMESTAMP_RE.is_match(value)
    {
        return true;
    }
    parse_year(value).is_some_and(|year| (min_year..=max_year).contains(&year))
}

/// Year of `value` when some common date or datetime layout parses it.
fn parse_year(value: &str) -> Option<i32> {
    if YEAR_RE.is_match(value) {
        return value.parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.year());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.year());
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(|d| d.year())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.year())
        })
}

/// Real number once thousands separators are removed.
pub fn is_number(value: &str) -> bool {
    let stripped = value.replace(',', "");
    NUMBER_RE.is_match(&stripped) && stripped.parse::<f64>().is_ok_and(f64::is_finite)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Optional `+` then 10-15 digits, ignoring spaces, hyphens, parentheses and dots.
pub fn is_phone(value: &str) -> bool {
    let digits: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    PHONE_RE.is_match(&digits)
}

pub fn currency_format(value: &str) -> Option<CurrencyFormat> {
    let value = value.trim();
    if value.contains('$') || value.starts_with("USD") {
        Some(CurrencyFormat::Usd)
    } else if value.contains('£') || value.starts_with("GBP") {
        Some(CurrencyFormat::Gbp)
    } else if value.contains('¥') || value.starts_with("CNY") {
        Some(CurrencyFormat::Cny)
    } else if value.contains('€') || value.starts_with("EUR") {
        Some(CurrencyFormat::Eur)
    } else {
        None
    }
}

pub fn date_format(value: &str) -> Option<DateFormat> {
    let value = value.trim();
    if ISO_DATE_RE.is_match(value) {
        Some(DateFormat::IsoDate)
    } else if MONTH_DAY_YEAR_RE.is_match(value) {
        Some(DateFormat::MonthDayYear)
    } else if DAY_MONTH_YEAR_RE.is_match(value) {
        Some(DateFormat::DayMonthYear)
    } else if TIMESTAMP_RE.is_match(value) {
        Some(DateFormat::Timestamp)
    } else {
        None
    }
}

/// The single most frequent vote; `default` when there are none or the lead is shared.
pub fn majority_vote<T: Ord + Copy>(votes: impl IntoIterator<Item = T>, default: T) -> T {
    let mut tally: BTreeMap<T, usize> = BTreeMap::new();
    for vote in votes {
        *tally.entry(vote).or_default() += 1;
    }

    let best = tally.values().copied().max().unwrap_or(0);
    let mut leaders = tally
        .iter()
        .filter(|(_, count)| **count == best)
        .map(|(vote, _)| *vote);

    match (leaders.next(), leaders.next()) {
        (Some(only), None) => only,
        _ => default,
    }
}
