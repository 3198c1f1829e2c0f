//! Word-month date handling
//!
//! Numeric shapes are handled by [`crate::patterns::normalize_date`]; this
//! module adds the `22 September 2025` / `September 22, 2025` / `Sept 2025`
//! forms and a single entry point that accepts either.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::normalize_date;

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("sept", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const MONTH_ALTERNATION: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

/// Word-month date shapes, most specific first
pub(crate) static WORD_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{m})\.?,?\s+\d{{4}}\b", m = MONTH_ALTERNATION),
        format!(r"(?i)\b(?:{m})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b", m = MONTH_ALTERNATION),
        format!(r"(?i)\b(?:{m})\.?,?\s+\d{{4}}\b", m = MONTH_ALTERNATION),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DAY_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)\.?,?\s+(\d{4})\b").unwrap());
static MONTH_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b").unwrap());
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b([a-z]+)\.?,?\s+(\d{4})\b").unwrap());

/// Numeric `M/D/Y` and `Y-M-D` spans
pub(crate) static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}[/\-]\d{1,2}[/\-]\d{1,2}|\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})\b").unwrap());

/// Month number for a full or abbreviated English month name
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    MONTHS.iter().find(|(m, _)| *m == lower).map(|(_, n)| *n)
}

/// Normalize the first word-month date in `raw` to `MM/DD/YYYY`.
///
/// Ordinal suffixes are ignored and a month with only a year means day 1.
pub fn normalize_word_date(raw: &str) -> Option<String> {
    for caps in DAY_FIRST.captures_iter(raw) {
        if let Some(month) = month_number(&caps[2]) {
            return assemble(&caps[3], month, &caps[1]);
        }
    }
    for caps in MONTH_FIRST.captures_iter(raw) {
        if let Some(month) = month_number(&caps[1]) {
            return assemble(&caps[3], month, &caps[2]);
        }
    }
    for caps in MONTH_YEAR.captures_iter(raw) {
        if let Some(month) = month_number(&caps[1]) {
            return assemble(&caps[2], month, "1");
        }
    }
    None
}

/// Normalize a numeric or word-month date found anywhere in `raw`
pub fn normalize_any_date(raw: &str) -> Option<String> {
    if let Some(date) = normalize_date(raw) {
        return Some(date);
    }
    if let Some(date) = normalize_word_date(raw) {
        return Some(date);
    }
    NUMERIC_DATE
        .find_iter(raw)
        .find_map(|m| normalize_date(m.as_str()))
}

fn assemble(year: &str, month: u32, day: &str) -> Option<String> {
    let year: u32 = year.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    ((1..=31).contains(&day) && (1900..=2100).contains(&year))
        .then(|| format!("{:02}/{:02}/{}", month, day, year))
}
