//! Regex extractors for rigidly formatted fields
//!
//! Each `extract_*_candidates` method scans its pattern table in order and
//! returns candidates in discovery order. Absence of a match is an empty
//! list; malformed numbers are dropped silently.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use roster_domain::{best_by_confidence, ExtractionCandidate};
use std::collections::BTreeSet;

use crate::text::{compile_all, context_window, digits};

/// Payload prefix for NPI check-digit computation (ISO card issuer prefix)
pub const NPI_LUHN_PREFIX: &str = "80840";

/// Tokens that look like PPG codes but never are
pub const PPG_FALSE_POSITIVES: [&str; 8] = ["PPG", "ID", "TIN", "NPI", "MD", "DR", "HMO", "PPO"];

static NPI_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)NPI[:\s#]*(\d{10})",
        r"(?i)National Provider Identifier[:\s]*(\d{10})",
        r"(?i)Provider ID[:\s]*(\d{10})",
        // bare number; the rest of its line must mention provider/NPI/national
        r"(?:^|\s)(\d{10})",
    ])
});
const NPI_BARE_PATTERN: usize = 3;

static TIN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)TIN[:\s#]*(\d{2}-?\d{7})",
        r"(?i)Tax\s+ID[:\s]*(\d{2}-?\d{7})",
        r"(?i)Federal\s+ID[:\s]*(\d{2}-?\d{7})",
        r"(?i)EIN[:\s]*(\d{2}-?\d{7})",
        r"(?i)Employer\s+ID[:\s]*(\d{2}-?\d{7})",
        r"(\d{2}-\d{7})",
    ])
});
const TIN_LABELED_PATTERNS: usize = 5;

// No lookahead in `regex`: the trailing `(?:\s|$)` consumes the delimiter instead of peeking at it.
static PPG_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)PPG[:\s#']*([A-Za-z0-9]+)",
        r"(?i)PPG\s+ID[:\s]*([A-Za-z0-9]+)",
        r"(?i)Provider Practice Group[:\s]*([A-Za-z0-9]+)",
        r"(?i)Group\s+ID[:\s]*([A-Za-z0-9]+)",
        r"(?i)Shared\s+Risk:\s*[^\n]*?[-–]\s*([A-Za-z0-9]{2,6})(?:\s|$)",
        r"(?i)PPG[#'s]*[^:]*?[-–]\s*([A-Za-z0-9]{2,6})(?:\s|$)",
        r"(?i)(?:ppg|shared\s+risk)[^\n]{0,50}?[-–]\s*([A-Za-z0-9]{2,6})(?:\s|$)",
        // "Shared Risk: <Org> - <CODE>": the code is the second group
        r"(?i)Shared\s+Risk[:\s]*<([^>]+)>\s*[-–]\s*<([^>]+)>",
    ])
});
const PPG_LABELED_PATTERNS: usize = 4;

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)Phone[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
        r"(?i)Tel[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
        r"(?i)Contact[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
        r"(?i)Phone\s+Number[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
        r"\((\d{3})\)\s*(\d{3})[-.\s]*(\d{4})",
    ])
});

static FAX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)Fax[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
        r"(?i)Facsimile[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
        r"(?i)Fax\s+Number[:\s]*(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
    ])
});

static LICENSE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)License[:\s#]*([A-Z]\d{5,6})",
        r"(?i)State\s+License[:\s]*([A-Z]\d{5,6})",
        r"(?i)Medical\s+License[:\s]*([A-Z]\d{5,6})",
        r"(?i)Lic\s*#[:\s]*([A-Z]\d{5,6})",
        r"(?i)State\s+Lic[:\s]*([A-Z]\d{5,6})",
    ])
});
static LICENSE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]\d{5,6}$").unwrap());

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)Effective\s+Date[:\s]*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
        r"(?i)Term(?:ination)?\s+Date[:\s]*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
        r"(?i)Start\s+Date[:\s]*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
        r"(?i)End\s+Date[:\s]*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
        r"(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
        r"\b(\d{4}[/\-]\d{1,2}[/\-]\d{1,2})\b",
    ])
});
const DATE_LABELED_PATTERNS: usize = 4;

static DATE_US: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})").unwrap());
static DATE_ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})").unwrap());

static TERM_CLUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\bterminate?d?\b",
        r"(?i)\btermination\b",
        r"(?i)\bremove\b",
        r"(?i)\bdiscontinue\b",
        r"(?i)\bend\b",
        r"(?i)\bstop\b",
        r"(?i)\bcease\b",
        r"(?i)\bwithdraw\b",
        r"(?i)\bcancel\b",
        r"(?i)\bexpire\b",
        r#"(?i)["']terminate?["']"#,
        r"(?i)\bno\s+longer\b",
        r"(?i)\beffective\s+immediately\b",
        r"(?i)\bvoluntary\b",
        r"(?i)\bas\s+of\b",
    ])
});

static ADD_CLUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\badd\b",
        r"(?i)\bnew\b",
        r"(?i)\binclude\b",
        r"(?i)\benroll\b",
        r"(?i)\bregister\b",
        r"(?i)\bjoin\b",
        r"(?i)\bwelcome\b",
        r"(?i)\bonboard\b",
        r"(?i)\brecruit\b",
        r"(?i)\bhire\b",
        r"(?i)\bbring\s+on\b",
    ])
});

static UPDATE_CLUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\bupdate\b",
        r"(?i)\bmodify\b",
        r"(?i)\bchange\b",
        r"(?i)\brevise\b",
        r"(?i)\bamend\b",
        r"(?i)\bcorrect\b",
        r"(?i)\bedit\b",
        r"(?i)\badjust\b",
        r"(?i)\balter\b",
        r"(?i)\brefresh\b",
        r"(?i)\brenew\b",
        r"(?i)\bmove\b",
        r"(?i)\brelocate\b",
        r"(?i)\btransfer\b",
    ])
});

static NEGATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[r"not\s+terminate", r"no\s+changes", r"don't\s+", r"will\s+not"])
});

/// Regex-driven candidate generator
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        Self
    }

    /// NPI candidates, Luhn-checked, de-duplicated by value in discovery order
    pub fn extract_npi_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut candidates: Vec<ExtractionCandidate> = Vec::new();
        for (i, pattern) in NPI_PATTERNS.iter().enumerate() {
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                if i == NPI_BARE_PATTERN && !line_tail_mentions_provider(text, m.end()) {
                    continue;
                }
                let npi = digits(m.as_str());
                if npi.len() != 10 || candidates.iter().any(|c| c.value == npi) {
                    continue;
                }
                let valid = validate_npi_luhn(&npi);
                let start = whole_start(&caps);
                candidates.push(
                    ExtractionCandidate::new(npi, if valid { 0.9 } else { 0.6 }, format!("npi_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 20))
                        .validated(valid),
                );
            }
        }
        candidates
    }

    /// TIN candidates formatted `XX-XXXXXXX`
    pub fn extract_tin_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (i, pattern) in TIN_PATTERNS.iter().enumerate() {
            for caps in pattern.captures_iter(text) {
                let Some(tin) = caps.get(1).and_then(|m| normalize_tin(m.as_str())) else {
                    continue;
                };
                let start = whole_start(&caps);
                let confidence = if i < TIN_LABELED_PATTERNS { 0.9 } else { 0.7 };
                candidates.push(
                    ExtractionCandidate::new(tin, confidence, format!("tin_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 20))
                        .validated(true),
                );
            }
        }
        candidates
    }

    /// PPG candidates; several distinct codes collapse into one combined candidate
    pub fn extract_ppg_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let last = PPG_PATTERNS.len() - 1;
        let mut candidates = Vec::new();
        for (i, pattern) in PPG_PATTERNS.iter().enumerate() {
            for caps in pattern.captures_iter(text) {
                let group = if i == last { 2 } else { 1 };
                let Some(raw) = caps.get(group) else { continue };
                let code: String = raw.as_str().chars().filter(char::is_ascii_alphanumeric).collect();
                if !(2..=6).contains(&code.len())
                    || PPG_FALSE_POSITIVES.contains(&code.to_uppercase().as_str())
                {
                    continue;
                }
                let start = whole_start(&caps);
                let confidence = if i < PPG_LABELED_PATTERNS { 0.8 } else { 0.9 };
                candidates.push(
                    ExtractionCandidate::new(code, confidence, format!("ppg_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 30))
                        .validated(true),
                );
            }
        }
        combine_ppg_candidates(candidates)
    }

    /// Phone candidates formatted `XXX-XXX-XXXX`
    pub fn extract_phone_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (i, pattern) in PHONE_PATTERNS.iter().enumerate() {
            let confidence = if pattern.as_str().to_lowercase().contains("phone") { 0.9 } else { 0.7 };
            for caps in pattern.captures_iter(text) {
                let raw: String = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
                let Some(phone) = format_phone(&raw) else { continue };
                let start = whole_start(&caps);
                candidates.push(
                    ExtractionCandidate::new(phone, confidence, format!("phone_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 20))
                        .validated(true),
                );
            }
        }
        candidates
    }

    /// Fax candidates formatted `XXX-XXX-XXXX`
    pub fn extract_fax_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (i, pattern) in FAX_PATTERNS.iter().enumerate() {
            for caps in pattern.captures_iter(text) {
                let Some(fax) = caps.get(1).and_then(|m| format_phone(m.as_str())) else {
                    continue;
                };
                let start = whole_start(&caps);
                candidates.push(
                    ExtractionCandidate::new(fax, 0.9, format!("fax_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 20))
                        .validated(true),
                );
            }
        }
        candidates
    }

    /// State license candidates, upper-cased
    pub fn extract_license_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (i, pattern) in LICENSE_PATTERNS.iter().enumerate() {
            let confidence = if pattern.as_str().to_lowercase().contains("license") { 0.9 } else { 0.7 };
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let license = m.as_str().to_uppercase();
                if !LICENSE_SHAPE.is_match(&license) {
                    continue;
                }
                let start = whole_start(&caps);
                candidates.push(
                    ExtractionCandidate::new(license, confidence, format!("license_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 20))
                        .validated(true),
                );
            }
        }
        candidates
    }

    /// Numeric date candidates normalized to `MM/DD/YYYY`
    pub fn extract_date_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (i, pattern) in DATE_PATTERNS.iter().enumerate() {
            for caps in pattern.captures_iter(text) {
                let Some(date) = caps.get(1).and_then(|m| normalize_date(m.as_str())) else {
                    continue;
                };
                let start = whole_start(&caps);
                let confidence = if i < DATE_LABELED_PATTERNS { 0.9 } else { 0.6 };
                candidates.push(
                    ExtractionCandidate::new(date, confidence, format!("date_pattern_{}", i))
                        .at(start)
                        .with_context(context_window(text, start, 30))
                        .validated(true),
                );
            }
        }
        candidates
    }

    /// Keyword-count transaction type, suppressed entirely by any negation
    pub fn extract_transaction_type_candidates(&self, text: &str) -> Vec<ExtractionCandidate> {
        let lower = text.to_lowercase();
        if NEGATIONS.iter().any(|n| n.is_match(&lower)) {
            return Vec::new();
        }

        let categories: [(&str, &Vec<Regex>); 3] =
            [("Term", &*TERM_CLUES), ("Add", &*ADD_CLUES), ("Update", &*UPDATE_CLUES)];
        let mut best: Option<(&str, usize, Option<usize>)> = None;
        for (label, clues) in categories {
            let mut score = 0;
            let mut first: Option<usize> = None;
            for clue in clues.iter() {
                for m in clue.find_iter(text) {
                    score += 1;
                    first.get_or_insert(m.start());
                }
            }
            if score > 0 && best.map_or(true, |(_, s, _)| score > s) {
                best = Some((label, score, first));
            }
        }

        best.map(|(label, score, first)| {
            let position = first.unwrap_or(0);
            let context = match first {
                Some(p) => context_window(text, p, 50),
                None => crate::text::slice(text, 0, 50).to_string(),
            };
            ExtractionCandidate::new(label, (score as f64 * 0.3).min(0.9), "transaction_lexicon")
                .at(position)
                .with_context(context)
                .validated(true)
        })
        .into_iter()
        .collect()
    }
}

/// Fold PPG candidates: two or more distinct codes become one sorted,
/// comma-joined candidate that records each source as `value@position`.
pub fn combine_ppg_candidates(candidates: Vec<ExtractionCandidate>) -> Vec<ExtractionCandidate> {
    let distinct: BTreeSet<&str> = candidates.iter().map(|c| c.value.as_str()).collect();
    if distinct.len() < 2 {
        return candidates;
    }
    let Some(best) = best_by_confidence(&candidates) else {
        return candidates;
    };
    let combined = distinct.into_iter().collect::<Vec<_>>().join(", ");
    let sources = candidates
        .iter()
        .map(|c| format!("{}@{}", c.value, c.position))
        .collect::<Vec<_>>()
        .join(", ");
    let mut merged = ExtractionCandidate::new(combined, best.confidence, "ppg_combined")
        .with_context(format!("Multiple PPG IDs found from: {}", sources))
        .validated(true);
    merged.position = best.position;
    vec![merged]
}

/// NPI check digit test: Luhn over `80840` + the first nine digits
pub fn validate_npi_luhn(npi: &str) -> bool {
    if npi.len() != 10 || !npi.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let payload = format!("{}{}", NPI_LUHN_PREFIX, &npi[..9]);
    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    u32::from(npi.as_bytes()[9] - b'0') == check
}

/// Format any 9-digit string as `XX-XXXXXXX`
pub fn normalize_tin(raw: &str) -> Option<String> {
    let d = digits(raw);
    (d.len() == 9).then(|| format!("{}-{}", &d[..2], &d[2..]))
}

/// Format a 10-digit string as `XXX-XXX-XXXX`
pub fn format_phone(raw: &str) -> Option<String> {
    let d = digits(raw);
    (d.len() == 10).then(|| format!("{}-{}-{}", &d[..3], &d[3..6], &d[6..]))
}

/// Normalize `M/D/YY(YY)` or `YYYY/M/D` (slash or hyphen) to `MM/DD/YYYY`.
///
/// Two-digit years below 50 become 20xx, the rest 19xx. Out-of-range
/// month (1-12), day (1-31) or year (1900-2100) yields `None`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (year, month, day) = if let Some(c) = DATE_ISO.captures(raw) {
        (c[1].to_string(), c[2].to_string(), c[3].to_string())
    } else if let Some(c) = DATE_US.captures(raw) {
        (c[3].to_string(), c[1].to_string(), c[2].to_string())
    } else {
        return None;
    };

    let year = if year.len() == 2 {
        let yy: u32 = year.parse().ok()?;
        if yy < 50 { 2000 + yy } else { 1900 + yy }
    } else {
        year.parse().ok()?
    };
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;

    if (1..=12).contains(&month) && (1..=31).contains(&day) && (1900..=2100).contains(&year) {
        Some(format!("{:02}/{:02}/{}", month, day, year))
    } else {
        None
    }
}

fn whole_start(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.start())
}

fn line_tail_mentions_provider(text: &str, from: usize) -> bool {
    let rest = &text[from..];
    let line = rest.split('\n').next().unwrap_or("").to_lowercase();
    ["provider", "npi", "national"].iter().any(|k| line.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npi_golden_values() {
        for valid in ["1234567893", "1245319599", "1003000126"] {
            assert!(validate_npi_luhn(valid), "{} should pass", valid);
        }
        for arbitrary in ["1234567890", "9876543210", "1111111111"] {
            let first = validate_npi_luhn(arbitrary);
            assert_eq!(first, validate_npi_luhn(arbitrary));
        }
        assert!(!validate_npi_luhn("1234567890"));
        assert!(!validate_npi_luhn("123456789"));
        assert!(!validate_npi_luhn("12345678a3"));
    }

    #[test]
    fn test_npi_labeled_and_deduplicated() {
        let text = "Provider NPI: 1234567893\nGroup NPI# 1245319599\nNPI 1234567893 again";
        let c = PatternExtractor::new().extract_npi_candidates(text);
        let values: Vec<_> = c.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["1234567893", "1245319599"]);
        assert_eq!(c[0].confidence, 0.9);
        assert!(c[0].validation_passed);
        assert_eq!(c[0].extractor_id, "npi_pattern_0");
    }

    #[test]
    fn test_npi_failed_checksum_scores_lower() {
        let c = PatternExtractor::new().extract_npi_candidates("NPI: 1234567890");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].confidence, 0.6);
        assert!(!c[0].validation_passed);
    }

    #[test]
    fn test_bare_npi_requires_provider_mention_on_line() {
        let p = PatternExtractor::new();
        assert!(p.extract_npi_candidates("Call 1234567893 tomorrow").is_empty());
        let c = p.extract_npi_candidates("ref 1003000126 is the provider number");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].extractor_id, "npi_pattern_3");
    }

    #[test]
    fn test_tin_labeled_and_bare() {
        let c = PatternExtractor::new().extract_tin_candidates("Tax ID: 123456789 and 98-7654321");
        assert_eq!(c[0].value, "12-3456789");
        assert_eq!(c[0].confidence, 0.9);
        let bare = c.iter().find(|c| c.value == "98-7654321").unwrap();
        assert_eq!(bare.confidence, 0.7);
    }

    #[test]
    fn test_tin_normalization_is_idempotent() {
        let once = normalize_tin("123456789").unwrap();
        assert_eq!(once, "12-3456789");
        assert_eq!(normalize_tin(&once).unwrap(), once);
        assert!(normalize_tin("1234").is_none());
    }

    #[test]
    fn test_ppg_codes_combined_and_sorted() {
        let c = PatternExtractor::new().extract_ppg_candidates("PPG: XY123 and PPG: AB45");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].value, "AB45, XY123");
        assert_eq!(c[0].extractor_id, "ppg_combined");
        assert!(c[0].context.contains("XY123@0"));
        assert!(c[0].context.contains("AB45@"));
    }

    #[test]
    fn test_ppg_false_positives_skipped() {
        let c = PatternExtractor::new().extract_ppg_candidates("PPG ID: 77AB");
        assert!(c.iter().all(|c| c.value == "77AB"));
        assert!(!c.is_empty());
    }

    #[test]
    fn test_ppg_shared_risk_context() {
        let c = PatternExtractor::new().extract_ppg_candidates("Shared Risk: Valley Medical - VMG1\n");
        assert!(!c.is_empty());
        assert!(c.iter().all(|c| c.value == "VMG1"));
        assert!(c.iter().any(|c| c.confidence == 0.9));
    }

    #[test]
    fn test_ppg_dash_code_ends_at_whitespace() {
        let c = PatternExtractor::new().extract_ppg_candidates("PPG - AB12 - CD34 end");
        assert_eq!(c[0].value, "AB12");
    }

    #[test]
    fn test_single_ppg_not_combined() {
        let c = PatternExtractor::new().extract_ppg_candidates("PPG# 4521");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].extractor_id, "ppg_pattern_0");
    }

    #[test]
    fn test_phone_formats() {
        let p = PatternExtractor::new();
        let c = p.extract_phone_candidates("Phone: 555.123.4567");
        assert_eq!(c[0].value, "555-123-4567");
        assert_eq!(c[0].confidence, 0.9);

        let c = p.extract_phone_candidates("Office (555) 987-6543");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].value, "555-987-6543");
        assert_eq!(c[0].confidence, 0.7);
    }

    #[test]
    fn test_fax() {
        let c = PatternExtractor::new().extract_fax_candidates("Fax: 555 222 3333");
        assert_eq!(c[0].value, "555-222-3333");
        assert_eq!(c[0].confidence, 0.9);
    }

    #[test]
    fn test_license_uppercased() {
        let p = PatternExtractor::new();
        let c = p.extract_license_candidates("State License: a12345");
        assert_eq!(c[0].value, "A12345");
        assert_eq!(c[0].confidence, 0.9);
        let c = p.extract_license_candidates("Lic # G654321");
        assert_eq!(c[0].value, "G654321");
        assert_eq!(c[0].confidence, 0.7);
    }

    #[test]
    fn test_date_normalization() {
        assert_eq!(normalize_date("09/22/2025").as_deref(), Some("09/22/2025"));
        assert_eq!(normalize_date("9-22-25").as_deref(), Some("09/22/2025"));
        assert_eq!(normalize_date("1/2/75").as_deref(), Some("01/02/1975"));
        assert_eq!(normalize_date("2025/09/22").as_deref(), Some("09/22/2025"));
        assert!(normalize_date("13/01/2025").is_none());
        assert!(normalize_date("01/32/2025").is_none());
        assert!(normalize_date("01/01/2200").is_none());
        assert!(normalize_date("soon").is_none());
    }

    #[test]
    fn test_labeled_dates_score_higher() {
        let c = PatternExtractor::new().extract_date_candidates("Effective Date: 10/01/2025");
        assert_eq!(c[0].value, "10/01/2025");
        assert_eq!(c[0].confidence, 0.9);
        assert!(c.iter().any(|c| c.extractor_id == "date_pattern_4" && c.confidence == 0.6));
    }

    #[test]
    fn test_transaction_lexicon() {
        let p = PatternExtractor::new();
        let c = p.extract_transaction_type_candidates("Please terminate and remove Dr. Lee.");
        assert_eq!(c[0].value, "Term");
        assert!((c[0].confidence - 0.6).abs() < 1e-9);

        let c = p.extract_transaction_type_candidates("Please add the new provider");
        assert_eq!(c[0].value, "Add");
    }

    #[test]
    fn test_transaction_negation_suppresses() {
        let p = PatternExtractor::new();
        assert!(p.extract_transaction_type_candidates("We will not terminate Dr. Lee").is_empty());
        assert!(p.extract_transaction_type_candidates("There are no changes this month").is_empty());
    }
}
