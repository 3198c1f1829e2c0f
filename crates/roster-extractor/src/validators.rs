//! Single-field format checks
//!
//! Every check returns a [`FieldCheck`]; a passing check carries the value in
//! its canonical shape. None of them alter the input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::normalize_date;
use crate::text::digits;

static TAXONOMY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[12]\d{2}[A-Z]\d{5}X$").unwrap());
static LICENSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]\d{5,6}$").unwrap());

/// Outcome of one field check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    /// Whether the value passed
    pub valid: bool,

    /// Human-readable verdict
    pub message: String,

    /// Canonical form of the value (empty when invalid)
    pub normalized: String,
}

impl FieldCheck {
    fn pass(message: impl Into<String>, normalized: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
            normalized: normalized.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            normalized: String::new(),
        }
    }
}

/// Ten digits once punctuation is removed.
///
/// The check digit is not enforced here: test rosters routinely carry
/// placeholder NPIs. Use [`crate::patterns::validate_npi_luhn`] for that.
pub fn validate_npi(npi: &str) -> FieldCheck {
    if npi.trim().is_empty() {
        return FieldCheck::fail("NPI is empty");
    }
    let clean = digits(npi);
    if clean.len() != 10 {
        return FieldCheck::fail(format!("NPI must be 10 digits, got {}", clean.len()));
    }
    FieldCheck::pass("Valid NPI", clean)
}

/// Nine digits, normalized to `XX-XXXXXXX`
pub fn validate_tin(tin: &str) -> FieldCheck {
    if tin.trim().is_empty() {
        return FieldCheck::fail("TIN is empty");
    }
    let clean = digits(tin);
    if clean.len() != 9 {
        return FieldCheck::fail(format!("TIN must be 9 digits, got {}", clean.len()));
    }
    FieldCheck::pass("Valid TIN", format!("{}-{}", &clean[..2], &clean[2..]))
}

/// Provider taxonomy code, e.g. `207RC0000X`
pub fn validate_taxonomy_code(code: &str) -> FieldCheck {
    let clean = code.trim().to_uppercase();
    if clean.is_empty() {
        return FieldCheck::fail("Taxonomy code is empty");
    }
    if !TAXONOMY_CODE.is_match(&clean) {
        return FieldCheck::fail("Invalid taxonomy code format. Expected: [12]DD[A-Z]DDDDDX");
    }
    FieldCheck::pass("Valid taxonomy code", clean)
}

/// Phone or fax number: 10 digits, or 11 with a leading 1
pub fn validate_phone(number: &str) -> FieldCheck {
    if number.trim().is_empty() {
        return FieldCheck::fail("number is empty");
    }
    let mut clean = digits(number);
    match clean.len() {
        n if n < 10 => return FieldCheck::fail(format!("number too short: {} digits", n)),
        n if n > 11 => return FieldCheck::fail(format!("number too long: {} digits", n)),
        11 if clean.starts_with('1') => {
            clean.remove(0);
        }
        11 => return FieldCheck::fail("11-digit number must start with 1"),
        _ => {}
    }
    FieldCheck::pass(
        "Valid number",
        format!("{}-{}-{}", &clean[..3], &clean[3..6], &clean[6..]),
    )
}

/// State license: a letter followed by 5-6 digits
pub fn validate_license(license: &str) -> FieldCheck {
    let clean = license.trim().to_uppercase();
    if clean.is_empty() {
        return FieldCheck::fail("License number is empty");
    }
    if !LICENSE.is_match(&clean) {
        return FieldCheck::fail("Invalid license format. Expected: Letter followed by 5-6 digits");
    }
    FieldCheck::pass("Valid license format", clean)
}

/// US (`M/D/YY(YY)`) or ISO (`YYYY-M-D`) date, normalized to `MM/DD/YYYY`
pub fn validate_date(date: &str) -> FieldCheck {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return FieldCheck::fail("Date is empty");
    }
    match normalize_date(trimmed).filter(|_| is_date_shaped(trimmed)) {
        Some(normalized) => FieldCheck::pass("Valid date", normalized),
        None => FieldCheck::fail(format!("Could not parse date: {}", trimmed)),
    }
}

/// PPG id(s): alphanumerics, commas and spaces survive
pub fn validate_ppg(ppg: &str) -> FieldCheck {
    if ppg.trim().is_empty() {
        return FieldCheck::fail("PPG ID is empty");
    }
    let clean: String = ppg
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ',' || *c == ' ')
        .collect();
    let clean = clean.trim();
    if clean.is_empty() {
        return FieldCheck::fail("PPG ID contains no valid characters");
    }
    FieldCheck::pass("Valid PPG ID", clean)
}

fn is_date_shaped(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || c == '/' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npi() {
        assert_eq!(validate_npi("123-456-7893").normalized, "1234567893");
        assert!(!validate_npi("12345").valid);
        assert!(!validate_npi("").valid);
    }

    #[test]
    fn test_tin() {
        assert_eq!(validate_tin("123456789").normalized, "12-3456789");
        assert_eq!(validate_tin("12-3456789").normalized, "12-3456789");
        assert!(!validate_tin("1234").valid);
    }

    #[test]
    fn test_taxonomy_code() {
        assert_eq!(validate_taxonomy_code(" 207rc0000x ").normalized, "207RC0000X");
        assert!(!validate_taxonomy_code("307RC0000X").valid);
        assert!(!validate_taxonomy_code("207RC000X").valid);
    }

    #[test]
    fn test_phone_lengths() {
        assert_eq!(validate_phone("(555) 123-4567").normalized, "555-123-4567");
        assert_eq!(validate_phone("1-555-123-4567").normalized, "555-123-4567");
        assert!(validate_phone("2-555-123-4567").message.contains("start with 1"));
        assert!(validate_phone("555-1234").message.contains("too short"));
        assert!(validate_phone("555 123 4567 8901").message.contains("too long"));
    }

    #[test]
    fn test_license() {
        assert_eq!(validate_license("g68269").normalized, "G68269");
        assert!(!validate_license("GG6826").valid);
        assert!(!validate_license("G1234").valid);
    }

    #[test]
    fn test_dates() {
        assert_eq!(validate_date("9-22-25").normalized, "09/22/2025");
        assert_eq!(validate_date("2025-09-22").normalized, "09/22/2025");
        assert!(!validate_date("13/01/2025").valid);
        assert!(!validate_date("sometime soon").valid);
    }

    #[test]
    fn test_ppg() {
        assert_eq!(validate_ppg("AB45, XY123").normalized, "AB45, XY123");
        assert_eq!(validate_ppg(" P04; ").normalized, "P04");
        assert!(!validate_ppg("#!").valid);
    }
}
