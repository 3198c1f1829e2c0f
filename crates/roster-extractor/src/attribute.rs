//! Transaction attribute resolution
//!
//! An explicit `attribute: <value>` line always wins. Otherwise Term and Add
//! look for a handful of attribute-scoped phrases and default to `Provider`;
//! Update runs the weighted scorer over six attribute categories.

use once_cell::sync::Lazy;
use regex::Regex;
use roster_domain::{TransactionAttribute, TransactionType};
use tracing::debug;

use crate::rules::title_case;
use crate::text::compile_all;

/// Subject-line scoring looks at this many leading characters
const SUBJECT_CHARS: usize = 100;
const SUBJECT_MULTIPLIER: f64 = 1.2;
/// Top two scores closer than this go to the conflict resolver
const CONFLICT_MARGIN: f64 = 1.0;
const STRONG_INDICATOR_BONUS: f64 = 0.5;
/// Unmapped explicit values shorter than this are reported title-cased
const MAX_FREEFORM_ATTRIBUTE: usize = 50;

static EXPLICIT_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"transaction\s+attribute\s*:\s*([^\n\r]+)",
        r"attribute\s*:\s*([^\n\r]+)",
        r"changed\s+attribute\s*:\s*([^\n\r]+)",
        r"update\s+type\s*:\s*([^\n\r]+)",
    ])
});

const EXPLICIT_VALUES: &[(&str, TransactionAttribute)] = &[
    ("not applicable", TransactionAttribute::NotApplicable),
    ("n/a", TransactionAttribute::NotApplicable),
    ("na", TransactionAttribute::NotApplicable),
    ("none", TransactionAttribute::NotApplicable),
    ("address", TransactionAttribute::Address),
    ("location", TransactionAttribute::Address),
    ("specialty", TransactionAttribute::Specialty),
    ("specialization", TransactionAttribute::Specialty),
    ("phone", TransactionAttribute::PhoneNumber),
    ("phone number", TransactionAttribute::PhoneNumber),
    ("telephone", TransactionAttribute::PhoneNumber),
    ("contact", TransactionAttribute::PhoneNumber),
    ("ppg", TransactionAttribute::Ppg),
    ("ppg id", TransactionAttribute::Ppg),
    ("practice group", TransactionAttribute::Ppg),
    ("lob", TransactionAttribute::Lob),
    ("line of business", TransactionAttribute::Lob),
    ("network", TransactionAttribute::Lob),
    ("provider", TransactionAttribute::Provider),
    ("general", TransactionAttribute::Provider),
    ("demographic", TransactionAttribute::Provider),
];

const TERM_SCOPED: &[(&str, TransactionAttribute)] = &[
    ("address termination", TransactionAttribute::Address),
    ("phone termination", TransactionAttribute::PhoneNumber),
    ("ppg termination", TransactionAttribute::Ppg),
    ("lob termination", TransactionAttribute::Lob),
    ("terminate address only", TransactionAttribute::Address),
    ("terminate phone only", TransactionAttribute::PhoneNumber),
    ("terminate ppg only", TransactionAttribute::Ppg),
    ("terminate lob only", TransactionAttribute::Lob),
    ("specialty termination", TransactionAttribute::Specialty),
];

const ADD_SCOPED: &[(&str, TransactionAttribute)] = &[
    ("add new address to", TransactionAttribute::Address),
    ("add new specialty to", TransactionAttribute::Specialty),
    ("add new phone to", TransactionAttribute::PhoneNumber),
    ("add new ppg to", TransactionAttribute::Ppg),
    ("add new lob to", TransactionAttribute::Lob),
    ("include new address in", TransactionAttribute::Address),
    ("include new specialty in", TransactionAttribute::Specialty),
    ("include new phone in", TransactionAttribute::PhoneNumber),
];

/// Weighted cues for one attribute category
struct AttributeCues {
    attribute: TransactionAttribute,
    explicit: &'static [(&'static str, f64)],
    contextual: &'static [(&'static str, f64)],
    subjects: &'static [(&'static str, f64)],
    strong: &'static [&'static str],
}

const CUES: [AttributeCues; 6] = [
    AttributeCues {
        attribute: TransactionAttribute::Address,
        explicit: &[
            ("address change", 3.0),
            ("address update", 3.0),
            ("location change", 3.0),
            ("office change", 3.0),
            ("practice location", 2.8),
            ("new address", 2.5),
            ("relocate", 2.5),
            ("relocation", 2.5),
            ("move", 2.3),
            ("transfer", 2.0),
        ],
        contextual: &[
            ("address", 1.5),
            ("location", 1.2),
            ("street", 1.8),
            ("suite", 1.8),
            ("building", 1.5),
            ("zip", 1.8),
            ("city", 1.0),
            ("state", 0.8),
        ],
        subjects: &[(r"address.*change", 2.5), (r"location.*update", 2.5), (r"move.*office", 2.0)],
        strong: &["street", "suite", "zip code", "city", "state", "building", "floor"],
    },
    AttributeCues {
        attribute: TransactionAttribute::Specialty,
        explicit: &[
            ("specialty change", 3.0),
            ("specialty update", 3.0),
            ("specialization change", 2.8),
            ("practice change", 2.5),
            ("field change", 2.5),
            ("new specialty", 2.3),
        ],
        contextual: &[
            ("specialty", 1.8),
            ("specialization", 1.5),
            ("practice area", 1.5),
            ("medical field", 1.3),
            ("discipline", 1.2),
            ("board certified", 1.0),
        ],
        subjects: &[(r"specialty.*change", 2.5), (r"practice.*update", 2.0)],
        strong: &["board certified", "residency", "fellowship", "medical school", "practice area"],
    },
    AttributeCues {
        attribute: TransactionAttribute::PhoneNumber,
        explicit: &[
            ("phone change", 3.0),
            ("phone update", 3.0),
            ("contact change", 2.8),
            ("phone number change", 3.2),
            ("telephone change", 3.0),
            ("fax change", 2.8),
            ("contact update", 2.5),
            ("new phone", 2.3),
            ("new contact", 2.0),
        ],
        contextual: &[
            ("phone", 1.8),
            ("telephone", 1.5),
            ("fax", 1.5),
            ("contact", 1.2),
            ("number", 1.0),
        ],
        subjects: &[(r"phone.*change", 2.5), (r"contact.*update", 2.5), (r"fax.*change", 2.5)],
        strong: &["extension", "ext", "area code", "toll free", "direct line"],
    },
    AttributeCues {
        attribute: TransactionAttribute::Ppg,
        explicit: &[
            ("ppg change", 3.0),
            ("ppg update", 3.0),
            ("group change", 2.5),
            ("practice group change", 3.2),
            ("ppg id change", 3.0),
            ("new ppg", 2.3),
        ],
        contextual: &[("ppg", 2.0), ("practice group", 1.8), ("group id", 1.5), ("ppg id", 2.0)],
        subjects: &[(r"ppg.*change", 2.5), (r"group.*update", 2.0)],
        strong: &["group number", "practice id", "group code"],
    },
    AttributeCues {
        attribute: TransactionAttribute::Lob,
        explicit: &[
            ("lob change", 3.0),
            ("network change", 2.8),
            ("line of business change", 3.2),
            ("plan change", 2.5),
            ("coverage change", 2.5),
            ("insurance change", 2.3),
        ],
        contextual: &[
            ("line of business", 2.0),
            ("lob", 1.8),
            ("network", 1.5),
            ("medicare", 1.3),
            ("commercial", 1.3),
            ("medicaid", 1.3),
            ("insurance", 1.2),
            ("plan", 1.0),
        ],
        subjects: &[(r"lob.*change", 2.5), (r"network.*update", 2.5), (r"plan.*change", 2.0)],
        strong: &["effective date", "coverage", "eligibility", "enrollment"],
    },
    AttributeCues {
        attribute: TransactionAttribute::Provider,
        explicit: &[
            ("provider change", 2.0),
            ("provider update", 2.0),
            ("provider information", 1.8),
            ("demographic change", 2.2),
            ("information update", 1.5),
        ],
        contextual: &[
            ("provider", 1.0),
            ("doctor", 0.8),
            ("physician", 0.8),
            ("demographic", 1.2),
            ("information", 0.5),
            ("data", 0.5),
        ],
        subjects: &[(r"provider.*update", 2.0), (r"information.*change", 1.5)],
        strong: &["credentials", "license", "certification", "npi", "name change"],
    },
];

static SUBJECT_PATTERNS: Lazy<Vec<Vec<(Regex, f64)>>> = Lazy::new(|| {
    CUES.iter()
        .map(|cues| {
            cues.subjects
                .iter()
                .map(|(pattern, weight)| (Regex::new(pattern).unwrap(), *weight))
                .collect()
        })
        .collect()
});

/// Attribute for a record with the given transaction type.
///
/// Returns the canonical spelling, or a title-cased free-form value taken
/// from an explicit attribute line.
pub fn resolve_attribute(transaction_type: Option<TransactionType>, text: &str) -> String {
    if let Some(explicit) = explicit_attribute(text) {
        debug!("Explicit transaction attribute: {}", explicit);
        return explicit;
    }

    let lower = text.to_lowercase();
    let attribute = match transaction_type {
        Some(TransactionType::Term) => scoped_attribute(&lower, TERM_SCOPED),
        Some(TransactionType::Add) => scoped_attribute(&lower, ADD_SCOPED),
        Some(TransactionType::Update) => score_update_attribute(&lower),
        None => TransactionAttribute::NotApplicable,
    };
    attribute.as_str().to_string()
}

/// Value of the first `attribute:`-style line, mapped to a canonical attribute
pub fn explicit_attribute(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for pattern in EXPLICIT_LINES.iter() {
        let Some(value) = pattern.captures(&lower).and_then(|c| c.get(1)) else {
            continue;
        };
        let value = value.as_str().trim();
        if let Some((_, attribute)) = EXPLICIT_VALUES.iter().find(|(key, _)| contains_word(value, key)) {
            return Some(attribute.as_str().to_string());
        }
        if value.chars().count() < MAX_FREEFORM_ATTRIBUTE {
            return Some(title_case(value));
        }
    }
    None
}

/// Weighted category scoring for Update transactions
pub fn score_update_attribute(lower: &str) -> TransactionAttribute {
    let subject: String = lower.chars().take(SUBJECT_CHARS).collect();

    let mut scores: Vec<(usize, f64)> = CUES
        .iter()
        .enumerate()
        .map(|(i, cues)| {
            let mut score: f64 = cues
                .explicit
                .iter()
                .chain(cues.contextual)
                .filter(|(phrase, _)| lower.contains(phrase))
                .map(|(_, weight)| weight)
                .sum();
            score += SUBJECT_PATTERNS[i]
                .iter()
                .filter(|(pattern, _)| pattern.is_match(&subject))
                .map(|(_, weight)| weight * SUBJECT_MULTIPLIER)
                .sum::<f64>();
            (i, score)
        })
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (first, first_score) = scores[0];
    if first_score <= 0.0 {
        return TransactionAttribute::Provider;
    }
    let (second, second_score) = scores[1];
    if second_score > 0.0 && (first_score - second_score).abs() < CONFLICT_MARGIN {
        let adjusted = |i: usize, score: f64| {
            score + CUES[i].strong.iter().filter(|s| lower.contains(*s)).count() as f64 * STRONG_INDICATOR_BONUS
        };
        if adjusted(first, first_score) >= adjusted(second, second_score) {
            return CUES[first].attribute;
        }
        return CUES[second].attribute;
    }
    CUES[first].attribute
}

fn scoped_attribute(lower: &str, phrases: &[(&str, TransactionAttribute)]) -> TransactionAttribute {
    phrases
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map_or(TransactionAttribute::Provider, |(_, attribute)| *attribute)
}

/// `needle` occurs in `haystack` with no alphanumeric character on either side
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_line_wins() {
        let text = "Subject: provider update\nTransaction Attribute: Phone Number\nNew phone 555-123-4567";
        assert_eq!(resolve_attribute(Some(TransactionType::Term), text), "Phone Number");
    }

    #[test]
    fn test_explicit_values_match_whole_words() {
        assert_eq!(explicit_attribute("Attribute: N/A").as_deref(), Some("Not Applicable"));
        assert_eq!(explicit_attribute("attribute: name change").as_deref(), Some("Name Change"));
        assert_eq!(explicit_attribute("Update type: office location").as_deref(), Some("Address"));
        assert_eq!(explicit_attribute("no labels here"), None);
    }

    #[test]
    fn test_term_and_add_scoped_phrases() {
        assert_eq!(resolve_attribute(Some(TransactionType::Term), "Please process an address termination"), "Address");
        assert_eq!(resolve_attribute(Some(TransactionType::Term), "Terminate Dr. Lee"), "Provider");
        assert_eq!(
            resolve_attribute(Some(TransactionType::Add), "Please add new specialty to Dr. Lee"),
            "Specialty"
        );
        assert_eq!(resolve_attribute(Some(TransactionType::Add), "Welcome Dr. Lee"), "Provider");
    }

    #[test]
    fn test_unknown_type_is_not_applicable() {
        assert_eq!(resolve_attribute(None, "hello"), "Not Applicable");
    }

    #[test]
    fn test_update_scoring_address() {
        let text = "subject: address change for dr. lee\nnew office at 12 main street, suite 4";
        assert_eq!(score_update_attribute(text), TransactionAttribute::Address);
    }

    #[test]
    fn test_update_scoring_defaults_to_provider() {
        assert_eq!(score_update_attribute("please see below"), TransactionAttribute::Provider);
    }

    #[test]
    fn test_conflict_resolver_uses_strong_indicators() {
        // phone 1.8 vs ppg 2.0 is within the margin; "extension" tips it to phone
        assert_eq!(score_update_attribute("ppg, phone extension"), TransactionAttribute::PhoneNumber);
        assert_eq!(score_update_attribute("ppg, phone"), TransactionAttribute::Ppg);
    }
}
