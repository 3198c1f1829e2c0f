//! Termination reason heuristic

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::title_case;
use crate::text::compile_all;

/// Keyword categories, checked in order; the first hit names the reason
const REASON_KEYWORDS: &[(&[&str], &str)] = &[
    (&["voluntary", "voluntarily", "by choice", "provider choice", "own choice"], "Voluntary"),
    (&["retired", "retirement", "retiring", "end of career"], "Retired"),
    (
        &["contract end", "contract ended", "contract expir", "agreement end", "term of contract"],
        "Contract Ended",
    ),
    (&["non-renewal", "not renewed", "renewal denied"], "Contract Not Renewed"),
    (&["performance", "quality concern", "quality issue", "disciplinary"], "Performance Issues"),
    (&["credentialing", "credential", "licensing issue", "license problem"], "Credentialing Issues"),
    (&["relocat", "relocation", "moved", "moving", "geographic", "out of area"], "Relocation"),
    (
        &["business", "financial", "practice sold", "practice closed", "consolidation"],
        "Business Decision",
    ),
    (&["deceased", "death", "disability", "unable to practice"], "Death/Disability"),
    (&["network change", "panel", "network restructur", "plan change"], "Network Changes"),
    (&["involuntary", "terminated", "dismissal", "termination"], "Involuntary"),
    (&["administrative", "clerical", "other"], "Other"),
];

static REASON_CAPTURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"reason[:\s]+([^,.\n]+)",
        r"term(?:ination)?\s+reason[:\s]+([^,.\n]+)",
        r"due\s+to[:\s]+([^,.\n]+)",
        r"because\s+of[:\s]+([^,.\n]+)",
        r"result\s+of[:\s]+([^,.\n]+)",
    ])
});

/// Short reason table applied to captured `reason:` / `due to` phrases
const CAPTURED_REASONS: &[(&[&str], &str)] = &[
    (&["voluntary", "choice"], "Voluntary"),
    (&["retired", "retirement"], "Retired"),
    (&["contract", "agreement"], "Contract Ended"),
    (&["relocation", "moved", "moving"], "Relocation"),
    (&["performance", "quality"], "Performance Issues"),
];

/// Termination reason named in `text`, if any.
///
/// Keyword categories are tried first, then phrases following `reason:`,
/// `due to`, `because of` or `result of`.
pub fn extract_term_reason(text: &str) -> Option<String> {
    let lower = text.to_lowercase();

    for (keywords, reason) in REASON_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(reason.to_string());
        }
    }

    REASON_CAPTURES
        .iter()
        .flat_map(|pattern| pattern.captures_iter(&lower))
        .filter_map(|caps| caps.get(1))
        .find_map(|m| map_captured_reason(m.as_str()))
}

fn map_captured_reason(phrase: &str) -> Option<String> {
    let phrase = phrase.trim();
    CAPTURED_REASONS
        .iter()
        .find(|(words, _)| words.iter().any(|w| phrase.contains(w)))
        .map(|(_, reason)| reason.to_string())
        .or_else(|| (phrase.chars().count() > 2).then(|| title_case(phrase)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_categories() {
        assert_eq!(extract_term_reason("Reason: retirement.").as_deref(), Some("Retired"));
        assert_eq!(
            extract_term_reason("He is moving out of state").as_deref(),
            Some("Relocation")
        );
        assert_eq!(
            extract_term_reason("Provider was terminated for cause").as_deref(),
            Some("Involuntary")
        );
    }

    #[test]
    fn test_category_order() {
        // Retired is checked before Involuntary
        assert_eq!(
            extract_term_reason("Terminated due to retirement").as_deref(),
            Some("Retired")
        );
    }

    #[test]
    fn test_captured_phrase_is_title_cased() {
        assert_eq!(
            extract_term_reason("Please remove. Reason: joined a hospitalist group").as_deref(),
            Some("Joined A Hospitalist Group")
        );
    }

    #[test]
    fn test_no_reason() {
        assert_eq!(extract_term_reason("Please remove Dr. Lee"), None);
        assert_eq!(extract_term_reason("Reason: ok"), None);
    }
}
