//! Regex-only entity recognizer
//!
//! Used when the structural recognizer is unavailable. Only shapes that are
//! reliable by format are emitted: titled or credentialed names, month-name
//! dates and capitalised names ending in an organization alias. No
//! specialty spans.

use once_cell::sync::Lazy;
use regex::Regex;
use roster_domain::{EntityKind, EntityRecognizer, RecognizedEntity};
use std::sync::Arc;
use tracing::warn;

use super::overlaps_any;
use crate::dates::WORD_DATE_PATTERNS;
use crate::gazetteer::Gazetteer;

/// Back-end name reported through [`EntityRecognizer::name`]
pub const PATTERN_RECOGNIZER_NAME: &str = "pattern";

const PERSON_CONFIDENCE: f64 = 0.6;
const DATE_CONFIDENCE: f64 = 0.7;
const ORG_CONFIDENCE: f64 = 0.6;

static PERSON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    crate::text::compile_all(&[
        r"\b(?:Dr\.?|Doctor)[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?(?:[ \t]+[A-Z][a-z'\-]+){1,2})\b",
        r"\b([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?[ \t]+[A-Z][a-z'\-]+),?[ \t]+M\.?D\b",
        r"\b([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?[ \t]+[A-Z][a-z'\-]+),?[ \t]+D\.?O\b",
    ])
});

const LEADING_NOISE: &[&str] = &[
    "The", "Please", "Dear", "Re", "Fw", "Fwd", "Subject", "Provider", "Organization", "Attn", "With", "At",
];

/// Regex fallback recognizer
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    organization: Option<Regex>,
}

impl PatternRecognizer {
    /// Build the organization pattern from the gazetteer's aliases
    pub fn new(gazetteer: &Arc<Gazetteer>) -> Self {
        let aliases: Vec<String> = gazetteer
            .organization_types()
            .iter()
            .map(|t| regex::escape(t).replace(' ', r"[ \t]+"))
            .collect();
        let organization = if aliases.is_empty() {
            None
        } else {
            let pattern = format!(
                r"\b((?:[A-Z][A-Za-z'\-]+|&)(?:[ \t]+(?:[A-Z][A-Za-z'\-]+|&|and))*[ \t]+(?i:{}))\b",
                aliases.join("|")
            );
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Organization pattern unavailable: {}", e);
                    None
                }
            }
        };
        Self { organization }
    }

    fn organizations(&self, text: &str, entities: &mut Vec<RecognizedEntity>) {
        let Some(pattern) = &self.organization else {
            return;
        };
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let (start, surface) = trim_leading_noise(m.start(), m.as_str());
            if !surface.contains(char::is_whitespace) || overlaps_any(entities, start, m.end()) {
                continue;
            }
            entities.push(RecognizedEntity::new(
                EntityKind::Organization,
                surface,
                start,
                m.end(),
                ORG_CONFIDENCE,
            ));
        }
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, String> {
        let mut entities: Vec<RecognizedEntity> = Vec::new();

        for pattern in PERSON_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                if !overlaps_any(&entities, m.start(), m.end()) {
                    entities.push(RecognizedEntity::new(
                        EntityKind::Person,
                        m.as_str(),
                        m.start(),
                        m.end(),
                        PERSON_CONFIDENCE,
                    ));
                }
            }
        }

        for pattern in WORD_DATE_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                if !overlaps_any(&entities, m.start(), m.end()) {
                    entities.push(RecognizedEntity::new(
                        EntityKind::Date,
                        m.as_str(),
                        m.start(),
                        m.end(),
                        DATE_CONFIDENCE,
                    ));
                }
            }
        }

        self.organizations(text, &mut entities);

        entities.sort_by_key(|e| (e.start, e.end));
        Ok(entities)
    }

    fn name(&self) -> &'static str {
        PATTERN_RECOGNIZER_NAME
    }
}

fn trim_leading_noise(mut start: usize, mut surface: &str) -> (usize, &str) {
    while let Some((first, rest)) = surface.split_once(char::is_whitespace) {
        if !LEADING_NOISE.contains(&first) {
            break;
        }
        let rest_trimmed = rest.trim_start();
        start += surface.len() - rest_trimmed.len();
        surface = rest_trimmed;
    }
    (start, surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize(text: &str) -> Vec<RecognizedEntity> {
        PatternRecognizer::new(&Arc::new(Gazetteer::builtin()))
            .recognize(text)
            .unwrap()
    }

    fn of_kind(entities: &[RecognizedEntity], kind: EntityKind) -> Vec<&str> {
        entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.text.as_str())
            .collect()
    }

    #[test]
    fn test_titled_and_credentialed_names() {
        let entities = recognize("Please add Dr. Maria Lopez and Robert Chen, MD to the roster.");
        assert_eq!(of_kind(&entities, EntityKind::Person), vec!["Maria Lopez", "Robert Chen"]);
        assert!(entities
            .iter()
            .filter(|e| e.kind == EntityKind::Person)
            .all(|e| e.confidence == PERSON_CONFIDENCE));
    }

    #[test]
    fn test_month_name_dates_only() {
        let entities = recognize("Effective September 22, 2025 (was 09/01/2025)");
        assert_eq!(of_kind(&entities, EntityKind::Date), vec!["September 22, 2025"]);
    }

    #[test]
    fn test_organization_alias() {
        let entities = recognize("Please Note: Dr. Lee joins Valley Family Practice next week.");
        assert_eq!(
            of_kind(&entities, EntityKind::Organization),
            vec!["Valley Family Practice"]
        );
    }

    #[test]
    fn test_leading_noise_trimmed() {
        let entities = recognize("The Sunrise Medical Group team");
        let org = entities.iter().find(|e| e.kind == EntityKind::Organization).unwrap();
        assert_eq!(org.text, "Sunrise Medical Group");
        assert_eq!(org.start, 4);
    }

    #[test]
    fn test_no_specialties() {
        let entities = recognize("Specialty: Cardiology");
        assert!(of_kind(&entities, EntityKind::Specialty).is_empty());
    }
}
