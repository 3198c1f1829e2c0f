//! Structural entity recognizer
//!
//! Exploits the signals an email body gives away for free: capitalisation,
//! punctuation and line breaks. Lexical knowledge is limited to the
//! gazetteer's organization types and specialty names plus short stop lists.
//!
//! - PERSON: a title (`Dr.`, `Doctor`, ...) followed by up to three
//!   capitalised words, or a bare run of two or three capitalised words
//! - ORG: a capitalised run ending in an organization type, joined across
//!   `&`/`and`, optionally continued by `of <Place>`
//! - DATE: numeric and word-month dates
//! - SPECIALTY: canonical specialty names

use regex::Regex;
use roster_domain::{EntityKind, EntityRecognizer, RecognizedEntity};
use std::collections::HashSet;
use std::sync::Arc;

use super::overlaps_any;
use crate::dates::{month_number, NUMERIC_DATE, WORD_DATE_PATTERNS};
use crate::gazetteer::Gazetteer;

const PERSON_CONFIDENCE: f64 = 0.7;
const ORG_CONFIDENCE: f64 = 0.7;
const DATE_CONFIDENCE: f64 = 0.8;
const SPECIALTY_CONFIDENCE: f64 = 0.85;

const MAX_NAME_WORDS: usize = 3;

const PERSON_PREFIX: &[&str] = &["dr", "doctor", "mr", "mrs", "ms", "prof"];

const CREDENTIALS: &[&str] = &["md", "do", "np", "pa", "rn", "dds", "dmd", "phd", "pac", "fnp", "lcsw"];

// Words that commonly start sentences or salutations but are not names
const SENTENCE_STARTERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "it", "he", "she", "we", "they", "i", "in",
    "on", "at", "to", "for", "from", "by", "with", "and", "but", "or", "so", "if", "because", "as",
    "per", "please", "kindly", "see", "note", "contact", "call", "email", "today", "now", "then",
    "what", "where", "when", "who", "why", "how", "is", "are", "was", "were", "be", "been", "have",
    "has", "had", "our", "your", "their", "his", "her", "my", "all", "any", "each", "dear", "hi",
    "hello", "thanks", "thank", "regards", "best", "sincerely", "kind", "re", "fw", "fwd",
    "subject", "attached", "following", "yes", "no", "let", "also",
];

// Roster field labels and transaction verbs that appear capitalised in headers
const FIELD_LABELS: &[&str] = &[
    "provider", "providers", "name", "npi", "tin", "tax", "id", "specialty", "license", "state",
    "phone", "fax", "address", "complete", "date", "effective", "term", "termination", "reason",
    "ppg", "lob", "line", "business", "organization", "group", "transaction", "type", "attribute",
    "number", "details", "information", "network", "medicare", "medicaid", "commercial", "office",
    "suite", "street", "avenue", "ave", "road", "city", "zip", "team", "department", "roster",
    "notice", "request", "update", "add", "terminate", "new", "change", "action", "status",
];

const WEEKDAYS: &[&str] = &["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];

// Left edge of an organization name never extends over these
const ORG_LEFT_STOP: &[&str] = &[
    "provider", "organization", "name", "affiliation", "network", "tin", "npi", "ppg", "lob",
];

/// Capitalisation/gazetteer recognizer
#[derive(Debug, Clone)]
pub struct HeuristicRecognizer {
    org_types: Vec<Vec<String>>,
    specialties: Vec<Regex>,
    name_stop: HashSet<String>,
}

impl HeuristicRecognizer {
    /// Build from the gazetteer's organization types and specialty names
    pub fn new(gazetteer: &Arc<Gazetteer>) -> Self {
        let mut org_types: Vec<Vec<String>> = gazetteer
            .organization_types()
            .iter()
            .map(|t| t.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
            .filter(|words| !words.is_empty())
            .collect();
        org_types.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut names: Vec<&str> = gazetteer.specialty_names();
        names.sort_by(|a, b| b.len().cmp(&a.len()));
        let specialties = names
            .iter()
            .filter_map(|name| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).ok())
            .collect();

        let mut name_stop: HashSet<String> = SENTENCE_STARTERS
            .iter()
            .chain(FIELD_LABELS)
            .chain(WEEKDAYS)
            .chain(CREDENTIALS)
            .chain(PERSON_PREFIX)
            .map(|w| w.to_string())
            .collect();
        name_stop.extend(org_types.iter().flatten().cloned());
        name_stop.extend(
            gazetteer
                .specialty_names()
                .iter()
                .flat_map(|n| n.split_whitespace())
                .map(str::to_lowercase),
        );

        Self {
            org_types,
            specialties,
            name_stop,
        }
    }

    fn is_name_word(&self, token: &Token<'_>) -> bool {
        if !starts_upper(token.core) {
            return false;
        }
        if token.is_initial() {
            return true;
        }
        if !token
            .core
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == '\'')
        {
            return false;
        }
        let lower = token.core.to_lowercase();
        if month_number(&lower).is_some() || self.name_stop.contains(&lower) {
            return false;
        }
        token.core.chars().count() > 1
    }

    fn is_org_word(&self, token: &Token<'_>) -> bool {
        let lower = token.core.to_lowercase();
        self.org_types.iter().flatten().any(|w| *w == lower)
    }

    /// Length of the name run starting at `from`, uncapped
    fn name_run(&self, tokens: &[Token<'_>], from: usize) -> usize {
        let mut n = 0;
        while let Some(token) = tokens.get(from + n) {
            if n > 0 && !joined(tokens, from + n) {
                break;
            }
            if !self.is_name_word(token) {
                break;
            }
            n += 1;
        }
        // a run never ends on a bare initial
        while n > 0 && tokens[from + n - 1].is_initial() {
            n -= 1;
        }
        n
    }

    fn persons(&self, text: &str, tokens: &[Token<'_>]) -> Vec<RecognizedEntity> {
        let mut entities = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];

            if token.is_title() && joined(tokens, i + 1) {
                let n = self.name_run(tokens, i + 1).min(MAX_NAME_WORDS);
                if n > 0 {
                    let (start, end) = (tokens[i + 1].start, tokens[i + n].end);
                    entities.push(RecognizedEntity::new(
                        EntityKind::Person,
                        &text[start..end],
                        start,
                        end,
                        PERSON_CONFIDENCE,
                    ));
                    i += n + 1;
                    continue;
                }
            }

            let n = self.name_run(tokens, i);
            if n == 0 {
                i += 1;
                continue;
            }
            let before_org = tokens
                .get(i + n)
                .is_some_and(|next| joined(tokens, i + n) && self.is_org_word(next));
            if (2..=MAX_NAME_WORDS).contains(&n) && !before_org {
                let (start, end) = (tokens[i].start, tokens[i + n - 1].end);
                entities.push(RecognizedEntity::new(
                    EntityKind::Person,
                    &text[start..end],
                    start,
                    end,
                    PERSON_CONFIDENCE,
                ));
            }
            i += n;
        }
        entities
    }

    fn organizations(&self, text: &str, tokens: &[Token<'_>]) -> Vec<RecognizedEntity> {
        let mut entities: Vec<RecognizedEntity> = Vec::new();
        let mut floor = 0;
        let mut i = 0;
        'scan: while i < tokens.len() {
            for org_type in &self.org_types {
                let Some(mut last) = self.match_type(tokens, i, org_type) else {
                    continue;
                };
                let first = self.extend_left(tokens, i, floor);
                if first == i {
                    continue;
                }
                last = self.extend_right(tokens, last);

                let (start, end) = (tokens[first].start, tokens[last].end);
                if !overlaps_any(&entities, start, end) {
                    entities.push(RecognizedEntity::new(
                        EntityKind::Organization,
                        &text[start..end],
                        start,
                        end,
                        ORG_CONFIDENCE,
                    ));
                }
                i = last + 1;
                floor = i;
                continue 'scan;
            }
            i += 1;
        }
        entities
    }

    /// Index of the last token when `org_type` matches at `at`
    fn match_type(&self, tokens: &[Token<'_>], at: usize, org_type: &[String]) -> Option<usize> {
        let last = at + org_type.len() - 1;
        if last >= tokens.len() || !starts_upper(tokens[at].core) {
            return None;
        }
        for (k, word) in org_type.iter().enumerate() {
            let token = &tokens[at + k];
            if k > 0 && !joined(tokens, at + k) {
                return None;
            }
            if token.core.to_lowercase() != *word {
                return None;
            }
        }
        Some(last)
    }

    /// Leftmost token of the name ending before `from`, never below `floor`
    fn extend_left(&self, tokens: &[Token<'_>], from: usize, floor: usize) -> usize {
        let mut first = from;
        while first > floor && joined(tokens, first) {
            let prev = &tokens[first - 1];
            if prev.is_connector() {
                if first >= floor + 2 && joined(tokens, first - 1) && self.org_name_word(&tokens[first - 2]) {
                    first -= 2;
                    continue;
                }
                break;
            }
            if !self.org_name_word(prev) {
                break;
            }
            first -= 1;
        }
        first
    }

    fn extend_right(&self, tokens: &[Token<'_>], from: usize) -> usize {
        let mut last = from;
        while last + 2 < tokens.len()
            && joined(tokens, last + 1)
            && joined(tokens, last + 2)
            && tokens[last + 1].core == "of"
            && starts_upper(tokens[last + 2].core)
        {
            last += 2;
            while last + 1 < tokens.len() && joined(tokens, last + 1) && self.org_name_word(&tokens[last + 1]) {
                last += 1;
            }
        }
        last
    }

    fn org_name_word(&self, token: &Token<'_>) -> bool {
        if !starts_upper(token.core) {
            return false;
        }
        let lower = token.core.to_lowercase();
        !SENTENCE_STARTERS.contains(&lower.as_str())
            && !PERSON_PREFIX.contains(&lower.as_str())
            && !ORG_LEFT_STOP.contains(&lower.as_str())
            && !WEEKDAYS.contains(&lower.as_str())
            && month_number(&lower).is_none()
    }

    fn dates(&self, text: &str) -> Vec<RecognizedEntity> {
        let mut entities: Vec<RecognizedEntity> = Vec::new();
        for pattern in WORD_DATE_PATTERNS.iter().chain(std::iter::once(&*NUMERIC_DATE)) {
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
        entities
    }

    fn specialties(&self, text: &str) -> Vec<RecognizedEntity> {
        let mut entities: Vec<RecognizedEntity> = Vec::new();
        for pattern in &self.specialties {
            for m in pattern.find_iter(text) {
                if !overlaps_any(&entities, m.start(), m.end()) {
                    entities.push(RecognizedEntity::new(
                        EntityKind::Specialty,
                        m.as_str(),
                        m.start(),
                        m.end(),
                        SPECIALTY_CONFIDENCE,
                    ));
                }
            }
        }
        entities
    }
}

impl EntityRecognizer for HeuristicRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, String> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tokens = tokenize(text);

        let organizations = self.organizations(text, &tokens);
        let mut entities: Vec<RecognizedEntity> = self
            .persons(text, &tokens)
            .into_iter()
            .filter(|p| !organizations.iter().any(|o| o.overlaps(p)))
            .collect();
        entities.extend(organizations);
        entities.extend(self.dates(text));
        entities.extend(self.specialties(text));

        entities.sort_by_key(|e| (e.start, e.end));
        Ok(entities)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// One whitespace-delimited word with its alphanumeric core
#[derive(Debug, Clone)]
struct Token<'a> {
    /// Word with surrounding punctuation removed (`&` is kept as-is)
    core: &'a str,
    /// Byte offset of the core
    start: usize,
    /// Byte offset one past the core
    end: usize,
    /// Punctuation following the core
    trailing: &'a str,
    /// A line break, bracket or punctuation-only word precedes this token
    breaks_before: bool,
}

impl Token<'_> {
    fn is_initial(&self) -> bool {
        self.core.chars().count() == 1 && starts_upper(self.core) && self.trailing.starts_with('.')
    }

    fn is_title(&self) -> bool {
        starts_upper(self.core) && PERSON_PREFIX.contains(&self.core.to_lowercase().as_str())
    }

    fn is_connector(&self) -> bool {
        self.core == "&" || self.core == "and"
    }

    /// Whether trailing punctuation ends a span after this token
    fn stops_after(&self) -> bool {
        if self.trailing.is_empty() {
            return false;
        }
        if self.trailing == "." && (self.is_initial() || self.is_title()) {
            return false;
        }
        self.trailing
            .chars()
            .any(|c| matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | ')' | ']' | '|' | '/'))
    }
}

/// Whether `tokens[idx]` continues the span ending at `tokens[idx - 1]`
fn joined(tokens: &[Token<'_>], idx: usize) -> bool {
    match (idx.checked_sub(1).and_then(|p| tokens.get(p)), tokens.get(idx)) {
        (Some(prev), Some(token)) => !token.breaks_before && !prev.stops_after(),
        _ => false,
    }
}

fn starts_upper(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pending_break = true;
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(text, start, i, &mut pending_break, &mut tokens);
            }
            if c == '\n' {
                pending_break = true;
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        push_word(text, start, text.len(), &mut pending_break, &mut tokens);
    }
    tokens
}

fn push_word<'a>(text: &'a str, start: usize, end: usize, pending_break: &mut bool, tokens: &mut Vec<Token<'a>>) {
    let raw = &text[start..end];
    if raw == "&" {
        tokens.push(Token {
            core: raw,
            start,
            end,
            trailing: "",
            breaks_before: std::mem::take(pending_break),
        });
        return;
    }
    let lead = raw.len() - raw.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
    let core = raw[lead..].trim_end_matches(|c: char| !c.is_alphanumeric());
    if core.is_empty() {
        *pending_break = true;
        return;
    }
    let core_start = start + lead;
    let core_end = core_start + core.len();
    tokens.push(Token {
        core,
        start: core_start,
        end: core_end,
        trailing: &text[core_end..end],
        breaks_before: std::mem::take(pending_break) || raw[..lead].contains(['(', '[', '"', '|']),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> HeuristicRecognizer {
        HeuristicRecognizer::new(&Arc::new(Gazetteer::builtin()))
    }

    fn texts(entities: &[RecognizedEntity], kind: EntityKind) -> Vec<&str> {
        entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.text.as_str())
            .collect()
    }

    #[test]
    fn test_titled_person_excludes_title() {
        let text = "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025.";
        let entities = recognizer().recognize(text).unwrap();
        assert_eq!(texts(&entities, EntityKind::Person), vec!["John Smith"]);
        let person = entities.iter().find(|e| e.kind == EntityKind::Person).unwrap();
        assert_eq!(&text[person.start..person.end], "John Smith");
        assert_eq!(texts(&entities, EntityKind::Date), vec!["09/22/2025"]);
    }

    #[test]
    fn test_bare_person_run() {
        let entities = recognizer()
            .recognize("Provider Name: Jane A. Doe\nSpecialty: Cardiology")
            .unwrap();
        assert_eq!(texts(&entities, EntityKind::Person), vec!["Jane A. Doe"]);
        assert_eq!(texts(&entities, EntityKind::Specialty), vec!["Cardiology"]);
    }

    #[test]
    fn test_labels_and_starters_are_not_names() {
        let entities = recognizer()
            .recognize("Please Update The Address\nEffective Date: March 1, 2025")
            .unwrap();
        assert!(texts(&entities, EntityKind::Person).is_empty());
        assert_eq!(texts(&entities, EntityKind::Date), vec!["March 1, 2025"]);
    }

    #[test]
    fn test_organization_run() {
        let entities = recognizer()
            .recognize("He is affiliated with Sunrise Valley Medical Group and Smith & Jones Associates.")
            .unwrap();
        assert_eq!(
            texts(&entities, EntityKind::Organization),
            vec!["Sunrise Valley Medical Group", "Smith & Jones Associates"]
        );
        assert!(texts(&entities, EntityKind::Person).is_empty());
    }

    #[test]
    fn test_organization_of_place() {
        let entities = recognizer()
            .recognize("Practicing at St Mary Medical Center of Long Beach, effective today")
            .unwrap();
        assert_eq!(
            texts(&entities, EntityKind::Organization),
            vec!["St Mary Medical Center of Long Beach"]
        );
    }

    #[test]
    fn test_line_breaks_split_spans() {
        let entities = recognizer().recognize("John\nSmith").unwrap();
        assert!(texts(&entities, EntityKind::Person).is_empty());
    }

    #[test]
    fn test_longest_specialty_wins() {
        let entities = recognizer()
            .recognize("Specialty: Pediatric Emergency Medicine")
            .unwrap();
        assert_eq!(
            texts(&entities, EntityKind::Specialty),
            vec!["Pediatric Emergency Medicine"]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(recognizer().recognize("   ").unwrap().is_empty());
    }
}
