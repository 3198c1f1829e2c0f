//! Entity and gazetteer extraction
//!
//! Candidates for the fields regexes handle poorly: provider names,
//! organizations, specialties, word-form dates, line of business and the
//! transaction type. Entity spans come from whichever [`EntityRecognizer`]
//! was selected at construction; everything layered on top (gazetteer
//! lookups, fuzzy matching, confidence rules) is independent of it.
//!
//! Every public `extract_*` method is infallible. A recognizer failure is
//! logged and the call yields no candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use roster_domain::{
    best_by_confidence, EntityKind, EntityRecognizer, ExtractionCandidate, RecognizedEntity, TransactionType,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::EntityConfig;
use crate::dates::normalize_any_date;
use crate::error::{ExtractorError, Result};
use crate::gazetteer::Gazetteer;
use crate::recognizer::{build_recognizer, PATTERN_RECOGNIZER_NAME};
use crate::rules::title_case;
use crate::similarity::{best_match, partial_ratio, ratio};
use crate::text::{compile_all, context_window, slice, span_context};

const TITLE_BONUS: f64 = 0.2;
const DATE_CONTEXT_BONUS: f64 = 0.1;

static PROVIDER_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i:\b(?:dr|doctor|physician)\b)|\b(?:M\.?D|D\.?O)\b").unwrap());
static LEADING_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:dr\.?|doctor)\s+").unwrap());
static CREDENTIAL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),\s*(M\.?D\.?|D\.?O\.?)$").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

static SALUTATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"^dear\s+",
        r"^hi\s*,?$",
        r"^hello\s*,?$",
        r"^greetings\s*,?$",
        r"^to\s+whom",
        r"^attention",
        r"^regarding",
    ])
});
static HEADER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(from|to|subject|date|received):").unwrap());
static LABEL_ONLY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z\s,&]+:$").unwrap());
static CLOSING: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"^best\s+(regards?|wishes)",
        r"^sincerely",
        r"^thank\s+you",
        r"^regards?$",
        r"^thanks?$",
        r"^cheers?$",
        r"^yours?\s+",
        r"^respectfully",
        r"^cordially",
    ])
});
static SPACED_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\|\s+").unwrap());
static LABELED_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+:\s*\w+\s*\|\s*\w+:").unwrap());
static AMPERSAND_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*&\s+([A-Z][A-Z\s&]+)").unwrap());
static ALL_CAPS_ORG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]+(\s*&\s*[A-Z]+)*$").unwrap());

static SPECIALTY_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:[a-z]+[ \t]+)?[a-z]*(?:medicine|surgery|ology|ics|ist|ian)[a-z]*\b").unwrap()
});
static SPECIALTY_LABELS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)specialty[:\s]+([^,.\n]+)",
        r"(?i)field[:\s]+([^,.\n]+)",
        r"(?i)specialization[:\s]+([^,.\n]+)",
        r"(?i)area[:\s]+([^,.\n]+)",
        r"(?i)practice[:\s]+([^,.\n]+)",
    ])
});

const NAME_SKIP: &[&str] = &["best regards", "thank you", "sincerely", "email", "phone"];

const SHORT_SYNONYM_NOISE: &[&str] = &[
    "provider",
    "deliver",
    "other",
    "over",
    "under",
    "after",
    "never",
    "number",
    "management",
    "different",
    "treatment",
    "department",
    "agreement",
    "statement",
];

const HEALTHCARE_TERMS: &[&str] = &[
    "medical",
    "clinic",
    "hospital",
    "practice",
    "physicians",
    "health",
    "healthcare",
    "group",
    "associates",
    "center",
];
const NON_HEALTHCARE_TERMS: &[&str] = &[
    "microsoft",
    "google",
    "email",
    "outlook",
    "exchange",
    "best regards",
    "thank you",
    "sincerely",
];
const HEALTH_PLAN_TERMS: &[&str] = &[
    "insurance",
    "health plan",
    "hmo",
    "ppo",
    "epo",
    "pos",
    "medicare",
    "medicaid",
    "coverage",
    "benefits plan",
    "health net",
    "health care plan",
    "managed care",
];
const PROVIDER_ORG_TERMS: &[&str] = &[
    "medical group",
    "medical center",
    "clinic",
    "hospital",
    "practice",
    "physicians",
    "health center",
    "associates",
];
const ORG_SMALL_WORDS: &[&str] = &["and", "the", "of", "for", "in", "on", "at"];

const DATE_CONTEXT_WORDS: &[&str] = &["effective", "start", "begin", "term", "end", "finish", "expir"];

const EXPLICIT_TRANSACTION_PHRASES: &[(TransactionType, &[&str])] = &[
    (
        TransactionType::Term,
        &[
            "provider termination",
            "terminate provider",
            "provider term",
            "discontinue provider",
            "remove provider",
            "end provider",
            "provider withdrawal",
            "cancel provider",
            "provider departure",
        ],
    ),
    (
        TransactionType::Update,
        &[
            "address change",
            "phone change",
            "information change",
            "provider update",
            "update provider",
            "modify provider",
            "change provider",
            "provider modification",
            "address update",
            "phone update",
            "demographic change",
            "contact change",
            "location change",
            "practice change",
            "office change",
        ],
    ),
    (
        TransactionType::Add,
        &[
            "new provider",
            "add provider",
            "provider enrollment",
            "provider addition",
            "include provider",
            "onboard provider",
            "welcome provider",
            "provider registration",
            "provider credentialing",
        ],
    ),
];

// Strong, medium and weak indicators, in that order
const ADD_INDICATORS: &[(&str, f64)] = &[
    ("new provider", 2.5),
    ("welcome", 2.0),
    ("enrollment", 2.0),
    ("credentialing", 2.0),
    ("onboard", 1.8),
    ("recruit", 1.8),
    ("joined our network", 2.2),
    ("joining our network", 2.2),
    ("has joined", 2.0),
    ("will be joining", 2.0),
    ("new", 1.0),
    ("add", 1.2),
    ("include", 1.0),
    ("join", 1.2),
    ("register", 1.2),
    ("enroll", 1.5),
    ("joined", 1.4),
    ("joining", 1.4),
    ("please add", 1.8),
    ("first time", 0.8),
    ("initial", 0.5),
    ("begin", 0.5),
];
const UPDATE_INDICATORS: &[(&str, f64)] = &[
    ("effective date", 2.0),
    ("address change", 2.0),
    ("phone change", 2.0),
    ("contact change", 2.0),
    ("location change", 2.0),
    ("move", 1.8),
    ("relocate", 1.8),
    ("transfer", 1.5),
    ("modify", 1.5),
    ("change", 1.2),
    ("update", 1.2),
    ("revise", 1.0),
    ("correct", 1.0),
    ("edit", 1.0),
    ("adjust", 1.0),
    ("alter", 1.0),
    ("different", 0.5),
    ("new address", 0.8),
    ("new phone", 0.8),
    ("updated", 0.7),
    ("current", 0.3),
];
const TERM_INDICATORS: &[(&str, f64)] = &[
    ("termination", 2.5),
    ("terminated", 2.0),
    ("departure", 2.0),
    ("discontinue", 2.0),
    ("withdraw", 1.8),
    ("cease", 1.8),
    ("no longer be associated", 2.2),
    ("will no longer", 2.0),
    ("process the termination", 2.3),
    ("remove", 1.2),
    ("end", 1.0),
    ("stop", 1.2),
    ("cancel", 1.5),
    ("expire", 1.3),
    ("no longer associated", 1.6),
    ("no longer", 1.5),
    ("final", 0.5),
    ("last", 0.3),
];

static SUBJECT_ADD: Lazy<Vec<Regex>> =
    Lazy::new(|| compile_all(&[r"new\s+provider", r"provider\s+enrollment", r"welcome", r"onboard"]));
static SUBJECT_UPDATE: Lazy<Vec<Regex>> =
    Lazy::new(|| compile_all(&[r"address\s+change", r"update", r"change", r"modify", r"move"]));
static SUBJECT_TERM: Lazy<Vec<Regex>> =
    Lazy::new(|| compile_all(&[r"termination", r"terminate", r"end", r"discontinue"]));

const SUBJECT_WINDOW: usize = 50;
const SUBJECT_BOOST: f64 = 1.5;
const CONTEXTUAL_THRESHOLD: f64 = 0.6;

static TERM_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\bterminate\b",
        r"\bterminated\b",
        r"\btermination\b",
        r"\bremove\b",
        r"\bdiscontinue\b",
        r"\bwithdraw\b",
        r"\bcancel\b",
        r"\bexpire\b",
        r"\bcease\b",
        r"\bend\b",
        r"\bstop\b",
        r"no longer",
    ])
});
static UPDATE_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\bupdate\b",
        r"\bmodify\b",
        r"\bchange\b",
        r"\brevise\b",
        r"\bamend\b",
        r"\bcorrect\b",
        r"\bedit\b",
        r"\badjust\b",
        r"\balter\b",
        r"\brefresh\b",
        r"\bmove\b",
        r"\brelocate\b",
    ])
});
static ADD_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\badd\b",
        r"\bnew\b",
        r"\binclude\b",
        r"\benroll\b",
        r"\bregister\b",
        r"\bjoin\b",
        r"\bwelcome\b",
        r"\bonboard\b",
        r"\brecruit\b",
        r"\bhire\b",
    ])
});
const CHANGE_SUBJECTS: &[&str] = &["address", "phone", "contact", "location", "information", "demographic", "details"];
const CHANGE_VERBS: &[&str] = &["change", "modify", "update", "alter", "correct"];

#[derive(Debug)]
struct SynonymPattern {
    pattern: Regex,
    canonical: String,
    short: bool,
}

#[derive(Debug)]
struct LobPattern {
    pattern: Regex,
    bucket: String,
}

/// Fuzzy/contextual candidate generator over a pluggable recognizer
pub struct EntityExtractor {
    gazetteer: Arc<Gazetteer>,
    recognizer: Box<dyn EntityRecognizer>,
    config: EntityConfig,
    title_bonus: f64,
    synonyms: Vec<SynonymPattern>,
    taxonomy: Vec<(Regex, String)>,
    canonical: Vec<(Regex, String)>,
    lob: Vec<LobPattern>,
}

impl std::fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityExtractor")
            .field("recognizer", &self.recognizer.name())
            .field("specialties", &self.gazetteer.specialties().len())
            .field("lob_variants", &self.lob.len())
            .finish()
    }
}

impl EntityExtractor {
    /// Build with the recognizer selected by `config.recognizer`
    pub fn new(gazetteer: Arc<Gazetteer>, config: EntityConfig) -> Self {
        let recognizer = build_recognizer(config.recognizer, &gazetteer);
        Self::with_recognizer(gazetteer, config, recognizer)
    }

    /// Build around an explicit recognizer
    pub fn with_recognizer(gazetteer: Arc<Gazetteer>, config: EntityConfig, recognizer: Box<dyn EntityRecognizer>) -> Self {
        let synonyms = gazetteer
            .synonym_table()
            .into_iter()
            .filter_map(|(synonym, canonical)| {
                word_pattern(&synonym).map(|pattern| SynonymPattern {
                    pattern,
                    canonical: canonical.to_string(),
                    short: synonym.chars().count() <= 2,
                })
            })
            .collect();
        let taxonomy = gazetteer
            .taxonomy_codes()
            .into_iter()
            .filter_map(|(code, canonical)| word_pattern(code).map(|p| (p, canonical.to_string())))
            .collect();
        let canonical = gazetteer
            .specialty_names()
            .into_iter()
            .filter_map(|name| word_pattern(name).map(|p| (p, name.to_string())))
            .collect();
        let lob = gazetteer
            .lob_variants()
            .iter()
            .filter_map(|variant| {
                word_pattern(&variant.phrase).map(|pattern| LobPattern {
                    pattern,
                    bucket: variant.bucket.clone(),
                })
            })
            .collect();
        debug!("Entity extractor using {} recognizer", recognizer.name());
        // Regex fallback names already include their title; their confidence is flat.
        let title_bonus = if recognizer.name() == PATTERN_RECOGNIZER_NAME { 0.0 } else { TITLE_BONUS };

        Self {
            gazetteer,
            recognizer,
            config,
            title_bonus,
            synonyms,
            taxonomy,
            canonical,
            lob,
        }
    }

    /// Name of the active recognizer back-end
    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Provider names, best first.
    ///
    /// PERSON spans that look like a provider name score the recognizer's
    /// confidence, plus a bonus when a provider title sits within
    /// `title_window_tokens` words of the span.
    pub fn extract_provider_names(&self, text: &str) -> Vec<ExtractionCandidate> {
        guarded("provider name extraction", self.provider_names(text))
    }

    /// The single best healthcare organization in the body (or, failing
    /// that, in table-like lines)
    pub fn extract_organizations(&self, text: &str) -> Vec<ExtractionCandidate> {
        guarded("organization extraction", self.organizations(text))
    }

    /// Canonical specialties, one candidate per specialty, layer order
    pub fn extract_specialties(&self, text: &str) -> Vec<ExtractionCandidate> {
        guarded("specialty extraction", self.specialties(text))
    }

    /// Line-of-business buckets, de-duplicated, in gazetteer order
    pub fn extract_line_of_business(&self, text: &str) -> Vec<ExtractionCandidate> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut candidates = Vec::new();
        for lob in &self.lob {
            let Some(m) = lob.pattern.find(text) else { continue };
            if !seen.insert(lob.bucket.as_str()) {
                continue;
            }
            candidates.push(
                ExtractionCandidate::new(lob.bucket.clone(), 0.9, "lob_gazetteer")
                    .at(m.start())
                    .with_context(context_window(text, m.start(), 20))
                    .validated(true),
            );
        }
        candidates
    }

    /// Dates from DATE spans, normalized to `MM/DD/YYYY`
    pub fn extract_dates(&self, text: &str) -> Vec<ExtractionCandidate> {
        guarded("date extraction", self.dates(text))
    }

    /// Transaction type from explicit phrases, then contextual scoring,
    /// then single keywords (Term before Update before Add)
    pub fn extract_transaction_types(&self, text: &str) -> Vec<ExtractionCandidate> {
        let lower = text.to_lowercase();

        for (transaction_type, phrases) in EXPLICIT_TRANSACTION_PHRASES {
            for phrase in phrases.iter() {
                if let Some(pos) = lower.find(phrase) {
                    return vec![ExtractionCandidate::new(
                        transaction_type.as_str(),
                        0.95,
                        format!("transaction_explicit_{}", transaction_type.as_str().to_lowercase()),
                    )
                    .at(pos)
                    .with_context(span_context(text, pos, pos + phrase.len(), 30, 30))
                    .validated(true)];
                }
            }
        }

        if let Some(scored) = contextual_transaction_type(&lower) {
            if scored.confidence > CONTEXTUAL_THRESHOLD {
                return vec![ExtractionCandidate::new(scored.transaction_type.as_str(), scored.confidence, "transaction_contextual")
                    .at(scored.position)
                    .with_context(scored.context)
                    .validated(true)];
            }
        }

        keyword_transaction_type(text, &lower).into_iter().collect()
    }

    fn provider_names(&self, text: &str) -> Result<Vec<ExtractionCandidate>> {
        let persons = self
            .recognizer
            .recognize_kind(text, EntityKind::Person)
            .map_err(ExtractorError::Recognizer)?;
        if persons.is_empty() {
            return Ok(Vec::new());
        }

        let words: Vec<(usize, usize)> = WORD.find_iter(text).map(|m| (m.start(), m.end())).collect();
        let titles: Vec<(usize, usize)> = PROVIDER_TITLE.find_iter(text).map(|m| (m.start(), m.end())).collect();

        let mut candidates: Vec<ExtractionCandidate> = Vec::new();
        for person in persons {
            if !is_likely_provider_name(&person.text) {
                continue;
            }
            let titled = near_title(&words, &titles, &person, self.config.title_window_tokens);
            let (confidence, id) = if titled {
                (person.confidence + self.title_bonus, "title_adjacent_name")
            } else {
                (person.confidence, "entity_person")
            };
            let value = normalize_name(&person.text);
            if let Some(existing) = candidates.iter_mut().find(|c| c.value == value) {
                if confidence > existing.confidence {
                    *existing = name_candidate(text, &person, value, confidence, id);
                }
                continue;
            }
            candidates.push(name_candidate(text, &person, value, confidence, id));
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(candidates)
    }

    fn organizations(&self, text: &str) -> Result<Vec<ExtractionCandidate>> {
        let body = body_content(text);
        let mut candidates = if body.is_empty() {
            Vec::new()
        } else {
            self.organizations_in(&body)?
        };
        if candidates.is_empty() {
            let tables = table_content(text);
            if !tables.is_empty() {
                candidates = self.organizations_in(&tables)?;
            }
        }
        Ok(candidates)
    }

    fn organizations_in(&self, text: &str) -> Result<Vec<ExtractionCandidate>> {
        let orgs = self
            .recognizer
            .recognize_kind(text, EntityKind::Organization)
            .map_err(ExtractorError::Recognizer)?;

        let mut candidates = Vec::new();
        for org in orgs {
            let mut name = org.text.trim().to_string();
            if !is_healthcare_related(&name) || is_health_plan(&name) {
                continue;
            }
            if let Some(expanded) = expand_organization_name(&name, text, org.end) {
                if is_healthcare_related(&expanded) {
                    name = expanded;
                }
            }
            let context = span_context(text, org.start, org.end, 60, 60).replace('\n', " ");
            let confidence = organization_confidence(&name, &context);
            candidates.push(
                ExtractionCandidate::new(normalize_org_name(&name), confidence, "entity_organization")
                    .at(org.start)
                    .with_context(context)
                    .validated(true),
            );
        }

        Ok(best_by_confidence(&longest_distinct_names(candidates))
            .cloned()
            .into_iter()
            .collect())
    }

    fn specialties(&self, text: &str) -> Result<Vec<ExtractionCandidate>> {
        let mut found: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();

        candidates.extend(self.specialties_by_synonym(text, &mut found));
        candidates.extend(self.specialties_by_taxonomy(text, &mut found));
        candidates.extend(self.specialties_by_similarity(text, &mut found));
        candidates.extend(self.specialties_by_recognizer(text, &mut found)?);
        candidates.extend(self.specialties_by_canonical_name(text, &mut found));

        Ok(candidates)
    }

    fn specialties_by_synonym(&self, text: &str, found: &mut HashSet<String>) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for synonym in &self.synonyms {
            if found.contains(&synonym.canonical) {
                continue;
            }
            let Some(m) = synonym.pattern.find(text) else { continue };
            if synonym.short {
                let around = format!(
                    "{}{}",
                    slice(text, m.start().saturating_sub(20), m.start()),
                    slice(text, m.end(), m.end() + 20)
                )
                .to_lowercase();
                if SHORT_SYNONYM_NOISE.iter().any(|w| around.contains(w)) {
                    continue;
                }
            }
            let confidence = if synonym.short { 0.7 } else { 0.95 };
            candidates.push(
                ExtractionCandidate::new(synonym.canonical.clone(), confidence, "synonym_match")
                    .at(m.start())
                    .with_context(span_context(text, m.start(), m.end(), 30, 30))
                    .validated(true),
            );
            found.insert(synonym.canonical.clone());
        }
        candidates
    }

    fn specialties_by_taxonomy(&self, text: &str, found: &mut HashSet<String>) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (pattern, canonical) in &self.taxonomy {
            if found.contains(canonical) {
                continue;
            }
            if let Some(m) = pattern.find(text) {
                candidates.push(
                    ExtractionCandidate::new(canonical.clone(), 0.9, "taxonomy_code_match")
                        .at(m.start())
                        .with_context(span_context(text, m.start(), m.end(), 30, 30))
                        .validated(true),
                );
                found.insert(canonical.clone());
            }
        }
        candidates
    }

    fn specialties_by_similarity(&self, text: &str, found: &mut HashSet<String>) -> Vec<ExtractionCandidate> {
        let mut phrases: Vec<(String, usize)> = SPECIALTY_PHRASE
            .find_iter(text)
            .map(|m| (m.as_str().trim().to_string(), m.start()))
            .filter(|(p, _)| p.chars().count() > 3)
            .collect();
        for pattern in SPECIALTY_LABELS.iter() {
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let phrase = m.as_str().trim().to_string();
                if phrase.chars().count() > 3 && !phrases.iter().any(|(p, _)| *p == phrase) {
                    phrases.push((phrase, m.start()));
                }
            }
        }

        let names = self.gazetteer.specialty_names();
        let mut candidates = Vec::new();
        for (phrase, position) in phrases {
            let hit = best_match(&phrase, &names, ratio, self.config.specialty_ratio_cutoff)
                .or_else(|| best_match(&phrase, &names, partial_ratio, self.config.specialty_partial_cutoff));
            let Some((canonical, score)) = hit else { continue };
            if found.contains(canonical) {
                continue;
            }
            let confidence = if score >= 90.0 {
                0.8
            } else if score >= 85.0 {
                0.7
            } else {
                0.6
            };
            candidates.push(
                ExtractionCandidate::new(canonical, confidence, "fuzzy_match")
                    .at(position)
                    .with_context(span_context(text, position, position + phrase.len(), 30, 30))
                    .validated(true),
            );
            found.insert(canonical.to_string());
        }
        candidates
    }

    fn specialties_by_recognizer(&self, text: &str, found: &mut HashSet<String>) -> Result<Vec<ExtractionCandidate>> {
        let spans = self
            .recognizer
            .recognize_kind(text, EntityKind::Specialty)
            .map_err(ExtractorError::Recognizer)?;
        let mut candidates = Vec::new();
        for span in spans {
            let canonical = self
                .gazetteer
                .canonical_specialty(&span.text)
                .map_or_else(|| span.text.clone(), str::to_string);
            if !found.insert(canonical.clone()) {
                continue;
            }
            candidates.push(
                ExtractionCandidate::new(canonical, span.confidence, "entity_specialty")
                    .at(span.start)
                    .with_context(span_context(text, span.start, span.end, 30, 30))
                    .validated(true),
            );
        }
        Ok(candidates)
    }

    fn specialties_by_canonical_name(&self, text: &str, found: &mut HashSet<String>) -> Vec<ExtractionCandidate> {
        let mut candidates = Vec::new();
        for (pattern, name) in &self.canonical {
            if found.contains(name) {
                continue;
            }
            if let Some(m) = pattern.find(text) {
                candidates.push(
                    ExtractionCandidate::new(name.clone(), 0.8, "canonical_exact_match")
                        .at(m.start())
                        .with_context(span_context(text, m.start(), m.end(), 20, 20))
                        .validated(true),
                );
                found.insert(name.clone());
            }
        }
        candidates
    }

    fn dates(&self, text: &str) -> Result<Vec<ExtractionCandidate>> {
        let spans = self
            .recognizer
            .recognize_kind(text, EntityKind::Date)
            .map_err(ExtractorError::Recognizer)?;
        let id = format!("{}_date", self.recognizer.name());

        let mut candidates = Vec::new();
        for span in spans {
            let Some(date) = normalize_any_date(&span.text) else {
                debug!("Unparseable date span: {}", span.text);
                continue;
            };
            let context = span_context(text, span.start, span.end, 40, 40).replace('\n', " ");
            let lower = context.to_lowercase();
            let confidence = if DATE_CONTEXT_WORDS.iter().any(|w| lower.contains(w)) {
                span.confidence + DATE_CONTEXT_BONUS
            } else {
                span.confidence
            };
            candidates.push(
                ExtractionCandidate::new(date, confidence, id.clone())
                    .at(span.start)
                    .with_context(context)
                    .validated(true),
            );
        }
        Ok(candidates)
    }
}

/// Strip a leading `Dr.`/`Doctor` title from a name
pub fn strip_provider_title(name: &str) -> String {
    LEADING_TITLE.replace(name.trim(), "").trim().to_string()
}

/// Collapse whitespace and tidy a trailing `, MD`/`, DO` credential
pub fn normalize_name(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    CREDENTIAL_SUFFIX.replace(&collapsed, ", $1").trim().to_string()
}

/// At least two words of two or more characters, not a sign-off phrase
pub fn is_likely_provider_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    if NAME_SKIP.iter().any(|s| lower.contains(s)) {
        return false;
    }
    let parts: Vec<&str> = name.split_whitespace().collect();
    parts.len() >= 2 && parts.iter().all(|p| p.chars().count() > 1)
}

/// Organization names with small words lower-cased and the rest title-cased
pub fn normalize_org_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if ORG_SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                title_case(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the longest of every group of names where one contains another,
/// in descending length order
pub fn longest_distinct_names(mut candidates: Vec<ExtractionCandidate>) -> Vec<ExtractionCandidate> {
    candidates.sort_by(|a, b| b.value.len().cmp(&a.value.len()));
    let mut kept: Vec<ExtractionCandidate> = Vec::new();
    for candidate in candidates {
        let lower = candidate.value.to_lowercase();
        let redundant = kept.iter().any(|k| {
            let kept_lower = k.value.to_lowercase();
            kept_lower.contains(&lower) || lower.contains(&kept_lower)
        });
        if !redundant {
            kept.push(candidate);
        }
    }
    kept
}

fn guarded(operation: &str, result: Result<Vec<ExtractionCandidate>>) -> Vec<ExtractionCandidate> {
    result.unwrap_or_else(|e| {
        warn!("{} failed: {}", operation, e);
        Vec::new()
    })
}

fn word_pattern(phrase: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase))).ok()
}

fn name_candidate(text: &str, person: &RecognizedEntity, value: String, confidence: f64, id: &str) -> ExtractionCandidate {
    ExtractionCandidate::new(value, confidence, id)
        .at(person.start)
        .with_context(span_context(text, person.start, person.end, 40, 40).replace('\n', " "))
        .validated(true)
}

fn near_title(words: &[(usize, usize)], titles: &[(usize, usize)], span: &RecognizedEntity, window: usize) -> bool {
    let Some(first) = words.iter().position(|&(_, end)| end > span.start) else {
        return false;
    };
    let last = words.iter().rposition(|&(start, _)| start < span.end).unwrap_or(first);
    let lo = words[first.saturating_sub(window)].0;
    let hi = words[(last + window).min(words.len() - 1)].1;
    titles
        .iter()
        .any(|&(s, e)| s >= lo && e <= hi && (e <= span.start || s >= span.end))
}

/// Lines between the salutation/header block and the closing
fn body_content(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let body_start = lines
        .iter()
        .position(|line| {
            let lower = line.trim().to_lowercase();
            !lower.is_empty()
                && !SALUTATION.iter().any(|p| p.is_match(&lower))
                && !HEADER_LINE.is_match(&lower)
                && !LABEL_ONLY_LINE.is_match(&lower)
        })
        .unwrap_or(0);

    let body_end = (body_start + 1..lines.len())
        .rev()
        .find(|&i| {
            let lower = lines[i].trim().to_lowercase();
            !lower.is_empty() && CLOSING.iter().any(|p| p.is_match(&lower))
        })
        .unwrap_or(lines.len());

    lines[body_start..body_end].join("\n").trim_matches('\n').trim().to_string()
}

/// Lines that look like flattened table rows
fn table_content(text: &str) -> String {
    text.split('\n')
        .filter(|line| line.matches('|').count() >= 2 || SPACED_PIPE.is_match(line) || LABELED_PIPE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_healthcare_related(name: &str) -> bool {
    if name.chars().count() < 3 {
        return false;
    }
    let lower = name.to_lowercase();
    if NON_HEALTHCARE_TERMS.iter().any(|t| lower.contains(t)) {
        return false;
    }
    HEALTHCARE_TERMS.iter().any(|t| lower.contains(t)) || name.chars().count() >= 8 || ALL_CAPS_ORG.is_match(name)
}

fn is_health_plan(name: &str) -> bool {
    let lower = name.to_lowercase();
    if PROVIDER_ORG_TERMS.iter().any(|t| lower.contains(t)) {
        return false;
    }
    HEALTH_PLAN_TERMS.iter().any(|t| lower.contains(t))
}

/// `Name` followed by `& ABC` becomes `Name & ABC`
fn expand_organization_name(name: &str, text: &str, end: usize) -> Option<String> {
    let following = slice(text, end, end + 20);
    let caps = AMPERSAND_TAIL.captures(following)?;
    let tail = caps.get(1)?.as_str().trim();
    let tail_lower = tail.to_lowercase();
    (tail.len() <= 10 && !["the", "and", "or"].iter().any(|w| tail_lower.contains(w)))
        .then(|| format!("{} & {}", name, tail))
}

fn organization_confidence(name: &str, context: &str) -> f64 {
    let name = name.to_lowercase();
    let context = context.to_lowercase();
    let mut confidence = 0.7;
    if ["medical", "clinic", "hospital", "practice"].iter().any(|t| name.contains(t)) {
        confidence += 0.1;
    }
    if ["terminated with", "affiliated with", "practices at"].iter().any(|t| context.contains(t)) {
        confidence += 0.15;
    }
    if ["group", "associates", "partners"].iter().any(|t| name.contains(t)) {
        confidence += 0.05;
    }
    f64::min(confidence, 0.95)
}

struct ScoredType {
    transaction_type: TransactionType,
    confidence: f64,
    position: usize,
    context: String,
}

/// Weighted indicator scoring over lowercase text
fn contextual_transaction_type(lower: &str) -> Option<ScoredType> {
    let table: [(TransactionType, &[(&str, f64)], &Vec<Regex>); 3] = [
        (TransactionType::Add, ADD_INDICATORS, &*SUBJECT_ADD),
        (TransactionType::Update, UPDATE_INDICATORS, &*SUBJECT_UPDATE),
        (TransactionType::Term, TERM_INDICATORS, &*SUBJECT_TERM),
    ];
    let subject = slice(lower, 0, SUBJECT_WINDOW);

    let mut scores = [0.0_f64; 3];
    for (i, (_, indicators, subject_patterns)) in table.iter().enumerate() {
        scores[i] += indicators
            .iter()
            .filter(|(phrase, _)| lower.contains(phrase))
            .map(|(_, weight)| weight)
            .sum::<f64>();
        scores[i] += subject_patterns.iter().filter(|p| p.is_match(subject)).count() as f64 * SUBJECT_BOOST;
    }

    let (add, update) = (0, 1);
    if scores[add] > 0.0 && scores[update] > 0.0 {
        if ["existing provider", "current provider", "already enrolled"].iter().any(|w| lower.contains(w)) {
            scores[update] += 1.0;
            scores[add] -= 0.5;
        } else if ["first time", "never been", "not currently"].iter().any(|w| lower.contains(w)) {
            scores[add] += 1.0;
            scores[update] -= 0.5;
        }
    }

    let mut best = 0;
    for i in 1..scores.len() {
        if scores[i] > scores[best] {
            best = i;
        }
    }
    if scores[best] <= 0.0 {
        return None;
    }

    let (transaction_type, indicators, _) = table[best];
    let (position, context) = indicators
        .iter()
        .find_map(|(phrase, _)| {
            lower
                .find(phrase)
                .map(|pos| (pos, span_context(lower, pos, pos + phrase.len(), 30, 30)))
        })
        .unwrap_or_else(|| (0, subject.to_string()));

    Some(ScoredType {
        transaction_type,
        confidence: f64::min(scores[best] / 3.0, 0.9),
        position,
        context,
    })
}

/// Single-keyword fallback: Term, then Update, then Add
fn keyword_transaction_type(text: &str, lower: &str) -> Option<ExtractionCandidate> {
    let candidate = |transaction_type: TransactionType, confidence: f64, start: usize, end: usize| {
        ExtractionCandidate::new(
            transaction_type.as_str(),
            confidence,
            format!("transaction_keyword_{}", transaction_type.as_str().to_lowercase()),
        )
        .at(start)
        .with_context(span_context(text, start, end, 30, 30))
        .validated(true)
    };

    if let Some(m) = TERM_KEYWORDS.iter().find_map(|p| p.find(lower)) {
        return Some(candidate(TransactionType::Term, 0.9, m.start(), m.end()));
    }

    if let Some(m) = UPDATE_KEYWORDS.iter().find_map(|p| p.find(lower)) {
        let around = span_context(lower, m.start(), m.end(), 50, 50);
        let confidence = if CHANGE_SUBJECTS.iter().any(|w| around.contains(w)) {
            0.85
        } else {
            0.7
        };
        return Some(candidate(TransactionType::Update, confidence, m.start(), m.end()));
    }

    for pattern in ADD_KEYWORDS.iter() {
        let Some(m) = pattern.find(lower) else { continue };
        let around = span_context(lower, m.start(), m.end(), 50, 50);
        if CHANGE_VERBS.iter().any(|w| around.contains(w)) {
            continue;
        }
        return Some(candidate(TransactionType::Add, 0.8, m.start(), m.end()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecognizerKind;
    use roster_domain::RecognizedEntity;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(Arc::new(Gazetteer::builtin()), EntityConfig::default())
    }

    fn pattern_extractor() -> EntityExtractor {
        let config = EntityConfig {
            recognizer: RecognizerKind::Pattern,
            ..EntityConfig::default()
        };
        EntityExtractor::new(Arc::new(Gazetteer::builtin()), config)
    }

    struct Failing;

    impl EntityRecognizer for Failing {
        fn recognize(&self, _text: &str) -> std::result::Result<Vec<RecognizedEntity>, String> {
            Err("model not loaded".to_string())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn values(candidates: &[ExtractionCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.value.as_str()).collect()
    }

    #[test]
    fn test_title_adjacent_name_ranks_first() {
        let text = "Jane Doe from credentialing asked us to terminate Dr. John Smith, NPI 1234567893.";
        let names = extractor().extract_provider_names(text);
        assert_eq!(names[0].value, "John Smith");
        assert!((names[0].confidence - 0.9).abs() < 1e-9);
        assert_eq!(names[0].extractor_id, "title_adjacent_name");
        assert!(names.iter().any(|c| c.value == "Jane Doe" && (c.confidence - 0.7).abs() < 1e-9));
    }

    #[test]
    fn test_single_word_names_rejected() {
        assert!(!is_likely_provider_name("Smith"));
        assert!(!is_likely_provider_name("Best Regards"));
        assert!(is_likely_provider_name("Jane A. Doe"));
    }

    #[test]
    fn test_name_helpers() {
        assert_eq!(strip_provider_title("Dr. John  Smith"), "John  Smith");
        assert_eq!(strip_provider_title("Doctor Ann Lee"), "Ann Lee");
        assert_eq!(normalize_name("John   Smith,MD"), "John Smith, MD");
    }

    #[test]
    fn test_pattern_recognizer_names() {
        let names = pattern_extractor().extract_provider_names("Please add Robert Chen, MD to the roster.");
        assert_eq!(values(&names), vec!["Robert Chen"]);
        assert!((names[0].confidence - 0.6).abs() < 1e-9);

        let titled = pattern_extractor().extract_provider_names("Please add Dr. Maria Lopez today.");
        assert_eq!(values(&titled), vec!["Maria Lopez"]);
        assert!((titled[0].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_recognizer_failure_yields_nothing() {
        let extractor = EntityExtractor::with_recognizer(
            Arc::new(Gazetteer::builtin()),
            EntityConfig::default(),
            Box::new(Failing),
        );
        assert!(extractor.extract_provider_names("Dr. John Smith").is_empty());
        assert!(extractor.extract_dates("September 22, 2025").is_empty());
        assert!(extractor.extract_organizations("Sunrise Medical Group").is_empty());
        assert_eq!(
            values(&extractor.extract_line_of_business("Medicare members")),
            vec!["Medicare"]
        );
    }

    #[test]
    fn test_organization_from_body() {
        let text = "Dear Team,\nDr. Ann Lee is affiliated with Sunrise Valley Medical Group.\nBest regards,\nValley Health Plan";
        let orgs = extractor().extract_organizations(text);
        assert_eq!(values(&orgs), vec!["Sunrise Valley Medical Group"]);
        // 0.7 base, +0.1 medical, +0.15 affiliated with, +0.05 group, capped
        assert!((orgs[0].confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_organization_helpers() {
        assert!(is_health_plan("Blue Shield HMO"));
        assert!(!is_health_plan("Medicare Medical Group"));
        assert!(!is_healthcare_related("Outlook Clinic"));
        assert_eq!(normalize_org_name("SUNRISE medical CENTER of the valley"), "Sunrise Medical Center of the Valley");
        assert_eq!(
            expand_organization_name("Smith Clinic", "Smith Clinic & RCSSD today", 12).as_deref(),
            Some("Smith Clinic & RCSSD")
        );
    }

    #[test]
    fn test_longest_distinct_names() {
        let reduced = longest_distinct_names(vec![
            ExtractionCandidate::new("Sunrise Medical", 0.9, "a"),
            ExtractionCandidate::new("Sunrise Medical Group", 0.8, "b"),
            ExtractionCandidate::new("Valley Clinic", 0.7, "c"),
        ]);
        assert_eq!(values(&reduced), vec!["Sunrise Medical Group", "Valley Clinic"]);
    }

    #[test]
    fn test_specialty_layers() {
        let specialties = extractor().extract_specialties("Specialty: Cardiolgy. Also board certified in dermatology.");
        assert_eq!(values(&specialties), vec!["Dermatology", "Cardiology"]);
        assert_eq!(specialties[0].extractor_id, "synonym_match");
        assert_eq!(specialties[1].extractor_id, "fuzzy_match");
        assert!((specialties[1].confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_short_synonym_noise_filter() {
        let specialties = extractor().extract_specialties("Provider number GI 44");
        assert!(specialties.iter().all(|c| c.value != "Gastroenterology"));
        let specialties = extractor().extract_specialties("Moving to GI clinic");
        assert_eq!(specialties[0].value, "Gastroenterology");
        assert!((specialties[0].confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_line_of_business_buckets() {
        let lobs = extractor().extract_line_of_business("Covers Medicare, HMO and PPO plans, plus Medi-Cal");
        assert_eq!(values(&lobs), vec!["Medicare", "Commercial", "Medicaid"]);
    }

    #[test]
    fn test_dates_with_context_bonus() {
        let dates = extractor().extract_dates("Effective September 22, 2025 please. Received 01/02/2025.");
        assert_eq!(values(&dates), vec!["09/22/2025", "01/02/2025"]);
        assert!((dates[0].confidence - 0.9).abs() < 1e-9);
        assert!((dates[1].confidence - 0.8).abs() < 1e-9);
        assert_eq!(dates[0].extractor_id, "heuristic_date");
    }

    #[test]
    fn test_transaction_explicit_phrase() {
        let types = extractor().extract_transaction_types("Subject: Provider Termination notice");
        assert_eq!(types[0].value, "Term");
        assert_eq!(types[0].extractor_id, "transaction_explicit_term");
    }

    #[test]
    fn test_transaction_contextual() {
        let types = extractor().extract_transaction_types("Welcome aboard! Dr. Ann Lee has joined our network.");
        assert_eq!(types[0].value, "Add");
        assert_eq!(types[0].extractor_id, "transaction_contextual");
        assert!((types[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_transaction_keyword_fallback() {
        let text = "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025. Reason: retirement.";
        let types = extractor().extract_transaction_types(text);
        assert_eq!(types[0].value, "Term");
        assert_eq!(types[0].extractor_id, "transaction_keyword_term");
        assert!((types[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_transaction_none() {
        assert!(extractor().extract_transaction_types("Hello there").is_empty());
    }
}
