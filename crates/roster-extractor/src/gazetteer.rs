//! Domain gazetteers: specialties, line-of-business variants, organization types
//!
//! Loaded once per process from YAML and shared read-only behind an `Arc`.
//! Every table has a built-in fallback so a missing or malformed file only
//! costs vocabulary, never availability.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ExtractorError, Result};

/// File holding `specialties: { Name: { synonyms: [...] } }`
pub const SPECIALTIES_FILE: &str = "specialties.yml";
/// File holding `Bucket: { synonyms: [...] }`
pub const LOB_FILE: &str = "lob_map.yml";
/// File holding `organization_types: { key: { synonyms: [...] } }`
pub const ORGANIZATION_TYPES_FILE: &str = "organization_types.yml";

static TAXONOMY_SYNONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{3,4}[a-z]*[0-9]{4,}x$").unwrap());

const BUILTIN_SPECIALTIES: &[(&str, &[&str])] = &[
    ("Internal Medicine", &["internal medicine", "internal med", "im", "internist"]),
    ("Family Medicine", &["family medicine", "family practice", "fp", "primary care"]),
    ("Emergency Medicine", &["emergency medicine", "emergency", "er", "em"]),
    (
        "Pediatric Emergency Medicine",
        &["pediatric emergency medicine", "pediatric emergency", "peds emergency"],
    ),
    ("Cardiology", &["cardiology", "cardiac", "heart", "cardiovascular"]),
    ("Dermatology", &["dermatology", "derm", "skin"]),
    ("Neurology", &["neurology", "neuro", "neurologist"]),
    ("General Surgery", &["general surgery", "surgery", "surgeon"]),
    ("Orthopedic Surgery", &["orthopedic surgery", "orthopedics", "ortho"]),
    ("Anesthesiology", &["anesthesiology", "anesthesia"]),
    ("Radiology", &["radiology", "radiologist", "diagnostic radiology"]),
    ("Pathology", &["pathology", "pathologist"]),
    ("Psychiatry", &["psychiatry", "psychiatric", "mental health"]),
    ("Obstetrics", &["obstetrics", "ob", "obgyn", "ob/gyn"]),
    ("Oncology", &["oncology", "oncologist", "cancer"]),
    ("Ophthalmology", &["ophthalmology", "eye", "vision"]),
    ("Urology", &["urology", "urologist"]),
    ("Gastroenterology", &["gastroenterology", "gi", "gastro"]),
    ("Endocrinology", &["endocrinology", "endo", "diabetes"]),
    ("Nephrology", &["nephrology", "kidney", "renal"]),
    ("Allergy", &["allergy", "allergist"]),
    ("Immunology", &["immunology", "immunologist"]),
];

const BUILTIN_LOB_VARIANTS: &[&str] = &[
    "Medicare", "Medicaid", "Commercial", "HMO", "PPO", "EPO", "POS", "Exchange", "Medi-Cal",
    "Part A", "Part B", "Part C", "Part D", "Advantage", "Supplement",
];

const BUILTIN_ORGANIZATION_TYPES: &[&str] = &[
    "Medical Group",
    "Healthcare",
    "Clinic",
    "Practice",
    "Associates",
    "Physicians",
    "Hospital",
    "Health System",
    "Medical Center",
];

/// One canonical specialty and its synonym phrases (lowercase)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialty {
    /// Canonical display name
    pub name: String,
    /// Lowercase synonyms, taxonomy codes included
    pub synonyms: Vec<String>,
}

/// A line-of-business phrase and the bucket it reports as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobVariant {
    /// Phrase searched for in text
    pub phrase: String,
    /// Reported value (Medicare, Medicaid, Commercial, or the phrase title-cased)
    pub bucket: String,
}

/// The loaded vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gazetteer {
    specialties: Vec<Specialty>,
    lob_variants: Vec<LobVariant>,
    organization_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SynonymList {
    #[serde(default)]
    synonyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SpecialtiesFile {
    specialties: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
struct OrganizationTypesFile {
    organization_types: serde_yaml::Mapping,
}

impl Gazetteer {
    /// Built-in tables only
    pub fn builtin() -> Self {
        Self {
            specialties: builtin_specialties(),
            lob_variants: builtin_lob_variants(),
            organization_types: BUILTIN_ORGANIZATION_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load tables from `dir`, falling back per table on any failure
    pub fn load(dir: &Path) -> Self {
        let specialties = match load_specialties(&dir.join(SPECIALTIES_FILE)) {
            Ok(s) => s,
            Err(e) => {
                warn!("Using built-in specialties: {}", e);
                builtin_specialties()
            }
        };
        let lob_variants = match load_lob_variants(&dir.join(LOB_FILE)) {
            Ok(l) => l,
            Err(e) => {
                warn!("Using built-in LOB variants: {}", e);
                builtin_lob_variants()
            }
        };
        let organization_types = match load_organization_types(&dir.join(ORGANIZATION_TYPES_FILE)) {
            Ok(o) => o,
            Err(e) => {
                warn!("Using built-in organization types: {}", e);
                BUILTIN_ORGANIZATION_TYPES.iter().map(|s| s.to_string()).collect()
            }
        };
        debug!(
            "Gazetteer loaded: {} specialties, {} LOB variants, {} organization types",
            specialties.len(),
            lob_variants.len(),
            organization_types.len()
        );
        Self {
            specialties,
            lob_variants,
            organization_types,
        }
    }

    /// Load from an optional directory
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(d) => Self::load(d),
            None => Self::builtin(),
        }
    }

    /// Assemble from explicit tables
    pub fn from_parts(
        specialties: Vec<Specialty>,
        lob_variants: Vec<LobVariant>,
        organization_types: Vec<String>,
    ) -> Self {
        Self {
            specialties,
            lob_variants,
            organization_types,
        }
    }

    /// Specialties in table order
    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    /// Canonical specialty names in table order
    pub fn specialty_names(&self) -> Vec<&str> {
        self.specialties.iter().map(|s| s.name.as_str()).collect()
    }

    /// `(synonym, canonical)` pairs in table order, canonical name first,
    /// taxonomy codes excluded
    pub fn synonym_table(&self) -> Vec<(String, &str)> {
        let mut table = Vec::new();
        for specialty in &self.specialties {
            table.push((specialty.name.to_lowercase(), specialty.name.as_str()));
            for synonym in &specialty.synonyms {
                if !is_taxonomy_code(synonym) && !table.iter().any(|(s, _)| s == synonym) {
                    table.push((synonym.clone(), specialty.name.as_str()));
                }
            }
        }
        table
    }

    /// `(taxonomy code, canonical)` pairs
    pub fn taxonomy_codes(&self) -> Vec<(&str, &str)> {
        self.specialties
            .iter()
            .flat_map(|s| {
                s.synonyms
                    .iter()
                    .filter(|syn| is_taxonomy_code(syn))
                    .map(move |syn| (syn.as_str(), s.name.as_str()))
            })
            .collect()
    }

    /// Canonical specialty for an exact (case-insensitive) synonym
    pub fn canonical_specialty(&self, phrase: &str) -> Option<&str> {
        let lower = phrase.trim().to_lowercase();
        self.specialties
            .iter()
            .find(|s| s.name.to_lowercase() == lower || s.synonyms.iter().any(|syn| *syn == lower))
            .map(|s| s.name.as_str())
    }

    /// LOB phrases in table order
    pub fn lob_variants(&self) -> &[LobVariant] {
        &self.lob_variants
    }

    /// Organization-type words, display case
    pub fn organization_types(&self) -> &[String] {
        &self.organization_types
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Whether a lowercase synonym is a provider taxonomy code
pub fn is_taxonomy_code(s: &str) -> bool {
    TAXONOMY_SYNONYM.is_match(s)
}

/// Reporting bucket for a LOB phrase
pub fn lob_bucket(phrase: &str) -> String {
    let lower = phrase.to_lowercase();
    if ["medicare", "part a", "part b", "part c", "part d"].iter().any(|k| lower.contains(k)) {
        "Medicare".to_string()
    } else if ["medicaid", "medi-cal"].iter().any(|k| lower.contains(k)) {
        "Medicaid".to_string()
    } else if ["commercial", "hmo", "ppo", "epo", "pos", "exchange"].iter().any(|k| lower.contains(k)) {
        "Commercial".to_string()
    } else {
        crate::rules::title_case(phrase)
    }
}

fn builtin_specialties() -> Vec<Specialty> {
    BUILTIN_SPECIALTIES
        .iter()
        .map(|(name, synonyms)| Specialty {
            name: name.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

fn builtin_lob_variants() -> Vec<LobVariant> {
    BUILTIN_LOB_VARIANTS
        .iter()
        .map(|v| LobVariant {
            phrase: v.to_string(),
            bucket: lob_bucket(v),
        })
        .collect()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ExtractorError::Gazetteer(format!("{}: {}", path.display(), e)))
}

fn synonym_entries(mapping: serde_yaml::Mapping) -> Result<Vec<(String, Vec<String>)>> {
    let mut entries = Vec::new();
    for (key, value) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| ExtractorError::Gazetteer("non-string key".to_string()))?
            .to_string();
        let list: SynonymList = serde_yaml::from_value(value)?;
        entries.push((key, list.synonyms.iter().map(|s| s.to_lowercase()).collect()));
    }
    Ok(entries)
}

fn load_specialties(path: &Path) -> Result<Vec<Specialty>> {
    let file: SpecialtiesFile = serde_yaml::from_str(&read(path)?)?;
    let specialties: Vec<Specialty> = synonym_entries(file.specialties)?
        .into_iter()
        .map(|(name, synonyms)| Specialty { name, synonyms })
        .collect();
    if specialties.is_empty() {
        return Err(ExtractorError::Gazetteer(format!("{}: no specialties", path.display())));
    }
    Ok(specialties)
}

fn load_lob_variants(path: &Path) -> Result<Vec<LobVariant>> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(&read(path)?)?;
    let mut variants = Vec::new();
    for (key, synonyms) in synonym_entries(mapping)? {
        let bucket = lob_bucket(&key);
        variants.push(LobVariant {
            phrase: key.clone(),
            bucket: bucket.clone(),
        });
        for phrase in synonyms {
            if !variants.iter().any(|v: &LobVariant| v.phrase.eq_ignore_ascii_case(&phrase)) {
                variants.push(LobVariant {
                    phrase,
                    bucket: bucket.clone(),
                });
            }
        }
    }
    if variants.is_empty() {
        return Err(ExtractorError::Gazetteer(format!("{}: no LOB entries", path.display())));
    }
    Ok(variants)
}

fn load_organization_types(path: &Path) -> Result<Vec<String>> {
    let file: OrganizationTypesFile = serde_yaml::from_str(&read(path)?)?;
    let mut types: Vec<String> = Vec::new();
    for (_, synonyms) in synonym_entries(file.organization_types)? {
        for s in synonyms {
            let display = crate::rules::title_case(&s);
            if !types.contains(&display) {
                types.push(display);
            }
        }
    }
    Ok(types)
}
