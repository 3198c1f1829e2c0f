//! Roster Extractor
//!
//! Turns free-form provider-roster emails into one 17-field record per
//! provider mentioned.
//!
//! # Overview
//!
//! Roster change requests arrive as loosely written emails: a sentence asking
//! to terminate a doctor, a pasted table of new providers, a `Provider:` list
//! with an email-wide TIN at the top. The extractor splits each email into
//! provider blocks and fuses candidates from several independent extractors
//! into one record per block, choosing between them with a fixed per-field
//! source priority.
//!
//! # Architecture
//!
//! ```text
//! ParsedContent → BlockSectioner → blocks ─┐
//!               → TableExtractor → table candidates ──┤
//!               → PatternExtractor (regex)            ├→ ExtractionEngine → Records
//!               → EntityExtractor (recognizer)        │
//!               → attribute / term reason heuristics ─┘
//! ```
//!
//! # Key Features
//!
//! - **Block sectioning**: hard-cue, table-row and soft-cue detectors with
//!   scope assignment from the nearest preceding add/term/update marker
//! - **Pattern extraction**: Luhn-checked NPIs, TINs, PPG codes, phone and fax
//!   numbers, state licenses and dates
//! - **Table extraction**: HTML, delimited text and vertical `Label: value`
//!   tables with fuzzy header mapping
//! - **Entity extraction**: provider names, organizations, specialties, lines of
//!   business, dates and transaction types over a pluggable recognizer
//! - **Fusion**: fixed source-priority chains per field, business rules and
//!   field normalization, record validation
//!
//! # Example Usage
//!
//! ```
//! use roster_extractor::{ExtractionEngine, ExtractorConfig};
//! use roster_domain::{OutputField, ParsedContent};
//!
//! let engine = ExtractionEngine::new(ExtractorConfig::default());
//! let content = ParsedContent::from_text(
//!     "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025. Reason: retirement.",
//! );
//!
//! let records = engine.extract_all_fields(&content);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].get(OutputField::TransactionType), "Term");
//! assert_eq!(records[0].get(OutputField::TermDate), "09/22/2025");
//! ```

#![warn(missing_docs)]

mod attribute;
mod config;
mod engine;
mod entities;
mod error;
mod gazetteer;
mod rules;
mod sectioner;
mod tables;
mod term_reason;
mod text;
mod types;

pub mod dates;
pub mod html;
pub mod patterns;
pub mod recognizer;
pub mod similarity;
pub mod validation;
pub mod validators;


pub use attribute::{explicit_attribute, resolve_attribute};
pub use config::{EntityConfig, ExtractorConfig, RecognizerKind, SectionerConfig, TableConfig};
pub use engine::ExtractionEngine;
pub use entities::{
    is_likely_provider_name, normalize_name, normalize_org_name, strip_provider_title,
    EntityExtractor,
};
pub use error::{ExtractorError, Result};
pub use gazetteer::{Gazetteer, LobVariant, Specialty};
pub use patterns::PatternExtractor;
pub use rules::{apply_business_rules, finalize, normalize_fields};
pub use sectioner::{extract_shared_fields, BlockSectioner};
pub use tables::{filter_for_block, TableCandidates, TableExtractor};
pub use term_reason::extract_term_reason;
pub use types::{BlockSummary, ExtractionReport, IssueSummary, RecordRow};
pub use validation::{RecordValidator, ValidationIssue, ValidationReport};
