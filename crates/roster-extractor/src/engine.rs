//! Per-block field fusion
//!
//! The engine sections an email into provider blocks, then resolves every
//! output field of every block through a fixed chain of sources. The first
//! source in a chain that yields a value wins; later sources are not
//! consulted.

use roster_domain::{
    best_by_confidence, EntityRecognizer, ExtractionCandidate, OutputField, ParsedContent,
    ProviderBlock, Record, TableField, TransactionType,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::attribute::resolve_attribute;
use crate::config::ExtractorConfig;
use crate::dates::normalize_any_date;
use crate::entities::{strip_provider_title, EntityExtractor};
use crate::gazetteer::Gazetteer;
use crate::patterns::PatternExtractor;
use crate::rules::finalize;
use crate::sectioner::BlockSectioner;
use crate::tables::{filter_for_block, merge_candidates, TableCandidates, TableExtractor};
use crate::term_reason::extract_term_reason;

/// Confidence of the whole-text block used when sectioning finds nothing
const FALLBACK_BLOCK_CONFIDENCE: f64 = 0.5;

/// Which text a chain step reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Block,
    Email,
}

/// Pattern-extractor families used by the chains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Npi,
    Tin,
    Ppg,
    Phone,
    Fax,
    License,
}

/// Entity-extractor families used by the chains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    ProviderName,
    Organization,
    Specialty,
    LineOfBusiness,
}

/// One step of a field chain
#[derive(Debug, Clone, Copy)]
enum Step {
    /// nth block-filtered table candidate
    Table(TableField, usize),
    /// nth pattern candidate
    Pattern(Pattern, Scope, usize),
    /// Top entity candidate (every distinct hit for line of business)
    Entity(Entity, Scope),
}

use Scope::{Block, Email};

/// Source-priority chains for the directly extracted fields
const CHAINS: &[(OutputField, &[Step])] = &[
    (
        OutputField::ProviderName,
        &[
            Step::Table(TableField::ProviderName, 0),
            Step::Entity(Entity::ProviderName, Block),
            Step::Entity(Entity::ProviderName, Email),
        ],
    ),
    (
        OutputField::ProviderNpi,
        &[
            Step::Table(TableField::Npi, 0),
            Step::Pattern(Pattern::Npi, Email, 0),
            Step::Pattern(Pattern::Npi, Block, 0),
        ],
    ),
    (
        OutputField::GroupNpi,
        &[
            Step::Table(TableField::Npi, 1),
            Step::Pattern(Pattern::Npi, Email, 1),
            Step::Pattern(Pattern::Npi, Block, 1),
        ],
    ),
    (
        OutputField::Tin,
        &[
            Step::Pattern(Pattern::Tin, Email, 0),
            Step::Table(TableField::Tin, 0),
            Step::Pattern(Pattern::Tin, Block, 0),
        ],
    ),
    (
        OutputField::ProviderSpecialty,
        &[
            Step::Table(TableField::Specialty, 0),
            Step::Entity(Entity::Specialty, Block),
            Step::Entity(Entity::Specialty, Email),
        ],
    ),
    (
        OutputField::OrganizationName,
        &[
            Step::Entity(Entity::Organization, Email),
            Step::Entity(Entity::Organization, Block),
            Step::Table(TableField::Organization, 0),
        ],
    ),
    (
        OutputField::PpgId,
        &[
            Step::Pattern(Pattern::Ppg, Email, 0),
            Step::Table(TableField::Ppg, 0),
            Step::Pattern(Pattern::Ppg, Block, 0),
        ],
    ),
    (
        OutputField::PhoneNumber,
        &[Step::Pattern(Pattern::Phone, Block, 0), Step::Pattern(Pattern::Phone, Email, 0)],
    ),
    (
        OutputField::FaxNumber,
        &[
            Step::Table(TableField::Fax, 0),
            Step::Pattern(Pattern::Fax, Block, 0),
            Step::Pattern(Pattern::Fax, Email, 0),
        ],
    ),
    (
        OutputField::StateLicense,
        &[
            Step::Pattern(Pattern::License, Block, 0),
            Step::Pattern(Pattern::License, Email, 0),
            Step::Table(TableField::License, 0),
        ],
    ),
    (
        OutputField::LineOfBusiness,
        &[
            Step::Entity(Entity::LineOfBusiness, Email),
            Step::Entity(Entity::LineOfBusiness, Block),
        ],
    ),
    (OutputField::CompleteAddress, &[Step::Table(TableField::Address, 0)]),
];

/// Email-scope values resolved once and shared by every block
struct EmailContext<'a> {
    text: &'a str,
    transaction_type: Option<TransactionType>,
    transaction_label: Option<String>,
    attribute: String,
    tables: TableCandidates,
}

/// What one block's chains read
struct BlockContext<'a> {
    email: &'a EmailContext<'a>,
    text: &'a str,
    tables: TableCandidates,
}

impl BlockContext<'_> {
    fn text(&self, scope: Scope) -> &str {
        match scope {
            Block => self.text,
            Email => self.email.text,
        }
    }

    fn table(&self, field: TableField, nth: usize) -> Option<&str> {
        self.tables.get(&field)?.get(nth).map(|c| c.value.as_str())
    }
}

/// Fusion engine: sectioner, extractors and chains over one shared gazetteer
#[derive(Debug)]
pub struct ExtractionEngine {
    config: ExtractorConfig,
    gazetteer: Arc<Gazetteer>,
    sectioner: BlockSectioner,
    patterns: PatternExtractor,
    entities: EntityExtractor,
    tables: TableExtractor,
}

impl ExtractionEngine {
    /// Create an engine, loading the gazetteer from `config.gazetteer_dir`
    /// (or the built-in tables)
    pub fn new(config: ExtractorConfig) -> Self {
        let gazetteer = Arc::new(Gazetteer::from_dir(config.gazetteer_dir.as_deref()));
        Self::with_gazetteer(config, gazetteer)
    }

    /// Create an engine over an already loaded gazetteer
    pub fn with_gazetteer(config: ExtractorConfig, gazetteer: Arc<Gazetteer>) -> Self {
        let entities = EntityExtractor::new(Arc::clone(&gazetteer), config.entities.clone());
        Self::assemble(config, gazetteer, entities)
    }

    /// Create an engine with a caller-supplied entity recognizer
    pub fn with_recognizer(
        config: ExtractorConfig,
        gazetteer: Arc<Gazetteer>,
        recognizer: Box<dyn EntityRecognizer>,
    ) -> Self {
        let entities =
            EntityExtractor::with_recognizer(Arc::clone(&gazetteer), config.entities.clone(), recognizer);
        Self::assemble(config, gazetteer, entities)
    }

    fn assemble(config: ExtractorConfig, gazetteer: Arc<Gazetteer>, entities: EntityExtractor) -> Self {
        Self {
            sectioner: BlockSectioner::new(config.sectioner.clone()),
            tables: TableExtractor::new(&config.tables),
            patterns: PatternExtractor::new(),
            entities,
            gazetteer,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Name of the entity recognizer in use
    pub fn recognizer_name(&self) -> &'static str {
        self.entities.recognizer_name()
    }

    /// Provider blocks of an email; the whole text becomes one block when
    /// sectioning finds none
    pub fn section(&self, content: &ParsedContent) -> Vec<ProviderBlock> {
        let blocks = self.sectioner.section(&content.normalized_text);
        if blocks.is_empty() {
            debug!("No provider blocks found, using the whole text");
            return vec![ProviderBlock::whole_text(
                &content.normalized_text,
                FALLBACK_BLOCK_CONFIDENCE,
            )];
        }
        blocks
    }

    /// Candidates from every HTML table, then every text table
    pub fn table_candidates(&self, content: &ParsedContent) -> TableCandidates {
        let mut candidates = TableCandidates::new();
        if let Some(html) = &content.html_content {
            let tables = self.tables.extract_from_html_table(html);
            merge_candidates(&mut candidates, self.tables.extract_candidates_from_tables(&tables));
        }
        let tables = self.tables.extract_from_text_table(&content.normalized_text);
        merge_candidates(&mut candidates, self.tables.extract_candidates_from_tables(&tables));
        candidates
    }

    /// One record per provider block.
    ///
    /// Never fails: blank input yields one unresolved record, and a block
    /// whose extraction panics yields an unresolved record in its place.
    pub fn extract_all_fields(&self, content: &ParsedContent) -> Vec<Record> {
        if content.is_blank() {
            info!("Empty email body, emitting one unresolved record");
            return vec![Record::new()];
        }

        let prepared = catch_unwind(AssertUnwindSafe(|| (self.email_context(content), self.section(content))));
        let (email, blocks) = match prepared {
            Ok(prepared) => prepared,
            Err(_) => {
                warn!("Email-level extraction panicked, emitting one unresolved record");
                return vec![Record::new()];
            }
        };

        info!(
            "Extracting {} block(s), {} table field(s) found",
            blocks.len(),
            email.tables.len()
        );

        blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                catch_unwind(AssertUnwindSafe(|| self.extract_block(&email, block))).unwrap_or_else(|_| {
                    warn!("Extraction of block {} panicked, emitting an unresolved record", index);
                    Record::new()
                })
            })
            .collect()
    }

    fn email_context<'a>(&self, content: &'a ParsedContent) -> EmailContext<'a> {
        let text = content.normalized_text.as_str();
        let transaction = self
            .entities
            .extract_transaction_types(text)
            .into_iter()
            .next()
            .or_else(|| self.patterns.extract_transaction_type_candidates(text).into_iter().next());
        let transaction_label = transaction.map(|c| c.value);
        let transaction_type = transaction_label.as_deref().and_then(TransactionType::parse);
        let full_text = format!("{}\n{}", content.text_content, content.normalized_text);
        let attribute = resolve_attribute(transaction_type, &full_text);
        debug!(
            "Email transaction type {:?}, attribute {}",
            transaction_label, attribute
        );

        EmailContext {
            text,
            transaction_type,
            transaction_label,
            attribute,
            tables: self.table_candidates(content),
        }
    }

    fn extract_block(&self, email: &EmailContext<'_>, block: &ProviderBlock) -> Record {
        let ctx = BlockContext {
            email,
            text: &block.text,
            tables: filter_for_block(&email.tables, &block.text, self.config.tables.out_of_block_scale),
        };
        let mut record = Record::new();

        if let Some(label) = &email.transaction_label {
            record.set(OutputField::TransactionType, label.clone());
        }
        record.set(OutputField::TransactionAttribute, email.attribute.clone());

        for (field, steps) in CHAINS {
            let resolved = steps
                .iter()
                .find_map(|step| self.run_step(*step, &ctx).map(|value| (step, value)));
            if let Some((step, value)) = resolved {
                debug!("{} <- {:?}: {}", field, step, value);
                record.set(*field, value);
            }
        }

        let (effective, term) = self.resolve_dates(&ctx);
        if let Some(date) = effective {
            record.set(OutputField::EffectiveDate, date);
        }
        if let Some(date) = term {
            record.set(OutputField::TermDate, date);
        }

        if email.transaction_type == Some(TransactionType::Term) {
            let reason = extract_term_reason(email.text)
                .or_else(|| ctx.table(TableField::TermReason, 0).map(str::to_string))
                .or_else(|| extract_term_reason(&block.text));
            if let Some(reason) = reason {
                record.set(OutputField::TermReason, reason);
            }
        }

        finalize(&mut record);
        record
    }

    fn run_step(&self, step: Step, ctx: &BlockContext<'_>) -> Option<String> {
        match step {
            Step::Table(field, nth) => ctx.table(field, nth).and_then(|v| self.tidy_table_value(field, v)),
            Step::Pattern(kind, scope, nth) => {
                let text = ctx.text(scope);
                let candidates = match kind {
                    Pattern::Npi => self.patterns.extract_npi_candidates(text),
                    Pattern::Tin => self.patterns.extract_tin_candidates(text),
                    Pattern::Ppg => self.patterns.extract_ppg_candidates(text),
                    Pattern::Phone => self.patterns.extract_phone_candidates(text),
                    Pattern::Fax => self.patterns.extract_fax_candidates(text),
                    Pattern::License => self.patterns.extract_license_candidates(text),
                };
                candidates.into_iter().nth(nth).map(|c| c.value)
            }
            Step::Entity(kind, scope) => {
                let text = ctx.text(scope);
                match kind {
                    Entity::ProviderName => first_value(self.entities.extract_provider_names(text)),
                    Entity::Organization => first_value(self.entities.extract_organizations(text)),
                    Entity::Specialty => first_value(self.entities.extract_specialties(text)),
                    Entity::LineOfBusiness => {
                        let buckets: Vec<String> = self
                            .entities
                            .extract_line_of_business(text)
                            .into_iter()
                            .map(|c| c.value)
                            .collect();
                        (!buckets.is_empty()).then(|| buckets.join(", "))
                    }
                }
            }
        }
    }

    fn tidy_table_value(&self, field: TableField, value: &str) -> Option<String> {
        let value = value.trim();
        let tidy = match field {
            TableField::ProviderName => strip_provider_title(value),
            TableField::Specialty => self
                .gazetteer
                .canonical_specialty(value)
                .unwrap_or(value)
                .to_string(),
            TableField::EffectiveDate | TableField::TermDate | TableField::Date => {
                normalize_any_date(value).unwrap_or_else(|| value.to_string())
            }
            _ => value.to_string(),
        };
        (!tidy.is_empty()).then_some(tidy)
    }

    /// (effective, term) dates for a block
    fn resolve_dates(&self, ctx: &BlockContext<'_>) -> (Option<String>, Option<String>) {
        let is_term = ctx.email.transaction_type == Some(TransactionType::Term);
        let route = |date: String| if is_term { (None, Some(date)) } else { (Some(date), None) };

        let mut term = ctx
            .table(TableField::TermDate, 0)
            .and_then(|v| self.tidy_table_value(TableField::TermDate, v));
        let mut effective = None;

        if term.is_none() {
            let generic = [TableField::EffectiveDate, TableField::Date].into_iter().find_map(|field| {
                ctx.table(field, 0).and_then(|v| self.tidy_table_value(field, v))
            });
            if let Some(date) = generic {
                (effective, term) = route(date);
            }
        }

        if effective.is_none() && term.is_none() {
            let mut pool = self.patterns.extract_date_candidates(ctx.email.text);
            pool.extend(self.entities.extract_dates(ctx.email.text));
            if let Some(best) = best_by_confidence(&pool) {
                debug!("Email date {} from {}", best.value, best.extractor_id);
                (effective, term) = route(best.value.clone());
            }
        }

        if effective.is_none() && term.is_none() {
            if let Some(date) = first_value(self.entities.extract_dates(ctx.text)) {
                (effective, term) = route(date);
            }
        }

        (effective, term)
    }
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

fn first_value(candidates: Vec<ExtractionCandidate>) -> Option<String> {
    candidates.into_iter().next().map(|c| c.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_domain::{RecognizedEntity, NOT_FOUND};

    fn engine() -> ExtractionEngine {
        ExtractionEngine::default()
    }

    fn only_record(text: &str) -> Record {
        let records = engine().extract_all_fields(&ParsedContent::from_text(text));
        assert_eq!(records.len(), 1);
        records.into_iter().next().unwrap()
    }

    #[test]
    fn test_every_chain_field_is_distinct() {
        let mut fields: Vec<_> = CHAINS.iter().map(|(f, _)| *f).collect();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), CHAINS.len());
        assert!(!fields.contains(&OutputField::TransactionType));
        assert!(!fields.contains(&OutputField::EffectiveDate));
    }

    #[test]
    fn test_blank_input_gives_one_unresolved_record() {
        let records = engine().extract_all_fields(&ParsedContent::from_text("  \n "));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], Record::new());
    }

    #[test]
    fn test_term_email() {
        let record = only_record(
            "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025. Reason: retirement.",
        );
        assert_eq!(record.get(OutputField::TransactionType), "Term");
        assert_eq!(record.get(OutputField::ProviderName), "John Smith");
        assert_eq!(record.get(OutputField::ProviderNpi), "1234567893");
        assert_eq!(record.get(OutputField::TermDate), "09/22/2025");
        assert_eq!(record.get(OutputField::EffectiveDate), NOT_FOUND);
        assert_eq!(record.get(OutputField::TermReason), "Retired");
        assert_eq!(record.get(OutputField::TransactionAttribute), "Provider");
        assert_eq!(record.get(OutputField::GroupNpi), NOT_FOUND);
    }

    #[test]
    fn test_table_candidates_feed_the_record() {
        let text = "Please add the provider below.\n\nProvider Name | NPI | Specialty\nDr. Jane Doe | 1245319599 | cardiology\n";
        let record = only_record(text);
        assert_eq!(record.get(OutputField::TransactionType), "Add");
        assert_eq!(record.get(OutputField::ProviderName), "Jane Doe");
        assert_eq!(record.get(OutputField::ProviderNpi), "1245319599");
        assert_eq!(record.get(OutputField::ProviderSpecialty), "Cardiology");
        assert_eq!(record.get(OutputField::TransactionAttribute), NOT_FOUND);
    }

    #[test]
    fn test_table_values_are_tidied() {
        let engine = engine();
        assert_eq!(
            engine.tidy_table_value(TableField::ProviderName, "Dr. Jane Doe").as_deref(),
            Some("Jane Doe")
        );
        assert_eq!(
            engine.tidy_table_value(TableField::TermDate, "2025-09-22").as_deref(),
            Some("09/22/2025")
        );
        assert_eq!(engine.tidy_table_value(TableField::Address, "  "), None);
    }

    #[test]
    fn test_two_provider_sections_give_two_records() {
        let text = "Hello team,\nPlease add the following providers. TIN: 12-3456789\n\nProvider: Jane Doe\nNPI: 1234567893\nSpecialty: Cardiology\n\nProvider: John Smith\nNPI: 1245319599\nSpecialty: Dermatology\n\nThanks";
        let records = engine().extract_all_fields(&ParsedContent::from_text(text));
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.get(OutputField::Tin), "12-3456789");
            assert_eq!(record.get(OutputField::TransactionType), "Add");
        }
        assert_eq!(records[0].get(OutputField::ProviderName), "Jane Doe");
        assert_eq!(records[1].get(OutputField::ProviderName), "John Smith");
        assert_eq!(records[0].get(OutputField::ProviderNpi), "1234567893");
        assert_eq!(records[1].get(OutputField::ProviderNpi), "1245319599");
        // Second NPI of the email is the group NPI for every block.
        assert_eq!(records[0].get(OutputField::GroupNpi), "1245319599");
        assert_eq!(records[1].get(OutputField::GroupNpi), "1245319599");
        assert_eq!(records[1].get(OutputField::ProviderSpecialty), "Dermatology");
    }

    #[test]
    fn test_second_table_npi_is_group_npi() {
        let text = "Please add the provider below.\n\nProvider Name | NPI | Group NPI | Specialty\nDr. Jane Doe | 1245319599 | 1234567893 | cardiology\n";
        let record = only_record(text);
        assert_eq!(record.get(OutputField::ProviderName), "Jane Doe");
        assert_eq!(record.get(OutputField::ProviderNpi), "1245319599");
        assert_eq!(record.get(OutputField::GroupNpi), "1234567893");
    }

    struct Panicking;

    impl EntityRecognizer for Panicking {
        fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, String> {
            panic!("recognizer blew up");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[test]
    fn test_panicking_block_gives_unresolved_record() {
        let engine = ExtractionEngine::with_recognizer(
            ExtractorConfig::default(),
            Arc::new(Gazetteer::builtin()),
            Box::new(Panicking),
        );
        let records = engine.extract_all_fields(&ParsedContent::from_text(
            "Provider: Jane Doe\nNPI: 1245319599",
        ));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].found_count(), 0);
    }
}
