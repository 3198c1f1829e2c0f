//! Serializable views of an extraction run

use roster_domain::{ParsedContent, ProviderBlock, Record};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::ExtractionEngine;
use crate::error::Result;
use crate::validation::{RecordValidator, ValidationReport};

/// Summary of one provider block
#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    /// First line of the block (0-based)
    pub start_line: usize,

    /// Last line of the block, inclusive
    pub end_line: usize,

    /// Detectors that produced the block
    pub indicators: Vec<String>,

    /// Block confidence
    pub confidence: f64,

    /// Scope label from the nearest preceding marker
    pub transaction_scope: Option<String>,

    /// Email-wide values attached to the block
    pub shared_fields: BTreeMap<String, String>,
}

impl From<&ProviderBlock> for BlockSummary {
    fn from(block: &ProviderBlock) -> Self {
        Self {
            start_line: block.start_line,
            end_line: block.end_line,
            indicators: block
                .provider_indicators
                .iter()
                .map(|i| i.as_str().to_string())
                .collect(),
            confidence: block.confidence,
            transaction_scope: block.transaction_type.map(|t| t.as_str().to_string()),
            shared_fields: block
                .shared_fields
                .entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// A record serialized as a header-keyed map in export order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow(pub Record);

impl Serialize for RecordRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(17))?;
        for (field, value) in self.0.iter() {
            map.serialize_entry(field.header(), value)?;
        }
        map.end()
    }
}

/// One validation issue, flattened for output
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    /// Record index
    pub record: usize,

    /// Column header
    pub field: String,

    /// Human-readable problem
    pub message: String,
}

/// Everything one email produced
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    /// Where the email came from, if known
    pub source: Option<String>,

    /// Entity recognizer back-end used
    pub recognizer: String,

    /// Provider blocks in text order
    pub blocks: Vec<BlockSummary>,

    /// One row per block
    pub records: Vec<RecordRow>,

    /// Validation issues across all records
    pub issues: Vec<IssueSummary>,
}

impl ExtractionReport {
    /// Run the engine over `content` and validate every record
    pub fn build(engine: &ExtractionEngine, content: &ParsedContent, source: Option<String>) -> Self {
        let blocks = engine.section(content).iter().map(BlockSummary::from).collect();
        let records = engine.extract_all_fields(content);

        let validator = RecordValidator::new();
        let issues = records
            .iter()
            .enumerate()
            .flat_map(|(index, record)| summarize(index, &validator.validate(record)))
            .collect();

        Self {
            source,
            recognizer: engine.recognizer_name().to_string(),
            blocks,
            records: records.into_iter().map(RecordRow).collect(),
            issues,
        }
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain records
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().map(|r| &r.0)
    }
}

fn summarize(index: usize, report: &ValidationReport) -> Vec<IssueSummary> {
    report
        .iter()
        .map(|(field, issue)| IssueSummary {
            record: index,
            field: field.header().to_string(),
            message: issue.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_domain::{OutputField, NOT_FOUND};

    #[test]
    fn test_record_row_keeps_export_order() {
        let mut record = Record::new();
        record.set(OutputField::Tin, "12-3456789");
        let json = serde_json::to_string(&RecordRow(record)).unwrap();

        let tt = json.find("Transaction Type").unwrap();
        let tin = json.find("\"TIN\"").unwrap();
        let lob = json.find("Line Of Business").unwrap();
        assert!(tt < tin && tin < lob);
        assert!(json.contains("\"TIN\":\"12-3456789\""));
        assert!(json.contains(NOT_FOUND));
    }

    #[test]
    fn test_report_for_term_email() {
        let engine = ExtractionEngine::default();
        let content = ParsedContent::from_text(
            "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025. Reason: retirement.",
        );
        let report = ExtractionReport::build(&engine, &content, Some("term.txt".to_string()));

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.recognizer, "heuristic");
        let json = report.to_json().unwrap();
        assert!(json.contains("\"source\": \"term.txt\""));
        assert!(json.contains("\"Term Date\": \"09/22/2025\""));
    }
}
