//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use roster_domain::{OutputField, Record, NOT_FOUND};
use roster_extractor::{BlockSummary, ExtractionReport, IssueSummary};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the records of one report.
    pub fn format_report(&self, report: &ExtractionReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(report.to_json()?),
            OutputFormat::Table => Ok(self.format_records_table(report.records())),
            OutputFormat::Quiet => Ok(self.format_records_quiet(report.records())),
        }
    }

    /// Format records as a table: one row per field, one column per record.
    fn format_records_table<'a>(&self, records: impl Iterator<Item = &'a Record>) -> String {
        let records: Vec<&Record> = records.collect();
        if records.is_empty() {
            return self.colorize("No records extracted.", "yellow");
        }

        let mut builder = Builder::default();
        let mut header = vec!["Field".to_string()];
        header.extend((1..=records.len()).map(|i| format!("Record {}", i)));
        builder.push_record(header);

        for field in OutputField::ALL {
            let mut row = vec![field.header().to_string()];
            for record in &records {
                let value = record.get(field);
                row.push(if value == NOT_FOUND {
                    self.dim(value)
                } else {
                    value.to_string()
                });
            }
            builder.push_record(row);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format records in quiet mode (transaction, name, NPI per line).
    fn format_records_quiet<'a>(&self, records: impl Iterator<Item = &'a Record>) -> String {
        records
            .map(|r| {
                [
                    OutputField::TransactionType,
                    OutputField::ProviderName,
                    OutputField::ProviderNpi,
                ]
                .iter()
                .map(|f| r.get(*f))
                .collect::<Vec<_>>()
                .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format provider blocks.
    pub fn format_blocks(&self, blocks: &[BlockSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(blocks)?),
            OutputFormat::Quiet => Ok(blocks
                .iter()
                .map(|b| format!("{}-{}", b.start_line, b.end_line))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if blocks.is_empty() {
                    return Ok(self.colorize("No provider blocks found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["#", "Lines", "Detectors", "Confidence", "Scope", "Shared"]);
                for (i, block) in blocks.iter().enumerate() {
                    let shared = block
                        .shared_fields
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ");
                    builder.push_record([
                        (i + 1).to_string(),
                        format!("{}-{}", block.start_line, block.end_line),
                        block.indicators.join(", "),
                        format!("{:.2}", block.confidence),
                        block.transaction_scope.clone().unwrap_or_else(|| "-".to_string()),
                        shared,
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format validation issues as warning lines.
    pub fn issues(&self, issues: &[IssueSummary]) -> Vec<String> {
        issues
            .iter()
            .map(|i| self.warning(&format!("Record {} / {}: {}", i.record + 1, i.field, i.message)))
            .collect()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn dim(&self, text: &str) -> String {
        if self.color_enabled {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_domain::ParsedContent;
    use roster_extractor::ExtractionEngine;

    fn report() -> ExtractionReport {
        let engine = ExtractionEngine::default();
        let content = ParsedContent::from_text(
            "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025. Reason: retirement.",
        );
        ExtractionReport::build(&engine, &content, Some("term.txt".to_string()))
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("Provider NPI"));
        assert!(output.contains("Record 1"));
        assert!(output.contains("John Smith"));
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_report(&report()).unwrap();
        assert_eq!(output, "Term\tJohn Smith\t1234567893");
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("\"records\""));
        assert!(output.contains("\"Term Reason\": \"Retired\""));
    }

    #[test]
    fn test_blocks_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_blocks(&report().blocks).unwrap();
        assert_eq!(output, "0-0");
    }

    #[test]
    fn test_issue_lines() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let lines = formatter.issues(&[IssueSummary {
            record: 0,
            field: "Term Date".to_string(),
            message: "required for Term".to_string(),
        }]);
        assert_eq!(lines, vec!["⚠ Record 1 / Term Date: required for Term"]);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
