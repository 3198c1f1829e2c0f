//! Block module - provider-scoped spans of an email body

use crate::transaction::TransactionType;
use std::fmt;

/// Which detector produced (part of) a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockIndicator {
    /// `Provider:` / `Doctor:` / `Physician:` anchor line
    HardCue,
    /// Data row under a recognized table header
    TableRow,
    /// NPI line backed by nearby license/TIN evidence
    SoftCue,
    /// Whole text used because nothing else was found
    Fallback,
}

impl BlockIndicator {
    /// Tag used in logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockIndicator::HardCue => "hard_cue",
            BlockIndicator::TableRow => "table_row",
            BlockIndicator::SoftCue => "soft_cue",
            BlockIndicator::Fallback => "fallback",
        }
    }
}

impl fmt::Display for BlockIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email-scope values found once and copied into every block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedFields {
    /// First TIN mentioned anywhere in the email
    pub tin: Option<String>,
    /// First PPG code mentioned anywhere in the email
    pub ppg: Option<String>,
    /// Sorted, comma-joined set of LOB keywords
    pub lob: Option<String>,
    /// First organization keyword hit
    pub organization: Option<String>,
}

impl SharedFields {
    /// True when nothing email-wide was detected
    pub fn is_empty(&self) -> bool {
        self.tin.is_none() && self.ppg.is_none() && self.lob.is_none() && self.organization.is_none()
    }

    /// Present values as `(name, value)` pairs
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("tin", &self.tin),
            ("ppg", &self.ppg),
            ("lob", &self.lob),
            ("organization", &self.organization),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
        .collect()
    }
}

/// A contiguous span of source text describing one provider/transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBlock {
    /// Block text (lines joined with `\n`)
    pub text: String,

    /// First line index into the normalized text
    pub start_line: usize,

    /// Last line index (inclusive)
    pub end_line: usize,

    /// Scope label from the nearest preceding marker, if any
    pub transaction_type: Option<TransactionType>,

    /// Detectors that contributed to this block
    pub provider_indicators: Vec<BlockIndicator>,

    /// Detector confidence
    pub confidence: f64,

    /// Email-wide values
    pub shared_fields: SharedFields,
}

impl ProviderBlock {
    /// Create a block produced by a single detector
    pub fn new(
        text: impl Into<String>,
        start_line: usize,
        end_line: usize,
        indicator: BlockIndicator,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            start_line,
            end_line,
            transaction_type: None,
            provider_indicators: vec![indicator],
            confidence,
            shared_fields: SharedFields::default(),
        }
    }

    /// Block covering an entire text, used when sectioning finds nothing
    pub fn whole_text(text: &str, confidence: f64) -> Self {
        let end_line = text.lines().count().saturating_sub(1);
        Self::new(text, 0, end_line, BlockIndicator::Fallback, confidence)
    }

    /// Whether a detector tag is present
    pub fn has_indicator(&self, indicator: BlockIndicator) -> bool {
        self.provider_indicators.contains(&indicator)
    }

    /// Number of lines spanned
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_text_block() {
        let block = ProviderBlock::whole_text("a\nb\nc", 0.5);
        assert_eq!(block.start_line, 0);
        assert_eq!(block.end_line, 2);
        assert_eq!(block.line_count(), 3);
        assert!(block.has_indicator(BlockIndicator::Fallback));
        assert!(block.transaction_type.is_none());
    }

    #[test]
    fn test_shared_field_entries() {
        let shared = SharedFields {
            tin: Some("12-3456789".to_string()),
            lob: Some("Commercial, Medicare".to_string()),
            ..Default::default()
        };
        assert!(!shared.is_empty());
        assert_eq!(
            shared.entries(),
            vec![("tin", "12-3456789"), ("lob", "Commercial, Medicare")]
        );
        assert!(SharedFields::default().is_empty());
    }
}
