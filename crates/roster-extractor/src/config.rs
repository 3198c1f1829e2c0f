//! Configuration for the extraction core

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ExtractorError, Result};

/// Which entity-recognizer back-end to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    /// Capitalisation/gazetteer recognizer
    #[default]
    Heuristic,
    /// Regex-only fallback
    Pattern,
}

/// Block sectioner tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionerConfig {
    /// Blocks starting within this many lines of the previous block's end are merged
    pub merge_gap_lines: usize,

    /// Lines either side of an NPI line scanned for soft evidence
    pub soft_evidence_window: usize,

    /// Minimum evidence hits for a soft-cue block
    pub min_soft_evidence: usize,

    /// Line budget for a hard-cue block
    pub hard_cue_max_lines: usize,

    /// Line budget for a soft-cue block
    pub soft_cue_max_lines: usize,

    /// Lines scanned below a table header for data rows
    pub table_row_scan_limit: usize,

    /// Blocks below this confidence are dropped
    pub min_block_confidence: f64,
}

impl Default for SectionerConfig {
    fn default() -> Self {
        Self {
            merge_gap_lines: 2,
            soft_evidence_window: 3,
            min_soft_evidence: 2,
            hard_cue_max_lines: 10,
            soft_cue_max_lines: 5,
            table_row_scan_limit: 20,
            min_block_confidence: 0.3,
        }
    }
}

/// Table extractor tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Minimum 0-100 similarity for a header to map to a field
    pub fuzzy_threshold: f64,

    /// Confidence boost for vertical (label: value) tables
    pub vertical_boost: f64,

    /// Confidence factor for non-provider-specific candidates outside a block
    pub out_of_block_scale: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 60.0,
            vertical_boost: 0.2,
            out_of_block_scale: 0.6,
        }
    }
}

/// Entity extractor tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Recognizer back-end
    pub recognizer: RecognizerKind,

    /// Minimum ratio score for fuzzy specialty matches
    pub specialty_ratio_cutoff: f64,

    /// Minimum partial-ratio score for fuzzy specialty matches
    pub specialty_partial_cutoff: f64,

    /// Tokens either side of a name scanned for a provider title
    pub title_window_tokens: usize,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            recognizer: RecognizerKind::Heuristic,
            specialty_ratio_cutoff: 80.0,
            specialty_partial_cutoff: 85.0,
            title_window_tokens: 5,
        }
    }
}

/// Configuration for the extraction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Sectioner settings
    pub sectioner: SectionerConfig,

    /// Table settings
    pub tables: TableConfig,

    /// Entity settings
    pub entities: EntityConfig,

    /// Directory holding `specialties.yml`, `lob_map.yml`, `organization_types.yml`
    pub gazetteer_dir: Option<PathBuf>,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        let s = &self.sectioner;
        if s.hard_cue_max_lines == 0 || s.soft_cue_max_lines == 0 {
            return Err("block line budgets must be greater than 0".to_string());
        }
        if s.min_soft_evidence == 0 {
            return Err("min_soft_evidence must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&s.min_block_confidence) {
            return Err("min_block_confidence must be within 0.0..=1.0".to_string());
        }
        if !(0.0..=100.0).contains(&self.tables.fuzzy_threshold) {
            return Err("fuzzy_threshold must be within 0..=100".to_string());
        }
        if !(0.0..=1.0).contains(&self.tables.vertical_boost) {
            return Err("vertical_boost must be within 0.0..=1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.tables.out_of_block_scale) {
            return Err("out_of_block_scale must be within 0.0..=1.0".to_string());
        }
        let e = &self.entities;
        if !(0.0..=100.0).contains(&e.specialty_ratio_cutoff)
            || !(0.0..=100.0).contains(&e.specialty_partial_cutoff)
        {
            return Err("specialty cutoffs must be within 0..=100".to_string());
        }
        Ok(())
    }

    /// Strict preset: fewer, better-evidenced blocks and tighter fuzzy matching
    pub fn strict() -> Self {
        Self {
            sectioner: SectionerConfig {
                merge_gap_lines: 1,
                min_soft_evidence: 3,
                min_block_confidence: 0.5,
                ..SectionerConfig::default()
            },
            tables: TableConfig {
                fuzzy_threshold: 75.0,
                ..TableConfig::default()
            },
            entities: EntityConfig {
                specialty_ratio_cutoff: 88.0,
                specialty_partial_cutoff: 92.0,
                ..EntityConfig::default()
            },
            gazetteer_dir: None,
        }
    }

    /// Lenient preset: wider windows and looser fuzzy matching
    pub fn lenient() -> Self {
        Self {
            sectioner: SectionerConfig {
                merge_gap_lines: 3,
                soft_evidence_window: 5,
                hard_cue_max_lines: 15,
                min_block_confidence: 0.2,
                ..SectionerConfig::default()
            },
            tables: TableConfig {
                fuzzy_threshold: 50.0,
                out_of_block_scale: 0.8,
                ..TableConfig::default()
            },
            entities: EntityConfig {
                specialty_ratio_cutoff: 72.0,
                specialty_partial_cutoff: 80.0,
                title_window_tokens: 8,
                ..EntityConfig::default()
            },
            gazetteer_dir: None,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> std::result::Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents).map_err(ExtractorError::Config)?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }
}
