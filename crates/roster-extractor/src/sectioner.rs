//! Block sectioner
//!
//! Splits a normalized email body into provider/transaction blocks so a
//! multi-provider email produces one record per provider.
//!
//! Three detectors run independently over the line list:
//!
//! - **hard cue**: `Provider:` / `Provider 2:` / `Doctor:` / `Physician:` anchor lines
//! - **table row**: separator-bearing lines with an NPI- or license-shaped
//!   token below a recognized table header
//! - **soft cue**: `NPI: <10 digits>` lines backed by nearby NPI/license/TIN evidence
//!
//! Their blocks are merged by line proximity, labelled with the nearest
//! preceding transaction-scope marker and filtered by confidence.

use once_cell::sync::Lazy;
use regex::Regex;
use roster_domain::{BlockIndicator, ProviderBlock, SharedFields, TransactionType};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::SectionerConfig;
use crate::patterns::{normalize_tin, PPG_FALSE_POSITIVES};
use crate::text::compile_all;

const HARD_CUE_CONFIDENCE: f64 = 0.9;
const TABLE_ROW_CONFIDENCE: f64 = 0.8;
const SOFT_EVIDENCE_WEIGHT: f64 = 0.2;
const SOFT_CUE_MAX_CONFIDENCE: f64 = 0.7;

static HARD_CUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)^\s*provider\s*:",
        r"(?i)^\s*provider\s+name\s*:",
        r"(?i)^\s*provider\s+\d+\s*:",
        r"(?i)^\s*doctor\s*:",
        r"(?i)^\s*physician\s*:",
    ])
});

static TABLE_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)provider.*name.*npi",
        r"(?i)name.*npi.*tin",
        r"(?i)npi.*provider.*specialty",
    ])
});

static ROW_TOKENS: Lazy<Vec<Regex>> = Lazy::new(|| compile_all(&[r"\d{10}", r"[A-Z]\d{5}"]));

static SOFT_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)NPI[:\s]*\d{10}").unwrap());
static SOFT_EVIDENCE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)NPI[:\s]*\d{10}",
        r"(?i)License[:\s]*[A-Z]\d+",
        r"(?i)TIN[:\s]*\d{2}-?\d{7}",
    ])
});

static SCOPE_MARKERS: Lazy<Vec<(TransactionType, Regex)>> = Lazy::new(|| {
    [
        (TransactionType::Add, r"(?i)\b(?:add|new|include|enroll|join)\b"),
        (TransactionType::Term, r"(?i)\b(?:term|terminate|remove|discontinue|end)\b"),
        (TransactionType::Update, r"(?i)\b(?:update|change|modify|revise|correct|move)\b"),
    ]
    .into_iter()
    .map(|(t, p)| (t, Regex::new(p).unwrap()))
    .collect()
});

static SHARED_TIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)TIN[:\s#]*(\d{2}-?\d{7})").unwrap());
static SHARED_PPG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)PPG(?:[ \t]*ID)?[:\s#']*([A-Za-z0-9]+)").unwrap());
static SHARED_LOB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(medicare|medicaid|commercial|hmo|ppo)\b").unwrap());
static SHARED_ORGANIZATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)medical group|healthcare|clinic|practice").unwrap());

/// Splits email text into provider blocks
#[derive(Debug, Clone, Default)]
pub struct BlockSectioner {
    config: SectionerConfig,
}

impl BlockSectioner {
    /// Create a sectioner with the given tuning
    pub fn new(config: SectionerConfig) -> Self {
        Self { config }
    }

    /// Detect provider blocks in `text`, ordered by position.
    ///
    /// An empty result means no cue survived; the caller decides the fallback.
    pub fn section(&self, text: &str) -> Vec<ProviderBlock> {
        let lines: Vec<&str> = text.split('\n').collect();
        let shared = extract_shared_fields(text);

        let mut blocks = self.hard_cue_blocks(&lines, &shared);
        blocks.extend(self.table_row_blocks(&lines, &shared));
        blocks.extend(self.soft_cue_blocks(&lines, &shared));
        debug!("Sectioner found {} raw blocks", blocks.len());

        let mut blocks = self.merge(blocks, &lines);
        apply_transaction_scope(&mut blocks, &lines);
        blocks.retain(|b| b.confidence >= self.config.min_block_confidence);

        info!("Detected {} provider blocks", blocks.len());
        blocks
    }

    fn hard_cue_blocks(&self, lines: &[&str], shared: &SharedFields) -> Vec<ProviderBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if !is_hard_cue(lines[i].trim()) {
                i += 1;
                continue;
            }
            let end = block_end(lines, i, self.config.hard_cue_max_lines);
            blocks.push(block(lines, i, end, BlockIndicator::HardCue, HARD_CUE_CONFIDENCE, shared));
            i = end + 1;
        }
        blocks
    }

    fn table_row_blocks(&self, lines: &[&str], shared: &SharedFields) -> Vec<ProviderBlock> {
        let mut blocks = Vec::new();
        for (header, line) in lines.iter().enumerate() {
            if !TABLE_HEADERS.iter().any(|p| p.is_match(line)) {
                continue;
            }
            let limit = lines.len().min(header + self.config.table_row_scan_limit);
            for row in header + 1..limit {
                let trimmed = lines[row].trim();
                if !trimmed.is_empty() && looks_like_table_row(trimmed) {
                    blocks.push(block(lines, row, row, BlockIndicator::TableRow, TABLE_ROW_CONFIDENCE, shared));
                }
            }
        }
        blocks
    }

    fn soft_cue_blocks(&self, lines: &[&str], shared: &SharedFields) -> Vec<ProviderBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if !SOFT_ANCHOR.is_match(lines[i].trim()) {
                i += 1;
                continue;
            }
            let evidence = soft_evidence(lines, i, self.config.soft_evidence_window);
            if evidence < self.config.min_soft_evidence {
                i += 1;
                continue;
            }
            let end = block_end(lines, i, self.config.soft_cue_max_lines);
            let confidence = f64::min(evidence as f64 * SOFT_EVIDENCE_WEIGHT, SOFT_CUE_MAX_CONFIDENCE);
            blocks.push(block(lines, i, end, BlockIndicator::SoftCue, confidence, shared));
            i = end + 1;
        }
        blocks
    }

    /// Merge blocks by start line.
    ///
    /// A block starting within `merge_gap_lines` of the previous block's end
    /// joins it, except that two hard-cue blocks only join when they overlap.
    fn merge(&self, mut blocks: Vec<ProviderBlock>, lines: &[&str]) -> Vec<ProviderBlock> {
        blocks.sort_by_key(|b| b.start_line);
        let mut merged: Vec<ProviderBlock> = Vec::new();

        for next in blocks {
            let Some(current) = merged.last_mut() else {
                merged.push(next);
                continue;
            };
            let overlaps = next.start_line <= current.end_line;
            let both_hard =
                current.has_indicator(BlockIndicator::HardCue) && next.has_indicator(BlockIndicator::HardCue);
            let adjacent = next.start_line <= current.end_line + self.config.merge_gap_lines;

            if overlaps || (adjacent && !both_hard) {
                current.end_line = current.end_line.max(next.end_line);
                current.text = lines[current.start_line..=current.end_line].join("\n");
                for indicator in next.provider_indicators {
                    if !current.provider_indicators.contains(&indicator) {
                        current.provider_indicators.push(indicator);
                    }
                }
                current.confidence = current.confidence.max(next.confidence);
            } else {
                merged.push(next);
            }
        }
        merged
    }
}

/// Email-wide TIN, PPG, LOB and organization keyword
pub fn extract_shared_fields(text: &str) -> SharedFields {
    let tin = SHARED_TIN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| normalize_tin(m.as_str()).unwrap_or_else(|| m.as_str().to_string()));

    let ppg = SHARED_PPG
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .find(|code| !PPG_FALSE_POSITIVES.contains(&code.to_uppercase().as_str()));

    let lob_hits: BTreeSet<String> = SHARED_LOB
        .find_iter(text)
        .map(|m| lob_display(m.as_str()))
        .collect();
    let lob = (!lob_hits.is_empty()).then(|| lob_hits.into_iter().collect::<Vec<_>>().join(", "));

    let organization = SHARED_ORGANIZATION.find(text).map(|m| m.as_str().to_string());

    SharedFields {
        tin,
        ppg,
        lob,
        organization,
    }
}

/// Whether a trimmed line opens a provider section
pub fn is_hard_cue(line: &str) -> bool {
    HARD_CUES.iter().any(|p| p.is_match(line))
}

/// A separator plus an NPI- or license-shaped token
pub fn looks_like_table_row(line: &str) -> bool {
    let has_separator = line.contains('|') || line.contains('\t') || line.contains("  ");
    has_separator && ROW_TOKENS.iter().any(|p| p.is_match(line))
}

fn lob_display(hit: &str) -> String {
    match hit.to_lowercase().as_str() {
        "hmo" => "HMO".to_string(),
        "ppo" => "PPO".to_string(),
        other => crate::rules::title_case(other),
    }
}

fn block(
    lines: &[&str],
    start: usize,
    end: usize,
    indicator: BlockIndicator,
    confidence: f64,
    shared: &SharedFields,
) -> ProviderBlock {
    let mut block = ProviderBlock::new(lines[start..=end].join("\n"), start, end, indicator, confidence);
    block.shared_fields = shared.clone();
    block
}

/// Last line of a block starting at `start`.
///
/// A single blank line is tolerated when text follows it; the block stops at
/// a second blank line, the next hard cue, or after `max_lines` lines.
fn block_end(lines: &[&str], start: usize, max_lines: usize) -> usize {
    let mut end = start;
    let limit = lines.len().min(start + max_lines + 1);
    for i in start + 1..limit {
        let line = lines[i].trim();
        if line.is_empty() {
            if lines.get(i + 1).is_some_and(|next| !next.trim().is_empty()) {
                continue;
            }
            break;
        }
        if is_hard_cue(line) {
            return end;
        }
        end = i;
    }
    end
}

fn soft_evidence(lines: &[&str], at: usize, window: usize) -> usize {
    let from = at.saturating_sub(window);
    let to = lines.len().min(at + window + 1);
    lines[from..to]
        .iter()
        .map(|line| SOFT_EVIDENCE.iter().filter(|p| p.is_match(line.trim())).count())
        .sum()
}

/// Label each block with the scope of the closest marker at or above its first line
fn apply_transaction_scope(blocks: &mut [ProviderBlock], lines: &[&str]) {
    let markers: Vec<(usize, TransactionType)> = lines
        .iter()
        .enumerate()
        .flat_map(|(i, line)| {
            SCOPE_MARKERS
                .iter()
                .filter(|(_, pattern)| pattern.is_match(line))
                .map(move |(scope, _)| (i, *scope))
        })
        .collect();

    for block in blocks.iter_mut() {
        let mut nearest: Option<(usize, TransactionType)> = None;
        for &(line, scope) in &markers {
            if line > block.start_line {
                continue;
            }
            let distance = block.start_line - line;
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, scope));
            }
        }
        block.transaction_type = nearest.map(|(_, scope)| scope);
    }
}
