//! Table detection and header-to-field mapping
//!
//! Tables come from HTML `<table>` elements or from plain-text blocks
//! (pipe, tab or multi-space separated rows, and vertical `Label: value`
//! runs). Headers are mapped to [`TableField`]s by exact or fuzzy match
//! against each field's known variant phrases.

use roster_domain::{ExtractionCandidate, TableData, TableField};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::TableConfig;
use crate::html::{html_tables, HtmlTable};
use crate::similarity::ratio;

/// Table candidates keyed by field, each list in row-major discovery order
pub type TableCandidates = BTreeMap<TableField, Vec<ExtractionCandidate>>;

/// Words that mark a text line as a horizontal table header
const HEADER_INDICATORS: [&str; 6] = ["provider", "name", "npi", "tin", "specialty", "license"];

/// Words that mark a `Label: value` label as a roster field
const FIELD_INDICATORS: [&str; 18] = [
    "provider", "name", "npi", "tin", "specialty", "license", "organization", "phone", "fax",
    "address", "ppg", "date", "reason", "type", "lob", "group", "effective", "termination",
];

/// Vertical detection looks this many lines ahead for more labels
const VERTICAL_LOOKAHEAD: usize = 8;

/// HTML vertical detection inspects this many leading rows
const HTML_VERTICAL_PROBE_ROWS: usize = 5;

/// Known header phrases per field
pub fn field_variants(field: TableField) -> &'static [&'static str] {
    match field {
        TableField::ProviderName => &[
            "provider name", "provider", "doctor name", "physician name", "dr name", "name", "doctor",
            "physician", "practitioner",
        ],
        TableField::Npi => &[
            "npi", "npi #", "npi number", "national provider identifier", "provider id",
            "provider identifier", "npinumber", "provider npi", "group npi",
        ],
        TableField::Tin => &[
            "tin", "tax id", "federal id", "ein", "employer id", "tax identification", "federal tax id",
            "group tin",
        ],
        TableField::Specialty => &[
            "specialty", "speciality", "practice specialty", "medical specialty", "provider specialty",
            "field", "discipline",
        ],
        TableField::License => &[
            "license", "state license", "medical license", "lic #", "license number", "state lic",
            "license #",
        ],
        TableField::Organization => &[
            "organization", "org", "group", "practice", "medical group", "healthcare group", "clinic",
            "facility", "organization name",
        ],
        TableField::Phone => &["phone", "telephone", "phone number", "contact number", "tel", "contact", "phone #"],
        TableField::Fax => &["fax", "fax number", "facsimile", "fax #"],
        TableField::Address => &[
            "address", "practice address", "location", "office address", "mailing address",
            "complete address", "address change",
        ],
        TableField::Ppg => &[
            "ppg", "ppg id", "practice group", "group id", "provider group", "ppg number",
            "practice group id",
        ],
        TableField::EffectiveDate => &["effective date", "start date", "begin date", "effective"],
        TableField::TermDate => &["term date", "termination date", "end date", "expiration date"],
        TableField::TermReason => &["term reason", "termination reason", "reason", "exit reason"],
        TableField::ProviderType => &["provider type", "type", "practitioner type"],
        TableField::Lob => &["lob", "line of business", "business line", "network", "plan type", "insurance type"],
        TableField::Date => &["date", "as of date"],
    }
}

/// How a text table splits its cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Pipe,
    Tab,
    Spaces,
}

impl Separator {
    fn detect(line: &str) -> Option<Self> {
        if line.contains('|') {
            Some(Separator::Pipe)
        } else if line.contains('\t') {
            Some(Separator::Tab)
        } else if has_space_run(line) {
            Some(Separator::Spaces)
        } else {
            None
        }
    }

    fn matches(&self, line: &str) -> bool {
        match self {
            Separator::Pipe => line.contains('|'),
            Separator::Tab => line.contains('\t'),
            Separator::Spaces => has_space_run(line),
        }
    }

    fn split(&self, line: &str) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Separator::Pipe => line.split('|').collect(),
            Separator::Tab => line.split('\t').collect(),
            Separator::Spaces => split_on_space_runs(line),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Finds tables and turns their cells into field candidates
#[derive(Debug, Clone)]
pub struct TableExtractor {
    fuzzy_threshold: f64,
    vertical_boost: f64,
}

impl TableExtractor {
    /// Create an extractor from table settings
    pub fn new(config: &TableConfig) -> Self {
        Self {
            fuzzy_threshold: config.fuzzy_threshold,
            vertical_boost: config.vertical_boost,
        }
    }

    /// Tables in an HTML body
    pub fn extract_from_html_table(&self, html: &str) -> Vec<TableData> {
        html_tables(html)
            .iter()
            .filter_map(|rows| {
                if self.is_html_vertical(rows) {
                    self.parse_html_vertical(rows)
                } else {
                    self.parse_html_horizontal(rows)
                }
            })
            .collect()
    }

    /// Horizontal and vertical tables in normalized text
    pub fn extract_from_text_table(&self, text: &str) -> Vec<TableData> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut tables = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if looks_like_table_header(lines[i]) {
                match self.parse_text_table(&lines, i) {
                    Some(table) => {
                        i += table.rows.len() + 2;
                        tables.push(table);
                    }
                    None => i += 1,
                }
            } else if looks_like_vertical_start(&lines, i) {
                match self.parse_vertical_text(&lines, i) {
                    Some((table, consumed)) => {
                        i += consumed.max(1);
                        tables.push(table);
                    }
                    None => i += 1,
                }
            } else {
                i += 1;
            }
        }
        tables
    }

    /// Every non-empty mapped cell as a candidate carrying its table's confidence
    pub fn extract_candidates_from_tables(&self, tables: &[TableData]) -> TableCandidates {
        let mut candidates = TableCandidates::new();
        for table in tables {
            for (row_idx, row) in table.rows.iter().enumerate() {
                for (col_idx, cell) in row.iter().enumerate() {
                    let Some(field) = table.header_mappings.get(&col_idx) else {
                        continue;
                    };
                    let value = cell.trim();
                    if value.is_empty() {
                        continue;
                    }
                    let candidate = ExtractionCandidate::new(
                        value,
                        table.confidence,
                        format!("table_row_{}_col_{}", row_idx, col_idx),
                    )
                    .at(0)
                    .with_context(format!("Table row {}", row_idx + 1))
                    .validated(true);
                    candidates.entry(*field).or_default().push(candidate);
                }
            }
        }
        candidates
    }

    /// Map every header to a field; unmapped headers are absent from the result
    pub fn map_headers_to_fields(&self, headers: &[String]) -> BTreeMap<usize, TableField> {
        let mut mappings = BTreeMap::new();
        for (col, header) in headers.iter().enumerate() {
            match self.map_header(header) {
                Some((field, score)) => {
                    debug!("Mapped header '{}' -> '{}' (score: {:.0})", header, field, score);
                    mappings.insert(col, field);
                }
                None => debug!("Could not map header '{}'", header),
            }
        }
        mappings
    }

    /// Best field for one header.
    ///
    /// Fields are tried in [`TableField::ALL`] order; the first exact variant
    /// match wins outright, otherwise the highest fuzzy score at or above the
    /// threshold.
    pub fn map_header(&self, header: &str) -> Option<(TableField, f64)> {
        let clean = header.trim().to_lowercase();
        if clean.is_empty() {
            return None;
        }
        let mut best: Option<(TableField, f64)> = None;
        for field in TableField::ALL {
            for variant in field_variants(field) {
                if clean == *variant {
                    return Some((field, 100.0));
                }
                let score = ratio(&clean, variant);
                if score >= self.fuzzy_threshold && best.map_or(true, |(_, s)| score > s) {
                    best = Some((field, score));
                }
            }
        }
        best
    }

    fn build(&self, headers: Vec<String>, rows: Vec<Vec<String>>, boost: f64) -> TableData {
        let header_mappings = self.map_headers_to_fields(&headers);
        let mapped = if headers.is_empty() {
            0.0
        } else {
            header_mappings.len() as f64 / headers.len() as f64
        };
        TableData {
            headers,
            rows,
            header_mappings,
            confidence: (mapped + boost).min(1.0),
        }
    }

    fn is_html_vertical(&self, rows: &HtmlTable) -> bool {
        if rows.len() < 2 {
            return false;
        }
        let labelled = rows
            .iter()
            .take(HTML_VERTICAL_PROBE_ROWS)
            .filter(|cells| cells.len() == 2 && has_field_indicator(&cells[0]))
            .count();
        labelled >= 2
    }

    fn parse_html_horizontal(&self, rows: &HtmlTable) -> Option<TableData> {
        let (header, data) = rows.split_first()?;
        if header.is_empty() {
            return None;
        }
        let data: Vec<Vec<String>> = data.iter().filter(|r| !r.is_empty()).cloned().collect();
        Some(self.build(header.clone(), data, 0.0))
    }

    fn parse_html_vertical(&self, rows: &HtmlTable) -> Option<TableData> {
        let pairs: Vec<(String, String)> = rows
            .iter()
            .filter(|cells| cells.len() == 2)
            .filter(|cells| !cells[0].is_empty() && !cells[1].is_empty() && has_field_indicator(&cells[0]))
            .map(|cells| (cells[0].clone(), cells[1].clone()))
            .collect();
        self.vertical_table(pairs)
    }

    fn vertical_table(&self, pairs: Vec<(String, String)>) -> Option<TableData> {
        if pairs.len() < 2 {
            return None;
        }
        let (headers, values): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        Some(self.build(headers, vec![values], self.vertical_boost))
    }

    fn parse_text_table(&self, lines: &[&str], start: usize) -> Option<TableData> {
        let header_line = lines[start].trim();
        let separator = Separator::detect(header_line)?;
        let headers = separator.split(header_line);
        if headers.is_empty() {
            return None;
        }

        let mut rows = Vec::new();
        for line in lines.iter().skip(start + 1).map(|l| l.trim()) {
            if line.is_empty() || !separator.matches(line) {
                break;
            }
            let mut cells = separator.split(line);
            if cells.is_empty() || cells.len() > headers.len() {
                continue;
            }
            cells.resize(headers.len(), String::new());
            rows.push(cells);
        }

        if rows.is_empty() {
            return None;
        }
        Some(self.build(headers, rows, 0.0))
    }

    /// Parse a vertical `Label: value` run; returns the table and lines consumed
    fn parse_vertical_text(&self, lines: &[&str], start: usize) -> Option<(TableData, usize)> {
        let mut pairs = Vec::new();
        let mut consumed = 0;
        for line in lines.iter().skip(start).map(|l| l.trim()) {
            if line.is_empty() {
                consumed += 1;
                continue;
            }
            let Some((label, value)) = split_label(line) else {
                break;
            };
            if !label.is_empty() && !value.is_empty() {
                if has_field_indicator(&label) {
                    pairs.push((label, value.to_string()));
                } else {
                    break;
                }
            }
            consumed += 1;
        }
        let table = self.vertical_table(pairs)?;
        Some((table, consumed))
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(&TableConfig::default())
    }
}

/// Keep candidates relevant to one block.
///
/// A candidate whose value occurs in the block text is kept as is. Otherwise
/// provider-specific fields are dropped and the rest are kept at
/// `out_of_block_scale` times their confidence.
pub fn filter_for_block(candidates: &TableCandidates, block_text: &str, out_of_block_scale: f64) -> TableCandidates {
    let block_lower = block_text.to_lowercase();
    candidates
        .iter()
        .filter_map(|(field, list)| {
            let kept: Vec<ExtractionCandidate> = list
                .iter()
                .filter_map(|c| {
                    if block_lower.contains(&c.value.to_lowercase()) {
                        Some(c.clone())
                    } else if !field.is_provider_specific() {
                        Some(c.scaled(out_of_block_scale))
                    } else {
                        None
                    }
                })
                .collect();
            (!kept.is_empty()).then_some((*field, kept))
        })
        .collect()
}

/// Append `extra` candidates after `base`'s, field by field. A value already
/// present for the field (ignoring case) is skipped.
pub fn merge_candidates(base: &mut TableCandidates, extra: TableCandidates) {
    for (field, list) in extra {
        let existing = base.entry(field).or_default();
        for candidate in list {
            if !existing.iter().any(|c| c.value.eq_ignore_ascii_case(&candidate.value)) {
                existing.push(candidate);
            }
        }
    }
}

/// Two or more header indicator words plus a detectable separator
pub fn looks_like_table_header(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    let lower = line.to_lowercase();
    let indicators = HEADER_INDICATORS.iter().filter(|w| lower.contains(*w)).count();
    indicators >= 2 && Separator::detect(line).is_some()
}

fn looks_like_vertical_start(lines: &[&str], start: usize) -> bool {
    let Some((label, _)) = lines.get(start).and_then(|l| split_label(l.trim())) else {
        return false;
    };
    if !has_field_indicator(&label) {
        return false;
    }
    let end = (start + VERTICAL_LOOKAHEAD).min(lines.len());
    let mut pairs = 1;
    for line in &lines[start + 1..end] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match split_label(line) {
            Some((label, _)) => {
                if has_field_indicator(&label) {
                    pairs += 1;
                }
            }
            None => break,
        }
    }
    pairs >= 2
}

/// `Label: value` split on the first colon; a leading `-` bullet is dropped
fn split_label(line: &str) -> Option<(String, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim();
    let label = label.strip_prefix('-').unwrap_or(label).trim();
    Some((label.to_string(), value.trim()))
}

fn has_field_indicator(label: &str) -> bool {
    let lower = label.to_lowercase();
    FIELD_INDICATORS.iter().any(|w| lower.contains(w))
}

fn has_space_run(line: &str) -> bool {
    line.as_bytes().windows(2).any(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace())
}

fn split_on_space_runs(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j - i >= 2 {
                parts.push(&line[start..i]);
                start = j;
            }
            i = j;
        } else {
            i += 1;
        }
    }
    parts.push(&line[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> TableExtractor {
        TableExtractor::default()
    }

    fn headers(hs: &[&str]) -> Vec<String> {
        hs.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_merge_skips_repeated_values() {
        let mut base = TableCandidates::new();
        base.insert(
            TableField::Npi,
            vec![ExtractionCandidate::new("1234567893", 1.0, "table_row_0_col_1")],
        );
        let mut extra = TableCandidates::new();
        extra.insert(
            TableField::Npi,
            vec![
                ExtractionCandidate::new("1234567893", 0.75, "table_row_0_col_1"),
                ExtractionCandidate::new("1245319599", 0.75, "table_row_1_col_1"),
            ],
        );
        extra.insert(TableField::Tin, vec![ExtractionCandidate::new("12-3456789", 0.75, "t")]);

        merge_candidates(&mut base, extra);
        let npis: Vec<_> = base[&TableField::Npi].iter().map(|c| c.value.as_str()).collect();
        assert_eq!(npis, vec!["1234567893", "1245319599"]);
        assert_eq!(base[&TableField::Npi][0].confidence, 1.0);
        assert_eq!(base[&TableField::Tin].len(), 1);
    }

    #[test]
    fn test_header_mapping() {
        let ex = extractor();
        assert_eq!(ex.map_header("Doctor Name").map(|(f, _)| f), Some(TableField::ProviderName));
        assert_eq!(ex.map_header("Tax ID").map(|(f, _)| f), Some(TableField::Tin));
        assert_eq!(ex.map_header("Notes"), None);
        assert_eq!(ex.map_header("Group NPI").map(|(f, _)| f), Some(TableField::Npi));
        assert_eq!(ex.map_header("Efective Date").map(|(f, _)| f), Some(TableField::EffectiveDate));
        assert_eq!(ex.map_header("  "), None);
    }

    #[test]
    fn test_text_table_pipe() {
        let text = "Please add:\nProvider Name | NPI | Specialty | Notes\nJohn Smith | 1234567893 | Cardiology | new\nJane Doe | 1245319599 | Dermatology\n\nThanks";
        let tables = extractor().extract_from_text_table(text);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["Jane Doe", "1245319599", "Dermatology", ""]);
        assert_eq!(table.header_mappings.len(), 3);
        assert!((table.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_text_table_spaces() {
        let text = "Provider Name    NPI\nJohn Smith    1234567893";
        let tables = extractor().extract_from_text_table(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["John Smith", "1234567893"]);
    }

    #[test]
    fn test_vertical_text_table() {
        let text = "Details below\n- Provider Name: John Smith\nNPI: 1234567893\n\nTIN: 12-3456789\nComments: none\nSpecialty: Cardiology";
        let tables = extractor().extract_from_text_table(text);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.headers, headers(&["Provider Name", "NPI", "TIN"]));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.confidence, 1.0);
    }

    #[test]
    fn test_single_label_is_not_a_table() {
        let text = "Please terminate Dr. John Smith, NPI 1234567893. Reason: retirement.";
        assert!(extractor().extract_from_text_table(text).is_empty());
    }

    #[test]
    fn test_html_horizontal_and_vertical() {
        let html = "<table><tr><th>Provider Name</th><th>NPI</th><th>Notes</th></tr>\
                    <tr><td>John Smith</td><td>1234567893</td><td>x</td></tr></table>\
                    <table><tr><td>Provider</td><td>Jane Doe</td></tr>\
                    <tr><td>NPI</td><td>1245319599</td></tr>\
                    <tr><td>Remarks</td><td>none</td></tr></table>";
        let tables = extractor().extract_from_html_table(html);
        assert_eq!(tables.len(), 2);
        assert!((tables[0].confidence - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(tables[1].headers, headers(&["Provider", "NPI"]));
        assert_eq!(tables[1].rows, vec![vec!["Jane Doe".to_string(), "1245319599".to_string()]]);
        assert_eq!(tables[1].confidence, 1.0);
    }

    #[test]
    fn test_candidates_skip_empty_cells() {
        let ex = extractor();
        let table = TableData {
            headers: headers(&["Provider Name", "NPI", "Group NPI"]),
            rows: vec![vec!["John Smith".into(), "".into(), "1245319599".into()]],
            header_mappings: ex.map_headers_to_fields(&headers(&["Provider Name", "NPI", "Group NPI"])),
            confidence: 1.0,
        };
        let candidates = ex.extract_candidates_from_tables(&[table]);
        assert_eq!(candidates[&TableField::ProviderName][0].value, "John Smith");
        assert_eq!(candidates[&TableField::Npi].len(), 1);
        assert_eq!(candidates[&TableField::Npi][0].extractor_id, "table_row_0_col_2");
        assert_eq!(candidates[&TableField::Npi][0].context, "Table row 1");
    }

    #[test]
    fn test_filter_for_block() {
        let mut candidates = TableCandidates::new();
        candidates.insert(
            TableField::ProviderName,
            vec![
                ExtractionCandidate::new("John Smith", 0.8, "t0"),
                ExtractionCandidate::new("Jane Doe", 0.8, "t1"),
            ],
        );
        candidates.insert(TableField::Tin, vec![ExtractionCandidate::new("12-3456789", 1.0, "t2")]);

        let filtered = filter_for_block(&candidates, "Provider: JOHN SMITH\nNPI 1234567893", 0.6);
        assert_eq!(filtered[&TableField::ProviderName].len(), 1);
        assert_eq!(filtered[&TableField::ProviderName][0].value, "John Smith");
        assert!((filtered[&TableField::Tin][0].confidence - 0.6).abs() < 1e-9);

        let none = filter_for_block(&candidates, "nothing relevant", 0.6);
        assert!(!none.contains_key(&TableField::ProviderName));
    }

    #[test]
    fn test_split_on_space_runs() {
        assert_eq!(split_on_space_runs("a b  c\t\td"), vec!["a b", "c", "d"]);
    }
}
