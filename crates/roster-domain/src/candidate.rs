//! Candidate module - provisional field values with provenance

/// A value proposed for one field by one extractor.
///
/// Candidates are ranked, never blended. The only place several candidates are
/// folded into one is an explicit reducer (for example the PPG combiner), which
/// produces a new candidate rather than mutating the inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionCandidate {
    /// Proposed value, already normalized by the producing extractor
    pub value: String,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Provenance tag, e.g. `npi_pattern_2` or `table_row_0_col_1`
    pub extractor_id: String,

    /// Character offset in the source text, -1 when unknown
    pub position: i64,

    /// Short surrounding snippet kept for audit
    pub context: String,

    /// Whether a format/checksum validation passed
    pub validation_passed: bool,
}

impl ExtractionCandidate {
    /// Create a candidate with no position or context.
    pub fn new(value: impl Into<String>, confidence: f64, extractor_id: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            extractor_id: extractor_id.into(),
            position: -1,
            context: String::new(),
            validation_passed: false,
        }
    }

    /// Set the source offset.
    pub fn at(mut self, position: usize) -> Self {
        self.position = i64::try_from(position).unwrap_or(i64::MAX);
        self
    }

    /// Set the audit snippet.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Record the outcome of format validation.
    pub fn validated(mut self, passed: bool) -> Self {
        self.validation_passed = passed;
        self
    }

    /// Copy of this candidate with its confidence multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            confidence: (self.confidence * factor).clamp(0.0, 1.0),
            ..self.clone()
        }
    }

    /// Position as an offset, if known.
    pub fn offset(&self) -> Option<usize> {
        usize::try_from(self.position).ok()
    }
}

/// Pick the first candidate with the highest confidence.
///
/// Ties keep the earlier candidate, so discovery order breaks ties.
pub fn best_by_confidence(candidates: &[ExtractionCandidate]) -> Option<&ExtractionCandidate> {
    candidates.iter().fold(None, |best: Option<&ExtractionCandidate>, c| match best {
        Some(b) if b.confidence >= c.confidence => Some(b),
        _ => Some(c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let c = ExtractionCandidate::new("1234567893", 0.9, "npi_pattern_0");
        assert_eq!(c.position, -1);
        assert!(c.context.is_empty());
        assert!(!c.validation_passed);
        assert_eq!(c.offset(), None);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let c = ExtractionCandidate::new("x", 1.7, "t");
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_scaled_copy_leaves_original() {
        let c = ExtractionCandidate::new("12-3456789", 0.8, "table_row_0_col_2").at(0);
        let s = c.scaled(0.6);
        assert!((s.confidence - 0.48).abs() < 1e-9);
        assert_eq!(c.confidence, 0.8);
        assert_eq!(s.extractor_id, c.extractor_id);
        assert_eq!(s.position, 0);
    }

    #[test]
    fn test_best_by_confidence_prefers_earlier_on_tie() {
        let candidates = vec![
            ExtractionCandidate::new("a", 0.6, "one"),
            ExtractionCandidate::new("b", 0.9, "two"),
            ExtractionCandidate::new("c", 0.9, "three"),
        ];
        assert_eq!(best_by_confidence(&candidates).map(|c| c.value.as_str()), Some("b"));
        assert!(best_by_confidence(&[]).is_none());
    }
}
