//! Trait definitions for pluggable capabilities
//!
//! These traits define the boundaries between the extraction core and the
//! engines it drives. Implementations live in `roster-extractor`.

use crate::entity::{EntityKind, RecognizedEntity};

/// Entity-recognition capability
///
/// Implemented by the recognizer back-ends in roster-extractor. The core picks
/// one implementation at construction time and only talks to it through this
/// trait afterwards.
pub trait EntityRecognizer: Send + Sync {
    /// Find typed entity spans in `text`, in order of appearance
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, String>;

    /// Short identifier used in logs and candidate provenance
    fn name(&self) -> &'static str;

    /// Entities of one kind
    fn recognize_kind(&self, text: &str, kind: EntityKind) -> Result<Vec<RecognizedEntity>, String> {
        Ok(self
            .recognize(text)?
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect())
    }
}
