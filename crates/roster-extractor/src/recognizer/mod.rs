//! Entity recognizer back-ends
//!
//! Two implementations of [`EntityRecognizer`]:
//!
//! - [`HeuristicRecognizer`]: structural recognizer over capitalisation and
//!   punctuation, anchored by the gazetteer's organization types and
//!   specialty names
//! - [`PatternRecognizer`]: regex-only fallback for titled names, month-name
//!   dates and `<Name> <organization alias>` organizations
//!
//! [`build_recognizer`] picks one at construction time; callers only see the
//! trait object afterwards.

mod heuristic;
mod pattern;

pub use heuristic::HeuristicRecognizer;
pub use pattern::{PatternRecognizer, PATTERN_RECOGNIZER_NAME};

use roster_domain::{EntityRecognizer, RecognizedEntity};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::RecognizerKind;
use crate::gazetteer::Gazetteer;

/// Build the recognizer selected by `kind`.
///
/// The heuristic back-end needs organization types to anchor ORG spans; with
/// none configured it degrades to the pattern back-end.
pub fn build_recognizer(kind: RecognizerKind, gazetteer: &Arc<Gazetteer>) -> Box<dyn EntityRecognizer> {
    match kind {
        RecognizerKind::Heuristic if gazetteer.organization_types().is_empty() => {
            warn!("No organization types loaded; falling back to the pattern recognizer");
            Box::new(PatternRecognizer::new(gazetteer))
        }
        RecognizerKind::Heuristic => {
            debug!("Using heuristic entity recognizer");
            Box::new(HeuristicRecognizer::new(gazetteer))
        }
        RecognizerKind::Pattern => {
            debug!("Using pattern entity recognizer");
            Box::new(PatternRecognizer::new(gazetteer))
        }
    }
}

/// Whether `[start, end)` overlaps any entity already kept
pub(crate) fn overlaps_any(entities: &[RecognizedEntity], start: usize, end: usize) -> bool {
    entities.iter().any(|e| start < e.end && e.start < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_selects_backend() {
        let gazetteer = Arc::new(Gazetteer::builtin());
        assert_eq!(build_recognizer(RecognizerKind::Heuristic, &gazetteer).name(), "heuristic");
        assert_eq!(build_recognizer(RecognizerKind::Pattern, &gazetteer).name(), "pattern");
    }

    #[test]
    fn test_heuristic_degrades_without_org_types() {
        let builtin = Gazetteer::builtin();
        let gazetteer = Arc::new(Gazetteer::from_parts(
            builtin.specialties().to_vec(),
            builtin.lob_variants().to_vec(),
            Vec::new(),
        ));
        assert_eq!(build_recognizer(RecognizerKind::Heuristic, &gazetteer).name(), "pattern");
    }
}
