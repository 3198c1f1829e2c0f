//! Entity spans produced by a recognizer

use std::fmt;

/// Entity categories the extraction core consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A person's name
    Person,
    /// An organization name
    Organization,
    /// A calendar date
    Date,
    /// A medical specialty
    Specialty,
}

impl EntityKind {
    /// Conventional upper-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "PERSON",
            EntityKind::Organization => "ORG",
            EntityKind::Date => "DATE",
            EntityKind::Specialty => "SPECIALTY",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed span of text
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedEntity {
    /// Entity category
    pub kind: EntityKind,
    /// Surface text
    pub text: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Recognizer confidence in [0.0, 1.0]
    pub confidence: f64,
}

impl RecognizedEntity {
    /// Create an entity
    pub fn new(kind: EntityKind, text: impl Into<String>, start: usize, end: usize, confidence: f64) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Whether two spans share at least one byte
    pub fn overlaps(&self, other: &RecognizedEntity) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = RecognizedEntity::new(EntityKind::Person, "John Smith", 4, 14, 0.7);
        let b = RecognizedEntity::new(EntityKind::Organization, "Smith Clinic", 9, 21, 0.7);
        let c = RecognizedEntity::new(EntityKind::Date, "09/22/2025", 30, 40, 0.8);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(c.kind.to_string(), "DATE");
    }
}
