//! Record-level validation against the output column rules

use roster_domain::{OutputField, Record, TransactionAttribute, TransactionType, NOT_FOUND};
use std::collections::BTreeMap;
use std::fmt;

use crate::text::digits;

/// Line-of-business buckets accepted in the output
pub const ALLOWED_LOB: [&str; 3] = ["Medicare", "Medicaid", "Commercial"];

/// One problem found in a record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Value outside the column's allowed set
    NotAllowed {
        /// Offending value
        value: String,
        /// Accepted values
        allowed: Vec<&'static str>,
    },

    /// Field must be present for this transaction type
    Required {
        /// Transaction type that requires it
        transaction_type: TransactionType,
    },

    /// Wrong number of digits in an identifier
    DigitCount {
        /// Digits required
        expected: usize,
        /// Digits present
        actual: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NotAllowed { value, allowed } => write!(
                f,
                "'{}' is not an allowed value. Must be one of: {}",
                value,
                allowed.join(", ")
            ),
            ValidationIssue::Required { transaction_type } => {
                write!(f, "Field is required when Transaction Type is '{}'", transaction_type)
            }
            ValidationIssue::DigitCount { expected, actual } => {
                write!(f, "must be {} digits, got {}", expected, actual)
            }
        }
    }
}

/// Issues grouped by field, in export order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: BTreeMap<OutputField, Vec<ValidationIssue>>,
}

impl ValidationReport {
    /// No issues at all
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Total number of issues
    pub fn len(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    /// Whether the report holds no issues
    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }

    /// Issues for one field
    pub fn issues_for(&self, field: OutputField) -> &[ValidationIssue] {
        self.issues.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every (field, issue) pair
    pub fn iter(&self) -> impl Iterator<Item = (OutputField, &ValidationIssue)> {
        self.issues
            .iter()
            .flat_map(|(field, issues)| issues.iter().map(move |issue| (*field, issue)))
    }

    fn push(&mut self, field: OutputField, issue: ValidationIssue) {
        self.issues.entry(field).or_default().push(issue);
    }
}

/// Checks a finished record; never alters it
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator;

impl RecordValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    /// Validate every column of `record`
    pub fn validate(&self, record: &Record) -> ValidationReport {
        let mut report = ValidationReport::default();
        let transaction_type = TransactionType::parse(record.get(OutputField::TransactionType));

        if let Some(value) = found(record, OutputField::TransactionType) {
            if transaction_type.is_none() {
                report.push(
                    OutputField::TransactionType,
                    ValidationIssue::NotAllowed {
                        value: value.to_string(),
                        allowed: vec!["Add", "Update", "Term"],
                    },
                );
            }
        }

        if let Some(value) = found(record, OutputField::TransactionAttribute) {
            let allowed: Vec<&'static str> = TransactionAttribute::ALL.iter().map(|a| a.as_str()).collect();
            if !allowed.contains(&value) {
                report.push(
                    OutputField::TransactionAttribute,
                    ValidationIssue::NotAllowed {
                        value: value.to_string(),
                        allowed,
                    },
                );
            }
        }

        if let Some(value) = found(record, OutputField::LineOfBusiness) {
            for lob in value.split(',').map(str::trim).filter(|l| !l.is_empty()) {
                if !ALLOWED_LOB.contains(&lob) {
                    report.push(
                        OutputField::LineOfBusiness,
                        ValidationIssue::NotAllowed {
                            value: lob.to_string(),
                            allowed: ALLOWED_LOB.to_vec(),
                        },
                    );
                }
            }
        }

        if transaction_type == Some(TransactionType::Term) {
            for field in [OutputField::TermDate, OutputField::TermReason] {
                if !record.is_found(field) {
                    report.push(
                        field,
                        ValidationIssue::Required {
                            transaction_type: TransactionType::Term,
                        },
                    );
                }
            }
        }

        for (field, expected) in [
            (OutputField::ProviderNpi, 10),
            (OutputField::GroupNpi, 10),
            (OutputField::Tin, 9),
        ] {
            if let Some(value) = found(record, field) {
                let actual = digits(value).len();
                if actual != expected {
                    report.push(field, ValidationIssue::DigitCount { expected, actual });
                }
            }
        }

        report
    }
}

fn found(record: &Record, field: OutputField) -> Option<&str> {
    let value = record.get(field).trim();
    (value != NOT_FOUND).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_is_clean() {
        assert!(RecordValidator::new().validate(&Record::new()).is_clean());
    }

    #[test]
    fn test_allowed_values() {
        let mut record = Record::new();
        record.set(OutputField::TransactionType, "Delete");
        record.set(OutputField::TransactionAttribute, "Hours");
        record.set(OutputField::LineOfBusiness, "Medicare, Vision");

        let report = RecordValidator::new().validate(&record);
        assert_eq!(report.len(), 3);
        assert_eq!(
            report.issues_for(OutputField::LineOfBusiness),
            &[ValidationIssue::NotAllowed {
                value: "Vision".to_string(),
                allowed: ALLOWED_LOB.to_vec(),
            }]
        );
    }

    #[test]
    fn test_term_requires_date_and_reason() {
        let mut record = Record::new();
        record.set(OutputField::TransactionType, "Term");
        record.set(OutputField::TermDate, "09/22/2025");

        let report = RecordValidator::new().validate(&record);
        assert!(report.issues_for(OutputField::TermDate).is_empty());
        assert_eq!(
            report.issues_for(OutputField::TermReason),
            &[ValidationIssue::Required {
                transaction_type: TransactionType::Term
            }]
        );
    }

    #[test]
    fn test_identifier_lengths() {
        let mut record = Record::new();
        record.set(OutputField::ProviderNpi, "1234567893");
        record.set(OutputField::GroupNpi, "12345");
        record.set(OutputField::Tin, "12-3456789");

        let report = RecordValidator::new().validate(&record);
        assert_eq!(report.len(), 1);
        let (field, issue) = report.iter().next().unwrap();
        assert_eq!(field, OutputField::GroupNpi);
        assert_eq!(issue.to_string(), "must be 10 digits, got 5");
    }

    #[test]
    fn test_validation_does_not_alter_record() {
        let mut record = Record::new();
        record.set(OutputField::Tin, "123");
        let before = record.clone();
        let _ = RecordValidator::new().validate(&record);
        assert_eq!(record, before);
    }
}
