//! Record module - the fixed 17-field output row

use std::collections::BTreeMap;
use std::fmt;

/// Sentinel written into every field that no extractor resolved.
pub const NOT_FOUND: &str = "Information not found";

/// The canonical output columns, declared in export order.
///
/// The derived `Ord` follows declaration order, so any ordered map keyed by
/// `OutputField` iterates in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputField {
    /// Add / Update / Term
    TransactionType,
    /// Which provider attribute the transaction changes
    TransactionAttribute,
    /// Date the change takes effect
    EffectiveDate,
    /// Date a termination takes effect
    TermDate,
    /// Why the provider is terminated
    TermReason,
    /// Provider full name
    ProviderName,
    /// Individual NPI
    ProviderNpi,
    /// Provider specialty
    ProviderSpecialty,
    /// State medical license
    StateLicense,
    /// Practice or medical group name
    OrganizationName,
    /// Tax identification number
    Tin,
    /// Group NPI (second NPI found)
    GroupNpi,
    /// Practice address
    CompleteAddress,
    /// Phone number
    PhoneNumber,
    /// Fax number
    FaxNumber,
    /// Provider practice group id(s)
    PpgId,
    /// Line(s) of business
    LineOfBusiness,
}

impl OutputField {
    /// Every field, in export order
    pub const ALL: [OutputField; 17] = [
        OutputField::TransactionType,
        OutputField::TransactionAttribute,
        OutputField::EffectiveDate,
        OutputField::TermDate,
        OutputField::TermReason,
        OutputField::ProviderName,
        OutputField::ProviderNpi,
        OutputField::ProviderSpecialty,
        OutputField::StateLicense,
        OutputField::OrganizationName,
        OutputField::Tin,
        OutputField::GroupNpi,
        OutputField::CompleteAddress,
        OutputField::PhoneNumber,
        OutputField::FaxNumber,
        OutputField::PpgId,
        OutputField::LineOfBusiness,
    ];

    /// Canonical column header
    pub fn header(&self) -> &'static str {
        match self {
            OutputField::TransactionType => "Transaction Type (Add/Update/Term)",
            OutputField::TransactionAttribute => "Transaction Attribute",
            OutputField::EffectiveDate => "Effective Date",
            OutputField::TermDate => "Term Date",
            OutputField::TermReason => "Term Reason",
            OutputField::ProviderName => "Provider Name",
            OutputField::ProviderNpi => "Provider NPI",
            OutputField::ProviderSpecialty => "Provider Specialty",
            OutputField::StateLicense => "State License",
            OutputField::OrganizationName => "Organization Name",
            OutputField::Tin => "TIN",
            OutputField::GroupNpi => "Group NPI",
            OutputField::CompleteAddress => "Complete Address",
            OutputField::PhoneNumber => "Phone Number",
            OutputField::FaxNumber => "Fax Number",
            OutputField::PpgId => "PPG ID",
            OutputField::LineOfBusiness => "Line Of Business (Medicare/Commercial/Medical)",
        }
    }

    /// Look up a field by its canonical header
    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.header() == header)
    }
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One resolved output row.
///
/// A record always holds all 17 fields. Construction fills every field with
/// [`NOT_FOUND`] and there is no way to remove a key afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: BTreeMap<OutputField, String>,
}

impl Record {
    /// Create an all-sentinel record
    pub fn new() -> Self {
        Self {
            values: OutputField::ALL
                .into_iter()
                .map(|f| (f, NOT_FOUND.to_string()))
                .collect(),
        }
    }

    /// Current value of a field
    pub fn get(&self, field: OutputField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or(NOT_FOUND)
    }

    /// Overwrite a field. An empty value is stored as the sentinel.
    pub fn set(&mut self, field: OutputField, value: impl Into<String>) {
        let value = value.into();
        let value = if value.trim().is_empty() {
            NOT_FOUND.to_string()
        } else {
            value
        };
        self.values.insert(field, value);
    }

    /// Reset a field to the sentinel
    pub fn clear(&mut self, field: OutputField) {
        self.values.insert(field, NOT_FOUND.to_string());
    }

    /// Whether a field holds a real value
    pub fn is_found(&self, field: OutputField) -> bool {
        self.get(field) != NOT_FOUND
    }

    /// Number of fields holding a real value
    pub fn found_count(&self) -> usize {
        OutputField::ALL.iter().filter(|f| self.is_found(**f)).count()
    }

    /// Fields and values in export order
    pub fn iter(&self) -> impl Iterator<Item = (OutputField, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Header/value pairs in export order
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.iter().map(|(f, v)| (f.header(), v.to_string())).collect()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: no sequence of writes removes a key
        #[test]
        fn test_record_always_has_seventeen_keys(
            writes in prop::collection::vec((0usize..17, ".{0,20}"), 0..40)
        ) {
            let mut record = Record::new();
            for (idx, value) in writes {
                let field = OutputField::ALL[idx];
                if value.len() % 3 == 0 {
                    record.clear(field);
                } else {
                    record.set(field, value);
                }
            }
            prop_assert_eq!(record.iter().count(), 17);
            prop_assert!(record.iter().all(|(_, v)| !v.trim().is_empty()));
        }
    }
}
