//! Table module - detected tables and their canonical field keys

use std::collections::BTreeMap;
use std::fmt;

/// Canonical field a table column (or vertical row label) can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableField {
    /// Provider name
    ProviderName,
    /// NPI (individual or group)
    Npi,
    /// Tax id
    Tin,
    /// Specialty
    Specialty,
    /// State license
    License,
    /// Organization / group name
    Organization,
    /// Phone
    Phone,
    /// Fax
    Fax,
    /// Address
    Address,
    /// PPG id
    Ppg,
    /// Effective date
    EffectiveDate,
    /// Term date
    TermDate,
    /// Term reason
    TermReason,
    /// Provider type
    ProviderType,
    /// Line of business
    Lob,
    /// Unqualified date column
    Date,
}

impl TableField {
    /// Every field, in header-matching order
    pub const ALL: [TableField; 16] = [
        TableField::ProviderName,
        TableField::Npi,
        TableField::Tin,
        TableField::Specialty,
        TableField::License,
        TableField::Organization,
        TableField::Phone,
        TableField::Fax,
        TableField::Address,
        TableField::Ppg,
        TableField::EffectiveDate,
        TableField::TermDate,
        TableField::TermReason,
        TableField::ProviderType,
        TableField::Lob,
        TableField::Date,
    ];

    /// Snake-case key
    pub fn as_str(&self) -> &'static str {
        match self {
            TableField::ProviderName => "provider_name",
            TableField::Npi => "npi",
            TableField::Tin => "tin",
            TableField::Specialty => "specialty",
            TableField::License => "license",
            TableField::Organization => "organization",
            TableField::Phone => "phone",
            TableField::Fax => "fax",
            TableField::Address => "address",
            TableField::Ppg => "ppg",
            TableField::EffectiveDate => "effective_date",
            TableField::TermDate => "term_date",
            TableField::TermReason => "term_reason",
            TableField::ProviderType => "provider_type",
            TableField::Lob => "lob",
            TableField::Date => "date",
        }
    }

    /// Parse a snake-case key
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// Fields whose values identify one provider rather than the whole email.
    ///
    /// Out-of-block candidates for these fields are dropped; other fields
    /// survive at reduced confidence.
    pub fn is_provider_specific(&self) -> bool {
        matches!(
            self,
            TableField::ProviderName
                | TableField::Npi
                | TableField::Specialty
                | TableField::License
                | TableField::Phone
                | TableField::Fax
                | TableField::Ppg
                | TableField::Organization
        )
    }
}

impl fmt::Display for TableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected table.
///
/// Vertical (label: value) tables are stored as a single data row whose
/// headers are the labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    /// Raw header strings
    pub headers: Vec<String>,

    /// Data rows, each padded to the header count
    pub rows: Vec<Vec<String>>,

    /// Column index to canonical field
    pub header_mappings: BTreeMap<usize, TableField>,

    /// Fraction of headers mapped, boosted for vertical tables
    pub confidence: f64,
}

impl TableData {
    /// Columns mapped to a field, in column order
    pub fn columns_for(&self, field: TableField) -> Vec<usize> {
        self.header_mappings
            .iter()
            .filter(|(_, f)| **f == field)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_specific_split() {
        let specific: Vec<_> = TableField::ALL
            .into_iter()
            .filter(|f| f.is_provider_specific())
            .map(|f| f.as_str())
            .collect();
        assert_eq!(
            specific,
            vec!["provider_name", "npi", "specialty", "license", "organization", "phone", "fax", "ppg"]
        );
        assert!(!TableField::Tin.is_provider_specific());
        assert!(!TableField::Address.is_provider_specific());
    }

    #[test]
    fn test_columns_for() {
        let table = TableData {
            headers: vec!["NPI".into(), "Name".into(), "Group NPI".into()],
            rows: vec![],
            header_mappings: [(0, TableField::Npi), (1, TableField::ProviderName), (2, TableField::Npi)]
                .into_iter()
                .collect(),
            confidence: 1.0,
        };
        assert_eq!(table.columns_for(TableField::Npi), vec![0, 2]);
        assert!(table.columns_for(TableField::Fax).is_empty());
        assert!(table.is_empty());
        assert_eq!(TableField::parse("term_reason"), Some(TableField::TermReason));
    }
}
