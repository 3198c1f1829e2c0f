//! Transaction module - roster change types and the attribute they touch

use std::fmt;

/// Kind of roster change an email requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// New provider joining the roster
    Add,

    /// Change to an existing provider's data
    Update,

    /// Provider leaving the roster
    Term,
}

impl TransactionType {
    /// Canonical output spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Add => "Add",
            TransactionType::Update => "Update",
            TransactionType::Term => "Term",
        }
    }

    /// Parse a label case-insensitively ("term", "TERM", "Term")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "add" => Some(TransactionType::Add),
            "update" => Some(TransactionType::Update),
            "term" => Some(TransactionType::Term),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid transaction type: {}", s))
    }
}

/// Which provider attribute a transaction changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionAttribute {
    /// No attribute applies
    NotApplicable,
    /// Practice address
    Address,
    /// Provider specialty
    Specialty,
    /// Phone or fax contact
    PhoneNumber,
    /// Provider practice group
    Ppg,
    /// Line of business
    Lob,
    /// The provider record as a whole
    Provider,
}

impl TransactionAttribute {
    /// All attributes, in scoring order
    pub const ALL: [TransactionAttribute; 7] = [
        TransactionAttribute::NotApplicable,
        TransactionAttribute::Address,
        TransactionAttribute::Specialty,
        TransactionAttribute::PhoneNumber,
        TransactionAttribute::Ppg,
        TransactionAttribute::Lob,
        TransactionAttribute::Provider,
    ];

    /// Canonical output spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionAttribute::NotApplicable => "Not Applicable",
            TransactionAttribute::Address => "Address",
            TransactionAttribute::Specialty => "Specialty",
            TransactionAttribute::PhoneNumber => "Phone Number",
            TransactionAttribute::Ppg => "PPG",
            TransactionAttribute::Lob => "LOB",
            TransactionAttribute::Provider => "Provider",
        }
    }

    /// Parse the canonical spelling
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for TransactionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
