//! Post-fusion business rules and record normalization

use roster_domain::{OutputField, Record, TransactionType, NOT_FOUND};

use crate::patterns::{format_phone, normalize_tin};
use crate::text::digits;

/// Upper-case the first letter of every alphabetic run, lower-case the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Transaction type of a record, if it holds one of the three known labels
pub fn transaction_type_of(record: &Record) -> Option<TransactionType> {
    TransactionType::parse(record.get(OutputField::TransactionType))
}

/// Cross-field rules keyed on the transaction type.
///
/// * not Term: Term Date and Term Reason are cleared
/// * Term with no Term Date but an Effective Date: the date moves to Term Date
/// * Term: an unset Transaction Attribute becomes `Provider`
/// * Add: Transaction Attribute is cleared
pub fn apply_business_rules(record: &mut Record) {
    match transaction_type_of(record) {
        Some(TransactionType::Term) => {
            if !record.is_found(OutputField::TermDate) && record.is_found(OutputField::EffectiveDate) {
                let date = record.get(OutputField::EffectiveDate).to_string();
                record.set(OutputField::TermDate, date);
                record.clear(OutputField::EffectiveDate);
            }
            if !record.is_found(OutputField::TransactionAttribute) {
                record.set(OutputField::TransactionAttribute, "Provider");
            }
        }
        other => {
            record.clear(OutputField::TermDate);
            record.clear(OutputField::TermReason);
            if other == Some(TransactionType::Add) {
                record.clear(OutputField::TransactionAttribute);
            }
        }
    }
}

/// Canonical shapes for the numeric fields.
///
/// Phone and fax become `XXX-XXX-XXXX` when they hold exactly 10 digits,
/// NPIs keep digits only, a 9-digit TIN becomes `XX-XXXXXXX`, and PPG keeps
/// alphanumerics, commas and spaces.
pub fn normalize_fields(record: &mut Record) {
    for field in [OutputField::PhoneNumber, OutputField::FaxNumber] {
        if let Some(phone) = found(record, field).and_then(format_phone) {
            record.set(field, phone);
        }
    }

    for field in [OutputField::ProviderNpi, OutputField::GroupNpi] {
        if let Some(value) = found(record, field) {
            let npi = digits(value);
            record.set(field, npi);
        }
    }

    if let Some(tin) = found(record, OutputField::Tin).and_then(normalize_tin) {
        record.set(OutputField::Tin, tin);
    }

    if let Some(value) = found(record, OutputField::PpgId) {
        let ppg: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ',' || *c == ' ')
            .collect();
        record.set(OutputField::PpgId, ppg.trim().to_string());
    }
}

/// Business rules followed by field normalization
pub fn finalize(record: &mut Record) {
    apply_business_rules(record);
    normalize_fields(record);
}

fn found(record: &Record, field: OutputField) -> Option<&str> {
    let value = record.get(field);
    (value != NOT_FOUND).then_some(value)
}
