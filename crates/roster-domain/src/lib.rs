//! Roster Domain Layer
//!
//! This crate contains the data model shared by the roster extraction pipeline.
//! It has ZERO external dependencies and defines the value objects and trait
//! interfaces that the extractor and CLI layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Candidate**: A provisional field value proposed by one extractor, with confidence and provenance
//! - **Block**: A contiguous span of email text believed to describe one provider/transaction
//! - **Table**: A detected table with its header-to-field mapping
//! - **Record**: The final 17-field output row, with a sentinel for absent values
//! - **Entity Recognizer**: The replaceable capability that finds typed entity spans in text
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Plain data and invariants only
//! - Extraction logic lives in `roster-extractor`
//! - Trait definitions for pluggable capabilities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod candidate;
pub mod content;
pub mod entity;
pub mod record;
pub mod table;
pub mod traits;
pub mod transaction;

// Re-exports for convenience
pub use block::{BlockIndicator, ProviderBlock, SharedFields};
pub use candidate::{best_by_confidence, ExtractionCandidate};
pub use content::ParsedContent;
pub use entity::{EntityKind, RecognizedEntity};
pub use record::{OutputField, Record, NOT_FOUND};
pub use table::{TableData, TableField};
pub use traits::EntityRecognizer;
pub use transaction::{TransactionAttribute, TransactionType};
