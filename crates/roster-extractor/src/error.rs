//! Error types for the extraction core

use thiserror::Error;

/// Errors raised inside the extraction core.
///
/// None of these reach the caller of `ExtractionEngine::extract_all_fields`;
/// per-field guards log them and treat the call as having produced nothing.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gazetteer table could not be loaded
    #[error("Gazetteer error: {0}")]
    Gazetteer(String),

    /// A dynamically built pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// The entity recognizer failed
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// A table element could not be parsed
    #[error("Table error: {0}")]
    Table(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    Yaml(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<serde_yaml::Error> for ExtractorError {
    fn from(e: serde_yaml::Error) -> Self {
        ExtractorError::Yaml(e.to_string())
    }
}

/// Result alias for the extraction core
pub type Result<T> = std::result::Result<T, ExtractorError>;
