//! Email body loading and engine setup.

use crate::config::Config;
use crate::error::{CliError, Result};
use roster_domain::ParsedContent;
use roster_extractor::html::html_to_text;
use roster_extractor::{ExtractionEngine, ExtractorConfig, RecognizerKind};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extractor choices gathered from flags and the settings file.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Extractor config file
    pub config_file: Option<PathBuf>,
    /// Preset used when there is no config file
    pub preset: Option<ExtractorConfig>,
    /// Gazetteer directory override
    pub gazetteer_dir: Option<PathBuf>,
    /// Recognizer override
    pub recognizer: Option<RecognizerKind>,
}

impl EngineOptions {
    /// Fill unset options from the CLI settings file.
    pub fn with_defaults(mut self, config: &Config) -> Self {
        if self.config_file.is_none() {
            self.config_file = config.extractor.config_file.clone();
        }
        if self.gazetteer_dir.is_none() {
            self.gazetteer_dir = config.extractor.gazetteer_dir.clone();
        }
        self
    }

    /// Resolve the effective extractor configuration.
    pub fn resolve(&self) -> Result<ExtractorConfig> {
        let mut config = match (&self.config_file, &self.preset) {
            (Some(path), _) => ExtractorConfig::from_file(path)?,
            (None, Some(preset)) => preset.clone(),
            (None, None) => ExtractorConfig::default(),
        };
        if let Some(dir) = &self.gazetteer_dir {
            config.gazetteer_dir = Some(dir.clone());
        }
        if let Some(kind) = self.recognizer {
            config.entities.recognizer = kind;
        }
        config.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Build an engine from the effective configuration.
    pub fn build_engine(&self) -> Result<ExtractionEngine> {
        let config = self.resolve()?;
        debug!("Extractor configuration: {:?}", config);
        Ok(ExtractionEngine::new(config))
    }
}

/// Whether a path names an HTML body.
pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

/// Read an email body. HTML is kept alongside its flattened text.
pub fn read_email(path: &Path, force_html: bool) -> Result<ParsedContent> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_body(&raw, force_html || is_html_path(path)))
}

/// Turn a raw body into parsed content.
pub fn parse_body(raw: &str, html: bool) -> ParsedContent {
    if html {
        ParsedContent::from_text(html_to_text(raw)).with_html(raw)
    } else {
        ParsedContent::from_text(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_html_detection() {
        assert!(is_html_path(Path::new("mail.HTML")));
        assert!(is_html_path(Path::new("mail.htm")));
        assert!(!is_html_path(Path::new("mail.txt")));
        assert!(!is_html_path(Path::new("mail")));
    }

    #[test]
    fn test_html_body_is_flattened() {
        let content = parse_body("<p>Hello&nbsp;team</p><table><tr><td>NPI</td><td>1234567893</td></tr></table>", true);
        assert!(content.html_content.is_some());
        assert!(content.normalized_text.contains("NPI | 1234567893"));
        assert!(!content.normalized_text.contains('<'));
    }

    #[test]
    fn test_missing_file() {
        let err = read_email(Path::new("/nonexistent/mail.txt"), false).unwrap_err();
        assert!(matches!(err, CliError::Unreadable { .. }));
    }

    #[test]
    fn test_options_resolve_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sectioner]\nmerge_gap_lines = 4").unwrap();

        let options = EngineOptions {
            config_file: Some(file.path().to_path_buf()),
            preset: Some(ExtractorConfig::strict()),
            recognizer: Some(RecognizerKind::Pattern),
            ..EngineOptions::default()
        };
        let config = options.resolve().unwrap();
        assert_eq!(config.sectioner.merge_gap_lines, 4);
        assert_eq!(config.entities.recognizer, RecognizerKind::Pattern);

        let preset_only = EngineOptions {
            preset: Some(ExtractorConfig::lenient()),
            ..EngineOptions::default()
        };
        assert_eq!(preset_only.resolve().unwrap(), ExtractorConfig::lenient());
    }

    #[test]
    fn test_settings_fill_gaps() {
        let mut config = Config::default();
        config.extractor.gazetteer_dir = Some(PathBuf::from("configs"));
        let options = EngineOptions::default().with_defaults(&config);
        assert_eq!(options.gazetteer_dir, Some(PathBuf::from("configs")));
    }
}
