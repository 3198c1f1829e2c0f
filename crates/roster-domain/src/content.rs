//! Parsed email content handed to the extraction core

/// Output of the ingestion collaborator.
///
/// `normalized_text` is newline-delimited with tables flattened to
/// pipe-delimited rows. `html_content` is kept for HTML table re-parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    /// Raw plain-text body, if any
    pub text_content: String,

    /// Raw HTML body, if any
    pub html_content: Option<String>,

    /// Normalized text the sectioner and extractors work on
    pub normalized_text: String,
}

impl ParsedContent {
    /// Content from a plain-text body; the body doubles as normalized text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            text_content: text.clone(),
            html_content: None,
            normalized_text: text,
        }
    }

    /// Attach raw HTML
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_content = Some(html.into());
        self
    }

    /// True when there is no text to extract from
    pub fn is_blank(&self) -> bool {
        self.normalized_text.trim().is_empty() && self.text_content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        let content = ParsedContent::from_text("NPI: 1234567893");
        assert_eq!(content.normalized_text, content.text_content);
        assert!(content.html_content.is_none());
        assert!(!content.is_blank());
        assert!(ParsedContent::from_text("  \n ").is_blank());
    }
}
