//! Recognize spreadsheet editor pages and pull the document id out of their URL.

use ap_domain::config::PageConfig;
use regex::Regex;

use crate::types::AgentError;

/// Compiled form of [`PageConfig`].
#[derive(Debug, Clone)]
pub struct DocumentMatcher {
    pattern: Regex,
    marker: String,
    title_suffix: String,
}

impl DocumentMatcher {
    pub fn new(config: &PageConfig) -> Result<Self, AgentError> {
        let pattern = config
            .document_regex()
            .map_err(|e| AgentError::Config(format!("document_url_pattern: {e}")))?;
        if config.id_path_marker.is_empty() {
            return Err(AgentError::Config("id_path_marker must not be empty".into()));
        }
        Ok(Self {
            pattern,
            marker: config.id_path_marker.clone(),
            title_suffix: config.title_suffix.clone(),
        })
    }

    /// Whether `url` is a spreadsheet editor page.
    pub fn is_document_page(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// The path segment right after the marker, e.g. `1A2B3C` in
    /// `/spreadsheets/d/1A2B3C/edit`.  `None` if the URL does not parse, the
    /// marker is missing or last, or the following segment is empty.
    pub fn extract_id(&self, url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let mut segments = parsed.path_segments()?;
        segments.find(|s| *s == self.marker)?;
        match segments.next() {
            Some(id) if !id.is_empty() => Some(id.to_owned()),
            _ => None,
        }
    }

    /// `title` without the service suffix.  Titles without the suffix are
    /// returned unchanged.
    pub fn strip_title<'a>(&self, title: &'a str) -> &'a str {
        if self.title_suffix.is_empty() {
            return title;
        }
        title.strip_suffix(self.title_suffix.as_str()).unwrap_or(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> DocumentMatcher {
        DocumentMatcher::new(&PageConfig::default()).unwrap()
    }

    #[test]
    fn extracts_id_after_marker() {
        let m = matcher();
        assert_eq!(
            m.extract_id("https://docs.google.com/spreadsheets/d/1A2B3C/edit").as_deref(),
            Some("1A2B3C")
        );
        assert_eq!(
            m.extract_id("https://docs.google.com/spreadsheets/d/1A2B3C").as_deref(),
            Some("1A2B3C")
        );
        assert_eq!(
            m.extract_id("https://docs.google.com/spreadsheets/d/abc_-XYZ/edit?gid=0#gid=0")
                .as_deref(),
            Some("abc_-XYZ")
        );
    }

    #[test]
    fn multi_account_paths_still_extract() {
        assert_eq!(
            matcher()
                .extract_id("https://docs.google.com/spreadsheets/u/1/d/9Z8Y/edit")
                .as_deref(),
            Some("9Z8Y")
        );
    }

    #[test]
    fn missing_marker_yields_none() {
        let m = matcher();
        assert_eq!(m.extract_id("https://docs.google.com/spreadsheets/u/0/"), None);
        assert_eq!(m.extract_id("https://docs.google.com/spreadsheets/create"), None);
    }

    #[test]
    fn marker_as_last_segment_yields_none() {
        let m = matcher();
        assert_eq!(m.extract_id("https://docs.google.com/spreadsheets/d"), None);
        assert_eq!(m.extract_id("https://docs.google.com/spreadsheets/d/"), None);
    }

    #[test]
    fn marker_must_be_a_whole_segment() {
        assert_eq!(
            matcher().extract_id("https://docs.google.com/spreadsheets/dd/1A2B3C/edit"),
            None
        );
    }

    #[test]
    fn unparseable_url_yields_none() {
        assert_eq!(matcher().extract_id("not a url"), None);
    }

    #[test]
    fn document_page_detection() {
        let m = matcher();
        assert!(m.is_document_page("https://docs.google.com/spreadsheets/d/1A2B3C/edit"));
        assert!(!m.is_document_page("https://mail.google.com/mail/u/0/"));
    }

    #[test]
    fn strips_service_suffix() {
        let m = matcher();
        assert_eq!(m.strip_title("Acme FY25 - Google Sheets"), "Acme FY25");
        assert_eq!(m.strip_title("Untitled"), "Untitled");
    }

    #[test]
    fn rejects_empty_marker() {
        let cfg = PageConfig {
            id_path_marker: String::new(),
            ..Default::default()
        };
        assert!(DocumentMatcher::new(&cfg).is_err());
    }
}
