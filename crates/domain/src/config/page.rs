use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Page sync agent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Match pattern for spreadsheet editor pages.  `*` matches any run of
    /// characters; everything else is literal.
    #[serde(default = "d_document_url_pattern")]
    pub document_url_pattern: String,
    /// Path segment that precedes the document id (`/spreadsheets/d/<id>/edit`).
    #[serde(default = "d_id_path_marker")]
    pub id_path_marker: String,
    /// Suffix the spreadsheet service appends to every tab title.
    #[serde(default = "d_title_suffix")]
    pub title_suffix: String,
    /// Wait after a navigation before re-reading the page.
    #[serde(default = "d_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            document_url_pattern: d_document_url_pattern(),
            id_path_marker: d_id_path_marker(),
            title_suffix: d_title_suffix(),
            settle_delay_ms: d_settle_delay_ms(),
        }
    }
}

impl PageConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Compile [`document_url_pattern`](Self::document_url_pattern) into an
    /// anchored regex.
    pub fn document_regex(&self) -> Result<Regex, regex::Error> {
        let body = self
            .document_url_pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^{body}$"))
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_document_url_pattern() -> String {
    "https://docs.google.com/spreadsheets/*".into()
}
fn d_id_path_marker() -> String {
    "d".into()
}
fn d_title_suffix() -> String {
    " - Google Sheets".into()
}
fn d_settle_delay_ms() -> u64 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_editor_urls() {
        let re = PageConfig::default().document_regex().unwrap();
        assert!(re.is_match("https://docs.google.com/spreadsheets/d/1A2B3C/edit"));
        assert!(re.is_match("https://docs.google.com/spreadsheets/u/0/"));
        assert!(!re.is_match("https://docs.google.com/document/d/1A2B3C/edit"));
        assert!(!re.is_match("http://docs.google.com/spreadsheets/d/1A2B3C/edit"));
    }

    #[test]
    fn pattern_literals_are_escaped() {
        let cfg = PageConfig {
            document_url_pattern: "https://example.com/a.b/*".into(),
            ..Default::default()
        };
        let re = cfg.document_regex().unwrap();
        assert!(re.is_match("https://example.com/a.b/x"));
        assert!(!re.is_match("https://example.com/aXb/x"));
    }

    #[test]
    fn settle_delay_default_is_one_second() {
        assert_eq!(PageConfig::default().settle_delay(), Duration::from_secs(1));
    }
}
