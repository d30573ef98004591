use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// API endpoints
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Base URLs of the spreadsheet service consumed by the background process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "d_sheets_base_url")]
    pub sheets_base_url: String,
    #[serde(default = "d_drive_base_url")]
    pub drive_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            sheets_base_url: d_sheets_base_url(),
            drive_base_url: d_drive_base_url(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_sheets_base_url() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".into()
}
fn d_drive_base_url() -> String {
    "https://www.googleapis.com/drive/v3".into()
}
