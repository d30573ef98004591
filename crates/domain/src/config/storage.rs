use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Extension-local storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Namespace prepended by [`Config::full_storage_key`](super::Config::full_storage_key).
    #[serde(default = "d_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub keys: StorageKeys,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: d_prefix(),
            keys: StorageKeys::default(),
        }
    }
}

/// Key names shared by every component that touches extension storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "d_auth_token")]
    pub auth_token: String,
    /// Written by the page agent each time a document id is detected.
    #[serde(default = "d_current_spreadsheet_id")]
    pub current_spreadsheet_id: String,
    #[serde(default = "d_recent_spreadsheets")]
    pub recent_spreadsheets: String,
    #[serde(default = "d_user_preferences")]
    pub user_preferences: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            auth_token: d_auth_token(),
            current_spreadsheet_id: d_current_spreadsheet_id(),
            recent_spreadsheets: d_recent_spreadsheets(),
            user_preferences: d_user_preferences(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_prefix() -> String {
    "account_planner_".into()
}
fn d_auth_token() -> String {
    "authToken".into()
}
fn d_current_spreadsheet_id() -> String {
    "currentSpreadsheetId".into()
}
fn d_recent_spreadsheets() -> String {
    "recentSpreadsheets".into()
}
fn d_user_preferences() -> String {
    "userPreferences".into()
}
