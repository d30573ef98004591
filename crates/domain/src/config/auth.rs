use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Auth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// How long a fetched OAuth token is reused, in seconds.
    #[serde(default = "d_token_cache_duration_secs")]
    pub token_cache_duration_secs: u64,
    /// OAuth scope URIs requested by the background process.
    #[serde(default = "d_scopes")]
    pub scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_cache_duration_secs: d_token_cache_duration_secs(),
            scopes: d_scopes(),
        }
    }
}

impl AuthConfig {
    pub fn token_cache_duration(&self) -> Duration {
        Duration::from_secs(self.token_cache_duration_secs)
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_token_cache_duration_secs() -> u64 {
    3_600
}
fn d_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/spreadsheets".into(),
        "https://www.googleapis.com/auth/drive.file".into(),
    ]
}
