use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Network tunables (all durations in milliseconds)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "d_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "d_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "d_background_refresh_interval_ms")]
    pub background_refresh_interval_ms: u64,
    /// Tokens expiring sooner than this are refreshed proactively.
    #[serde(default = "d_token_expiry_threshold_ms")]
    pub token_expiry_threshold_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: d_max_retry_attempts(),
            initial_retry_delay_ms: d_initial_retry_delay_ms(),
            background_refresh_interval_ms: d_background_refresh_interval_ms(),
            token_expiry_threshold_ms: d_token_expiry_threshold_ms(),
        }
    }
}

impl NetworkConfig {
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    pub fn background_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.background_refresh_interval_ms)
    }

    pub fn token_expiry_threshold(&self) -> Duration {
        Duration::from_millis(self.token_expiry_threshold_ms)
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_max_retry_attempts() -> u32 {
    3
}
fn d_initial_retry_delay_ms() -> u64 {
    1_000
}
fn d_background_refresh_interval_ms() -> u64 {
    5 * 60 * 1_000
}
fn d_token_expiry_threshold_ms() -> u64 {
    5 * 60 * 1_000
}
