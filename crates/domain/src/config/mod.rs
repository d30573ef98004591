mod api;
mod app;
mod auth;
mod features;
mod network;
mod page;
mod storage;

pub use api::*;
pub use app::*;
pub use auth::*;
pub use features::FeatureFlags;
pub use network::*;
pub use page::*;
pub use storage::*;

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default, deserialize_with = "features::merge_with_defaults")]
    pub features: FeatureFlags,
    #[serde(default)]
    pub page: PageConfig,
}

impl Config {
    /// Parse a TOML document.  Missing tables and fields keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Toml(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Namespaced storage key: the configured prefix followed by `key`.
    pub fn full_storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.storage.prefix)
    }

    /// Whether the named feature flag is on.  Unknown names are off.
    pub fn is_feature_enabled(&self, name: &str) -> bool {
        self.features.is_enabled(name)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Process-wide registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

static REGISTRY: OnceLock<Config> = OnceLock::new();

/// The process-wide configuration.  Falls back to [`Config::default`] when
/// nothing was [`install`]ed before the first read.
pub fn registry() -> &'static Config {
    REGISTRY.get_or_init(Config::default)
}

/// Install the process-wide configuration.  Must run before the first call
/// to [`registry`]; afterwards the registry is frozen and the rejected
/// config is returned.
pub fn install(config: Config) -> std::result::Result<(), Config> {
    REGISTRY.set(config)
}

/// [`Config::full_storage_key`] against the process-wide registry.
pub fn full_storage_key(key: &str) -> String {
    registry().full_storage_key(key)
}

/// [`Config::is_feature_enabled`] against the process-wide registry.
pub fn is_feature_enabled(name: &str) -> bool {
    registry().is_feature_enabled(name)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |severity, field: &str, message: &str| {
            errors.push(ConfigError {
                severity,
                field: field.into(),
                message: message.into(),
            });
        };

        // An empty prefix would collide with keys owned by other extensions.
        if self.storage.prefix.is_empty() {
            push(
                ConfigSeverity::Error,
                "storage.prefix",
                "prefix must not be empty",
            );
        }

        if self.storage.keys.current_spreadsheet_id.is_empty() {
            push(
                ConfigSeverity::Error,
                "storage.keys.current_spreadsheet_id",
                "key must not be empty",
            );
        }

        if self.app.template_sections.is_empty() {
            push(
                ConfigSeverity::Error,
                "app.template_sections",
                "at least one template section is required",
            );
        }

        if self.app.max_recent_items == 0 {
            push(
                ConfigSeverity::Warning,
                "app.max_recent_items",
                "recent documents list is disabled",
            );
        }

        if self.network.max_retry_attempts == 0 {
            push(
                ConfigSeverity::Warning,
                "network.max_retry_attempts",
                "requests will never be retried",
            );
        }

        if self.auth.scopes.is_empty() {
            push(
                ConfigSeverity::Error,
                "auth.scopes",
                "no OAuth scopes configured",
            );
        }

        if let Err(e) = self.page.document_regex() {
            push(
                ConfigSeverity::Error,
                "page.document_url_pattern",
                &format!("invalid pattern: {e}"),
            );
        }

        if self.page.id_path_marker.is_empty() || self.page.id_path_marker.contains('/') {
            push(
                ConfigSeverity::Error,
                "page.id_path_marker",
                "marker must be a single non-empty path segment",
            );
        }

        if self.page.settle_delay_ms == 0 {
            push(
                ConfigSeverity::Warning,
                "page.settle_delay_ms",
                "page content may not have settled when the id is read",
            );
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_storage_key_prepends_prefix() {
        let config = Config::default();
        assert_eq!(
            config.full_storage_key("authToken"),
            format!("{}authToken", config.storage.prefix)
        );
        assert_eq!(config.full_storage_key(""), config.storage.prefix);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_empty_prefix_and_marker() {
        let mut config = Config::default();
        config.storage.prefix.clear();
        config.page.id_path_marker = "a/b".into();
        let fields: Vec<_> = config.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"storage.prefix".to_string()));
        assert!(fields.contains(&"page.id_path_marker".to_string()));
    }

    #[test]
    fn zero_settle_delay_is_only_a_warning() {
        let mut config = Config::default();
        config.page.settle_delay_ms = 0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert!(issues[0].to_string().starts_with("[WARN] page.settle_delay_ms"));
    }
}
