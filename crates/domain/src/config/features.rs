use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Feature flags
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Named boolean toggles.  Names are matched exactly (`DARK_MODE`).
///
/// A TOML `[features]` table is merged over the defaults, so overriding a
/// single flag keeps the others.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FeatureFlags(BTreeMap<String, bool>);

impl Default for FeatureFlags {
    fn default() -> Self {
        Self(
            [
                ("DARK_MODE", true),
                ("AUTO_SAVE", true),
                ("OFFLINE_MODE", false),
                ("ANALYTICS", false),
            ]
            .into_iter()
            .map(|(name, on)| (name.to_owned(), on))
            .collect(),
        )
    }
}

impl FeatureFlags {
    /// Unknown names are off.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub(crate) fn merge(&mut self, overrides: BTreeMap<String, bool>) {
        self.0.extend(overrides);
    }
}

/// Deserialize a partial `[features]` table on top of [`FeatureFlags::default`].
pub(crate) fn merge_with_defaults<'de, D>(deserializer: D) -> Result<FeatureFlags, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = BTreeMap::<String, bool>::deserialize(deserializer)?;
    let mut flags = FeatureFlags::default();
    flags.merge(overrides);
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let flags = FeatureFlags::default();
        assert!(flags.is_enabled("DARK_MODE"));
        assert!(flags.is_enabled("AUTO_SAVE"));
        assert!(!flags.is_enabled("OFFLINE_MODE"));
        assert!(!flags.is_enabled("ANALYTICS"));
    }

    #[test]
    fn unknown_flag_is_off() {
        assert!(!FeatureFlags::default().is_enabled("NONEXISTENT_FLAG"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(!FeatureFlags::default().is_enabled("dark_mode"));
    }
}
