//! Builder pattern for constructing a [`PageSyncAgent`].

use std::sync::Arc;
use std::time::Duration;

use ap_domain::config::{Config, PageConfig};

use crate::agent::{AgentCore, PageSyncAgent};
use crate::bus::MessageBus;
use crate::extract::DocumentMatcher;
use crate::host::{NavigationSource, PageHost};
use crate::storage::ExtensionStorage;
use crate::types::AgentError;

/// Fluent builder for [`PageSyncAgent`].
///
/// Settings default to the process-wide registry
/// ([`ap_domain::registry`]).
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use ap_page_agent::{LocalMessageBus, MemoryStorage, PageSyncAgent, StaticPage};
/// let page = Arc::new(StaticPage::new(
///     "https://docs.google.com/spreadsheets/d/1A2B3C/edit",
///     "Acme FY25 - Google Sheets",
/// ));
/// let agent = PageSyncAgent::builder()
///     .host(page.clone())
///     .navigation(page)
///     .storage(Arc::new(MemoryStorage::new()))
///     .bus(Arc::new(LocalMessageBus::new()))
///     .build()
///     .unwrap();
/// ```
pub struct PageSyncAgentBuilder {
    page: PageConfig,
    storage_key: String,
    settle_delay: Option<Duration>,
    host: Option<Arc<dyn PageHost>>,
    storage: Option<Arc<dyn ExtensionStorage>>,
    bus: Option<Arc<dyn MessageBus>>,
    navigation: Option<Arc<dyn NavigationSource>>,
}

impl PageSyncAgentBuilder {
    pub fn new() -> Self {
        let registry = ap_domain::registry();
        Self {
            page: registry.page.clone(),
            storage_key: registry.storage.keys.current_spreadsheet_id.clone(),
            settle_delay: None,
            host: None,
            storage: None,
            bus: None,
            navigation: None,
        }
    }

    /// Take page settings and the storage key from `config` instead of the
    /// process-wide registry.
    pub fn config(mut self, config: &Config) -> Self {
        self.page = config.page.clone();
        self.storage_key = config.storage.keys.current_spreadsheet_id.clone();
        self
    }

    /// Override `page.settle_delay_ms`.
    pub fn settle_delay(mut self, d: Duration) -> Self {
        self.settle_delay = Some(d);
        self
    }

    // ── Capabilities ─────────────────────────────────────────────────

    /// The page to read URL and title from.  Required.
    pub fn host(mut self, host: Arc<dyn PageHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Extension-local storage.  Required.
    pub fn storage(mut self, storage: Arc<dyn ExtensionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Messaging transport.  Without one the agent answers no messages.
    pub fn bus(mut self, bus: Arc<dyn MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Mutation feed.  Without one the agent identifies only at injection.
    pub fn navigation(mut self, source: Arc<dyn NavigationSource>) -> Self {
        self.navigation = Some(source);
        self
    }

    /// Build the [`PageSyncAgent`].
    pub fn build(self) -> Result<PageSyncAgent, AgentError> {
        let host = self
            .host
            .ok_or_else(|| AgentError::Config("page host is required".into()))?;
        let storage = self
            .storage
            .ok_or_else(|| AgentError::Config("storage is required".into()))?;
        if self.storage_key.is_empty() {
            return Err(AgentError::Config("storage key must not be empty".into()));
        }

        let matcher = DocumentMatcher::new(&self.page)?;
        let settle_delay = self.settle_delay.unwrap_or_else(|| self.page.settle_delay());

        Ok(PageSyncAgent {
            core: Arc::new(AgentCore {
                matcher,
                storage_key: self.storage_key,
                host,
                storage,
            }),
            bus: self.bus,
            navigation: self.navigation,
            settle_delay,
        })
    }
}

impl Default for PageSyncAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticPage;
    use crate::storage::MemoryStorage;

    fn page() -> Arc<StaticPage> {
        Arc::new(StaticPage::new("https://docs.google.com/spreadsheets/d/X/edit", "X"))
    }

    #[test]
    fn host_is_required() {
        let err = PageSyncAgentBuilder::new()
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("page host"));
    }

    #[test]
    fn storage_is_required() {
        let err = PageSyncAgentBuilder::new().host(page()).build().err().unwrap();
        assert!(err.to_string().contains("storage"));
    }

    #[test]
    fn settle_delay_defaults_to_config() {
        let mut config = Config::default();
        config.page.settle_delay_ms = 250;
        let agent = PageSyncAgentBuilder::new()
            .config(&config)
            .host(page())
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .unwrap();
        assert_eq!(agent.settle_delay, Duration::from_millis(250));
    }

    #[test]
    fn explicit_settle_delay_wins() {
        let agent = PageSyncAgentBuilder::new()
            .host(page())
            .storage(Arc::new(MemoryStorage::new()))
            .settle_delay(Duration::from_millis(5))
            .build()
            .unwrap();
        assert_eq!(agent.settle_delay, Duration::from_millis(5));
    }

    #[test]
    fn empty_storage_key_rejected() {
        let mut config = Config::default();
        config.storage.keys.current_spreadsheet_id.clear();
        assert!(PageSyncAgentBuilder::new()
            .config(&config)
            .host(page())
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .is_err());
    }
}
