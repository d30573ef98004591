//! The page sync agent: identification, message handling and the
//! navigation watcher.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use ap_domain::trace::TraceEvent;
use ap_protocol::{Request, Response, SpreadsheetInfo};
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::bus::{ListenerRegistration, MessageBus, MessageListener, Responder};
use crate::extract::DocumentMatcher;
use crate::host::{MutationBatch, NavigationSource, PageHost};
use crate::lifecycle::{AgentHandle, Lifecycle};
use crate::storage::ExtensionStorage;
use crate::types::HostError;

/// A fully-configured agent ready to be injected into a page.
///
/// Create via [`PageSyncAgentBuilder`](crate::builder::PageSyncAgentBuilder).
pub struct PageSyncAgent {
    pub(crate) core: Arc<AgentCore>,
    pub(crate) bus: Option<Arc<dyn MessageBus>>,
    pub(crate) navigation: Option<Arc<dyn NavigationSource>>,
    pub(crate) settle_delay: Duration,
}

/// State shared by the listener and the watcher task.
pub(crate) struct AgentCore {
    pub(crate) matcher: DocumentMatcher,
    pub(crate) storage_key: String,
    pub(crate) host: Arc<dyn PageHost>,
    pub(crate) storage: Arc<dyn ExtensionStorage>,
}

impl PageSyncAgent {
    /// Start a new builder.
    pub fn builder() -> crate::builder::PageSyncAgentBuilder {
        crate::builder::PageSyncAgentBuilder::new()
    }

    /// Inject the agent into the page context owned by `lifecycle`.
    ///
    /// Identifies the current document once, registers the message listener
    /// and starts watching for navigation.  Returns `None` without doing
    /// anything if the context already has an agent or has unloaded.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn inject(self, lifecycle: &Lifecycle) -> Option<AgentHandle> {
        if !lifecycle.claim() {
            tracing::debug!("page agent already injected, skipping");
            TraceEvent::AgentSkippedDuplicate.emit();
            return None;
        }

        let url = match self.core.location() {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read page location");
                None
            }
        };

        TraceEvent::AgentInjected {
            url: url.clone().unwrap_or_default(),
        }
        .emit();

        if let Some(url) = &url {
            self.core.identify_guarded(url).await;
        }

        // ── Message listener ─────────────────────────────────────────
        let registration = match &self.bus {
            Some(bus) => {
                let listener = Arc::new(AgentListener {
                    core: self.core.clone(),
                    lifecycle: lifecycle.clone(),
                });
                match ListenerRegistration::register(bus.clone(), listener) {
                    Ok(registration) => {
                        tracing::debug!(listener = ?registration.id(), "message listener registered");
                        Some(registration)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "message transport unavailable, not listening");
                        None
                    }
                }
            }
            None => None,
        };

        // ── Navigation watcher ───────────────────────────────────────
        let mutations = match &self.navigation {
            Some(source) => match source.subscribe() {
                Ok(rx) => Some(rx),
                Err(e) => {
                    tracing::warn!(error = %e, "navigation changes will not be tracked");
                    None
                }
            },
            None => None,
        };

        let task = tokio::spawn(watch(
            self.core,
            mutations,
            registration,
            lifecycle.token(),
            url.unwrap_or_default(),
            self.settle_delay,
        ));

        Some(AgentHandle::new(lifecycle.clone(), task))
    }
}

impl AgentCore {
    /// Identify the document behind `url` and persist its id.
    ///
    /// Returns the id when one was extracted, whether or not the write
    /// succeeded.
    pub(crate) async fn identify(&self, url: &str) -> Option<String> {
        if !self.matcher.is_document_page(url) {
            tracing::debug!(url = %url, "not a spreadsheet page, skipping");
            TraceEvent::IdentificationSkipped { url: url.to_owned() }.emit();
            return None;
        }

        let Some(document_id) = self.matcher.extract_id(url) else {
            tracing::warn!(url = %url, "no document id in spreadsheet URL");
            TraceEvent::ExtractionFailed { url: url.to_owned() }.emit();
            return None;
        };

        TraceEvent::DocumentIdentified {
            document_id: document_id.clone(),
            url: url.to_owned(),
        }
        .emit();

        match self.storage.set(&self.storage_key, &document_id).await {
            Ok(()) => {
                tracing::info!(document_id = %document_id, key = %self.storage_key, "current document stored");
                TraceEvent::DocumentStored {
                    key: self.storage_key.clone(),
                    document_id: document_id.clone(),
                }
                .emit();
            }
            Err(e) => {
                tracing::warn!(key = %self.storage_key, error = %e, "failed to store current document");
                TraceEvent::StorageWriteFailed {
                    key: self.storage_key.clone(),
                    error: e.to_string(),
                }
                .emit();
            }
        }

        Some(document_id)
    }

    /// [`identify`](Self::identify), with a panic in the host or storage
    /// logged instead of unwinding into the caller.
    pub(crate) async fn identify_guarded(&self, url: &str) -> Option<String> {
        match AssertUnwindSafe(self.identify(url)).catch_unwind().await {
            Ok(id) => id,
            Err(_panic) => {
                tracing::error!(url = %url, "identification panicked");
                None
            }
        }
    }

    /// [`PageHost::location`] with a panic turned into [`HostError::Panicked`].
    pub(crate) fn location(&self) -> Result<String, HostError> {
        std::panic::catch_unwind(AssertUnwindSafe(|| self.host.location()))
            .unwrap_or_else(|_| Err(HostError::Panicked("location getter panicked".into())))
    }

    fn title(&self) -> Result<String, HostError> {
        std::panic::catch_unwind(AssertUnwindSafe(|| self.host.title()))
            .unwrap_or_else(|_| Err(HostError::Panicked("title getter panicked".into())))
    }

    /// Describe the document open in the page right now.
    pub(crate) fn current_document(&self) -> Result<SpreadsheetInfo, HostError> {
        let url = self.location()?;
        let title = self.title()?;
        let id = if self.matcher.is_document_page(&url) {
            self.matcher.extract_id(&url)
        } else {
            None
        };
        Ok(SpreadsheetInfo {
            id,
            title: self.matcher.strip_title(&title).to_owned(),
            url,
        })
    }

    /// Answer one request.  `None` means the request gets no response.
    pub(crate) fn respond(&self, request: &Request) -> Option<Response> {
        match request {
            Request::Ping => Some(Response::ready()),
            Request::GetCurrentSpreadsheetInfo => Some(match self.current_document() {
                Ok(info) => Response::SpreadsheetInfo(info),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to describe current document");
                    Response::error(e.to_string())
                }
            }),
            Request::Unrecognized => None,
        }
    }
}

/// Message listener registered on the bus for the lifetime of the agent.
struct AgentListener {
    core: Arc<AgentCore>,
    lifecycle: Lifecycle,
}

impl MessageListener for AgentListener {
    fn on_message(&self, message: serde_json::Value, responder: Responder) -> bool {
        let request = Request::from_value(&message);

        if !self.lifecycle.is_active() {
            tracing::debug!(action = request.action(), "agent terminated, ignoring message");
            return true;
        }

        // catch_unwind: a panicking host still produces an `{error}` reply.
        let response = std::panic::catch_unwind(AssertUnwindSafe(|| self.core.respond(&request)))
            .unwrap_or_else(|_| {
                tracing::error!(action = request.action(), "message handler panicked");
                Some(Response::error("message handler panicked"))
            });
        let responded = response.is_some();
        match response {
            Some(response) => responder.send(response.to_value()),
            None => tracing::debug!(message = %message, "ignoring unrecognized message"),
        }

        TraceEvent::MessageHandled {
            action: request.action().to_owned(),
            responded,
        }
        .emit();

        // Always keep the channel open; some transports require it before
        // any asynchronous reply.
        true
    }
}

/// Watch for navigation until the lifecycle shuts down.
///
/// Owns the listener registration and the mutation subscription, so both
/// are released when this returns.
async fn watch(
    core: Arc<AgentCore>,
    mut mutations: Option<mpsc::UnboundedReceiver<MutationBatch>>,
    registration: Option<ListenerRegistration>,
    shutdown: CancellationToken,
    mut last_url: String,
    settle_delay: Duration,
) {
    let _registration = registration;
    let mut watching = mutations.is_some();
    let mut settle_at: Option<Instant> = None;

    loop {
        let deadline = settle_at.unwrap_or_else(Instant::now);

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            batch = next_batch(&mut mutations), if watching => match batch {
                Some(MutationBatch) => {
                    let current = match core.location() {
                        Ok(url) => url,
                        Err(e) => {
                            tracing::debug!(error = %e, "cannot read location after mutation");
                            continue;
                        }
                    };
                    if current != last_url {
                        tracing::debug!(from = %last_url, to = %current, "navigation detected");
                        TraceEvent::NavigationDetected {
                            from: std::mem::replace(&mut last_url, current.clone()),
                            to: current,
                        }
                        .emit();
                        // Re-arm: only the last of a burst of navigations is identified.
                        settle_at = Some(Instant::now() + settle_delay);
                    }
                }
                None => {
                    tracing::debug!("navigation source closed");
                    watching = false;
                }
            },

            _ = tokio::time::sleep_until(deadline), if settle_at.is_some() => {
                settle_at = None;
                match core.location() {
                    Ok(url) => {
                        core.identify_guarded(&url).await;
                    }
                    Err(e) => tracing::warn!(error = %e, "cannot read page location"),
                }
            }
        }
    }

    drop(mutations);
    tracing::info!("page agent terminated");
    TraceEvent::AgentTerminated.emit();
}

async fn next_batch(
    mutations: &mut Option<mpsc::UnboundedReceiver<MutationBatch>>,
) -> Option<MutationBatch> {
    match mutations {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticPage;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn listener(url: &str) -> AgentListener {
        let page = Arc::new(StaticPage::new(url, "Plan - Google Sheets"));
        let agent = PageSyncAgent::builder()
            .host(page)
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .unwrap();
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.claim());
        AgentListener {
            core: agent.core,
            lifecycle,
        }
    }

    fn deliver(
        listener: &AgentListener,
        message: serde_json::Value,
    ) -> (bool, Option<serde_json::Value>) {
        let (responder, mut rx) = Responder::channel();
        let keep_open = listener.on_message(message, responder);
        (keep_open, rx.try_recv().ok())
    }

    #[test]
    fn listener_always_keeps_channel_open() {
        let listener = listener("https://docs.google.com/spreadsheets/d/1A2B3C/edit");

        let (keep_open, reply) = deliver(&listener, json!({"action": "ping"}));
        assert!(keep_open);
        assert_eq!(reply, Some(json!({"status": "ready"})));

        let (keep_open, reply) = deliver(&listener, json!({"action": "getCurrentSpreadsheetInfo"}));
        assert!(keep_open);
        assert_eq!(reply.unwrap()["id"], json!("1A2B3C"));

        let (keep_open, reply) = deliver(&listener, json!({"action": "openSidebar"}));
        assert!(keep_open);
        assert_eq!(reply, None);
    }

    #[test]
    fn terminated_listener_keeps_channel_open_without_replying() {
        let listener = listener("https://docs.google.com/spreadsheets/d/1A2B3C/edit");
        listener.lifecycle.shutdown();

        let (keep_open, reply) = deliver(&listener, json!({"action": "ping"}));
        assert!(keep_open);
        assert_eq!(reply, None);
    }
}
