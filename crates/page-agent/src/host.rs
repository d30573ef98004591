//! Page-side capabilities the host environment supplies to the agent.

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::types::HostError;

/// Read-only view of the hosting page.
pub trait PageHost: Send + Sync + 'static {
    /// Current address of the page (`location.href`).
    fn location(&self) -> Result<String, HostError>;
    /// Current document title.
    fn title(&self) -> Result<String, HostError>;
}

/// One batch of page mutations.  Carries no detail: the agent re-reads
/// [`PageHost::location`] to decide whether a navigation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationBatch;

/// Source of "the page changed" signals, e.g. a DOM mutation observer on the
/// whole document subtree.
///
/// Dropping the returned receiver disconnects the subscription.
pub trait NavigationSource: Send + Sync + 'static {
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<MutationBatch>, HostError>;
}

/// In-process page: a mutable URL and title plus a mutation feed.
///
/// Used by the simulator host and by tests.
pub struct StaticPage {
    url: RwLock<String>,
    title: RwLock<String>,
    detached: RwLock<bool>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MutationBatch>>>,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
            title: RwLock::new(title.into()),
            detached: RwLock::new(false),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Client-side route change: update the URL, then report a mutation.
    pub fn navigate(&self, url: impl Into<String>) {
        *self.url.write() = url.into();
        self.mutate();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write() = title.into();
        self.mutate();
    }

    /// Report a mutation batch to every live observer.
    pub fn mutate(&self) {
        self.observers
            .lock()
            .retain(|tx| tx.send(MutationBatch).is_ok());
    }

    /// Make every subsequent read fail, as when the frame is torn down.
    pub fn detach(&self) {
        *self.detached.write() = true;
    }

    /// Number of connected observers.
    pub fn observer_count(&self) -> usize {
        let mut observers = self.observers.lock();
        observers.retain(|tx| !tx.is_closed());
        observers.len()
    }

    fn check_attached(&self) -> Result<(), HostError> {
        if *self.detached.read() {
            return Err(HostError::Detached("page is no longer attached".into()));
        }
        Ok(())
    }
}

impl PageHost for StaticPage {
    fn location(&self) -> Result<String, HostError> {
        self.check_attached()?;
        Ok(self.url.read().clone())
    }

    fn title(&self) -> Result<String, HostError> {
        self.check_attached()?;
        Ok(self.title.read().clone())
    }
}

impl NavigationSource for StaticPage {
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<MutationBatch>, HostError> {
        if *self.detached.read() {
            return Err(HostError::NavigationUnavailable(
                "page is no longer attached".into(),
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        Ok(rx)
    }
}
