//! Per-page lifecycle owned by the host, and the disposer returned by
//! [`PageSyncAgent::inject`](crate::PageSyncAgent::inject).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One page context.  The first injection claims it; it is never reset.
///
/// Cloning shares the same lifecycle.
#[derive(Clone, Default, Debug)]
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

#[derive(Default, Debug)]
struct LifecycleInner {
    claimed: AtomicBool,
    shutdown: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An agent has been injected and the page has not unloaded.
    pub fn is_active(&self) -> bool {
        self.inner.claimed.load(Ordering::SeqCst) && !self.inner.shutdown.is_cancelled()
    }

    /// Page unload.  Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Claim the context for an injection.  `false` if already claimed or
    /// already unloaded.
    pub(crate) fn claim(&self) -> bool {
        if self.inner.shutdown.is_cancelled() {
            return false;
        }
        self.inner
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }
}

/// Disposer for an injected agent.  Disposing (or dropping) it shuts the
/// lifecycle down, which releases the navigation subscription and the
/// message listener together.
#[must_use = "dropping the handle tears the agent down"]
pub struct AgentHandle {
    lifecycle: Lifecycle,
    task: Option<JoinHandle<()>>,
}

impl AgentHandle {
    pub(crate) fn new(lifecycle: Lifecycle, task: JoinHandle<()>) -> Self {
        Self {
            lifecycle,
            task: Some(task),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Tear down and wait until the watcher has released everything.
    pub async fn dispose(mut self) {
        self.lifecycle.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "page agent task ended abnormally");
            }
        }
    }

    /// Wait for the agent to terminate without requesting it.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "page agent task ended abnormally");
            }
        }
    }
}

impl Drop for AgentHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.lifecycle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_once() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_active());
        assert!(lifecycle.claim());
        assert!(!lifecycle.claim());
        assert!(lifecycle.clone().is_active());
    }

    #[test]
    fn shutdown_is_terminal() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.claim());
        lifecycle.shutdown();
        lifecycle.shutdown();
        assert!(!lifecycle.is_active());
        assert!(lifecycle.is_shut_down());
    }

    #[test]
    fn unloaded_context_cannot_be_claimed() {
        let lifecycle = Lifecycle::new();
        lifecycle.shutdown();
        assert!(!lifecycle.claim());
    }

    #[tokio::test]
    async fn join_survives_a_panicked_task() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.claim());
        let task = tokio::spawn(async { panic!("watcher blew up") });
        let handle = AgentHandle::new(lifecycle.clone(), task);
        handle.join().await;
        assert!(lifecycle.is_active());
    }
}
