//! Extension messaging: listener registration and one-shot replies.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use tokio::sync::oneshot;

use crate::types::TransportError;

/// Reply handle for one inbound message.  Dropping it without calling
/// [`send`](Self::send) means "no response".
#[derive(Debug)]
pub struct Responder(oneshot::Sender<serde_json::Value>);

impl Responder {
    pub fn channel() -> (Self, oneshot::Receiver<serde_json::Value>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Send the reply.  A caller that already gave up is not an error.
    pub fn send(self, payload: serde_json::Value) {
        if self.0.send(payload).is_err() {
            tracing::debug!("requester went away before the response was sent");
        }
    }
}

/// Implement this trait to receive messages from other extension components.
pub trait MessageListener: Send + Sync + 'static {
    /// Handle one message.  Returns `true` when the transport must keep the
    /// reply channel open because [`Responder::send`] may be called later.
    fn on_message(&self, message: serde_json::Value, responder: Responder) -> bool;
}

/// Opaque listener handle returned by [`MessageBus::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// The runtime's message channel (`runtime.onMessage`).
pub trait MessageBus: Send + Sync + 'static {
    fn add_listener(&self, listener: Arc<dyn MessageListener>) -> Result<ListenerId, TransportError>;
    fn remove_listener(&self, id: ListenerId);
}

/// Removes its listener from the bus when dropped.
pub struct ListenerRegistration {
    bus: Arc<dyn MessageBus>,
    id: ListenerId,
}

impl ListenerRegistration {
    /// Register `listener` on `bus`.
    pub fn register(
        bus: Arc<dyn MessageBus>,
        listener: Arc<dyn MessageListener>,
    ) -> Result<Self, TransportError> {
        let id = bus.add_listener(listener)?;
        Ok(Self { bus, id })
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.bus.remove_listener(self.id);
        tracing::debug!(listener = self.id.0, "message listener removed");
    }
}

/// In-process message bus.
///
/// [`request`](Self::request) delivers a message to every listener and
/// returns the first reply.  Listeners may stay silent, so callers always
/// pass a timeout.
#[derive(Default)]
pub struct LocalMessageBus {
    listeners: RwLock<BTreeMap<ListenerId, Arc<dyn MessageListener>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl LocalMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse new listeners and requests, as when the extension context is gone.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver `message` and wait up to `timeout` for a reply.
    pub async fn request(
        &self,
        message: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Unavailable);
        }

        // Snapshot so a listener may deregister while handling a message.
        let listeners: Vec<_> = self.listeners.read().values().cloned().collect();
        let mut pending = FuturesUnordered::new();
        for listener in listeners {
            let (responder, rx) = Responder::channel();
            listener.on_message(message.clone(), responder);
            pending.push(rx);
        }

        // Whichever listener answers first wins; dropped responders are skipped.
        let first_reply = async {
            while let Some(reply) = pending.next().await {
                if let Ok(reply) = reply {
                    return Some(reply);
                }
            }
            None
        };

        match tokio::time::timeout(timeout, first_reply).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(TransportError::NoResponse),
            Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
        }
    }
}

impl MessageBus for LocalMessageBus {
    fn add_listener(&self, listener: Arc<dyn MessageListener>) -> Result<ListenerId, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Unavailable);
        }
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().insert(id, listener);
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.write().remove(&id);
    }
}
